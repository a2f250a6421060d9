//! gen-podcast - Turn long documents into chunked podcast narration scripts

mod config;
mod input;
mod llm;
mod output;
mod script;
mod split;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::PodcastConfig;
use llm::LlmClient;
use llm_client::config::{PHASES, model_env_var};
use split::{ChunkPlanner, LogDiagnostics, ProposalFormat};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "gen-podcast")]
#[command(about = "Turn long documents into chunked podcast narration scripts", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    /// Load environment variables (GENAI_API_KEY, MODEL_SPLIT, ...) from this file
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// LLM preset to use instead of the phase default
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize a text file into <output-dir>/input_text.txt
    Input {
        /// Path to the UTF-8 text file
        #[arg(long)]
        text: PathBuf,

        /// Output directory (default: from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Split normalized text into narration-sized chunks
    Split {
        /// Normalized text file (default: <output-dir>/input_text.txt)
        #[arg(long)]
        infile: Option<PathBuf>,

        /// Target minutes of narration per chunk (default: from config)
        #[arg(long)]
        target_minutes: Option<f64>,

        /// Chunk directory (default: <output-dir>/chunks)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Rewrite chunk files as podcast scripts
    Script {
        /// Chunk directory (default: <output-dir>/chunks)
        #[arg(long)]
        indir: Option<PathBuf>,

        /// Tone of the script (default: from config)
        #[arg(long)]
        style: Option<String>,

        /// Script directory (default: <output-dir>/scripts)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run input, split and script in sequence
    All {
        /// Path to the UTF-8 text file
        #[arg(long)]
        text: PathBuf,

        /// Target minutes of narration per chunk (default: from config)
        #[arg(long)]
        target_minutes: Option<f64>,

        /// Tone of the script (default: from config)
        #[arg(long)]
        style: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default script style
    SetStyle {
        /// Tone description, e.g. "calm and thoughtful"
        style: String,
    },
    /// Set default target minutes per chunk
    SetTargetMinutes {
        /// Minutes (0.5-60)
        value: f64,
    },
    /// Set the reply format requested when splitting
    SetFormat {
        #[arg(value_parser = ["markers", "chunks"])]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.debug);
    load_env(args.env_file.as_deref())?;

    let preset = args.preset.as_deref();

    match &args.command {
        Commands::Config { action } => handle_config_command(action),
        Commands::Input { text, output_dir } => {
            let config = PodcastConfig::load().context("Failed to load configuration")?;
            let output_dir = output_dir.clone().unwrap_or_else(|| config.output_dir.clone());
            let path = input::process_text(text, &output_dir)?;
            eprintln!("Input text saved to: {}", path.display());
            Ok(())
        }
        Commands::Split {
            infile,
            target_minutes,
            output_dir,
        } => {
            let config = PodcastConfig::load().context("Failed to load configuration")?;
            let infile = infile
                .clone()
                .unwrap_or_else(|| config.output_dir.join(input::INPUT_TEXT_FILE));
            let chunk_dir = output_dir
                .clone()
                .unwrap_or_else(|| config.output_dir.join("chunks"));
            let target = target_minutes.unwrap_or(config.target_minutes);

            let paths = run_split(&config, &infile, target, &chunk_dir, preset).await?;
            eprintln!("Wrote {} chunks to {}", paths.len(), chunk_dir.display());
            Ok(())
        }
        Commands::Script {
            indir,
            style,
            output_dir,
        } => {
            let config = PodcastConfig::load().context("Failed to load configuration")?;
            let chunk_dir = indir
                .clone()
                .unwrap_or_else(|| config.output_dir.join("chunks"));
            let script_dir = output_dir
                .clone()
                .unwrap_or_else(|| config.output_dir.join("scripts"));
            let style = style.as_deref().unwrap_or(&config.script_style);

            let paths = run_script(&config, &chunk_dir, style, &script_dir, preset).await?;
            eprintln!("Wrote {} scripts to {}", paths.len(), script_dir.display());
            Ok(())
        }
        Commands::All {
            text,
            target_minutes,
            style,
        } => {
            let config = PodcastConfig::load().context("Failed to load configuration")?;
            let chunk_dir = config.output_dir.join("chunks");
            let script_dir = config.output_dir.join("scripts");
            let target = target_minutes.unwrap_or(config.target_minutes);
            let style = style.as_deref().unwrap_or(&config.script_style);

            eprintln!("[1/3] Input");
            let infile = input::process_text(text, &config.output_dir)?;

            eprintln!("[2/3] Split");
            let chunks = run_split(&config, &infile, target, &chunk_dir, preset).await?;
            eprintln!("Wrote {} chunks to {}", chunks.len(), chunk_dir.display());

            eprintln!("[3/3] Script");
            let scripts = run_script(&config, &chunk_dir, style, &script_dir, preset).await?;
            eprintln!("Wrote {} scripts to {}", scripts.len(), script_dir.display());
            Ok(())
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Load a dotenv file: the explicit one must exist, the implicit `.env` may not.
fn load_env(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
            log::debug!("Loaded environment from {}", path.display());
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                log::debug!("Loaded environment from {}", path.display());
            }
        }
    }
    Ok(())
}

/// Read, plan and persist chunks. An empty plan fails the command.
async fn run_split(
    config: &PodcastConfig,
    infile: &Path,
    target_minutes: f64,
    chunk_dir: &Path,
    preset: Option<&str>,
) -> Result<Vec<PathBuf>> {
    if !(target_minutes.is_finite() && target_minutes > 0.0) {
        anyhow::bail!("Target minutes must be positive, got {}", target_minutes);
    }

    let doc = input::read_document(infile)?;
    let settings = config.split_settings();

    // Short texts are never sent to the model, so they need no credentials
    let needs_model = doc.char_count() >= settings.bypass_chars();
    let client = LlmClient::require_or_unavailable(
        LlmClient::for_phase("split", preset, config.retry_policy()),
        needs_model,
    )?;

    let planner = ChunkPlanner::new(settings, &LogDiagnostics);
    let chunks = planner
        .plan(&doc, target_minutes, client.provider())
        .await
        .context("Splitting failed")?;

    output::write_chunks(chunk_dir, &chunks, planner.settings().chars_per_minute)
}

async fn run_script(
    config: &PodcastConfig,
    chunk_dir: &Path,
    style: &str,
    script_dir: &Path,
    preset: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let chunk_files = output::list_chunk_files(chunk_dir)?;
    if chunk_files.is_empty() {
        anyhow::bail!(
            "No chunk files found in {}. Run 'gen-podcast split' first.",
            chunk_dir.display()
        );
    }

    let client = LlmClient::for_phase("script", preset, config.retry_policy())?;
    log::info!("Writing scripts with model {}", client.model());
    script::process_chunks(client.provider(), &chunk_files, style, script_dir).await
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PodcastConfig::load()?;
            println!("Configuration file: {:?}", PodcastConfig::config_path()?);
            println!();
            println!("chars_per_minute = {}", config.chars_per_minute);
            println!("short_text_minutes = {}", config.short_text_minutes);
            println!("chunk_min_chars = {}", config.chunk_min_chars);
            println!("chunk_max_chars = {}", config.chunk_max_chars);
            println!("target_minutes = {}", config.target_minutes);
            println!("proposal_format = \"{}\"", format_name(config.proposal_format));
            println!("script_style = \"{}\"", config.script_style);
            println!("retry_attempts = {}", config.retry_attempts);
            println!("retry_delay_secs = {}", config.retry_delay_secs);
            println!("output_dir = \"{}\"", config.output_dir.display());

            let llm_config = llm_client::Config::load()?;
            println!();
            println!("LLM configuration: {:?}", llm_client::Config::config_path()?);
            for phase in PHASES {
                let env_var = model_env_var(phase);
                match llm_config.resolve_for_phase(phase, None) {
                    Ok(preset) => println!(
                        "{} = {} / {} (override with {})",
                        phase, preset.provider, preset.model, env_var
                    ),
                    Err(e) => println!("{} = (unresolved: {})", phase, e),
                }
            }
        }
        ConfigAction::SetStyle { style } => {
            let mut config = PodcastConfig::load()?;
            config.script_style = style.trim().to_string();
            config.save()?;
            println!("Default script style set to: {}", config.script_style);
        }
        ConfigAction::SetTargetMinutes { value } => {
            let mut config = PodcastConfig::load()?;
            config.target_minutes = value.clamp(0.5, 60.0);
            config.save()?;
            println!("Default target minutes set to: {}", config.target_minutes);
        }
        ConfigAction::SetFormat { format } => {
            let mut config = PodcastConfig::load()?;
            config.proposal_format = match format.as_str() {
                "chunks" => ProposalFormat::Chunks,
                _ => ProposalFormat::Markers,
            };
            config.save()?;
            println!(
                "Split reply format set to: {}",
                format_name(config.proposal_format)
            );
        }
    }
    Ok(())
}

fn format_name(format: ProposalFormat) -> &'static str {
    match format {
        ProposalFormat::Markers => "markers",
        ProposalFormat::Chunks => "chunks",
    }
}
