//! gen-podcast configuration management.

use crate::split::{DEFAULT_CHARS_PER_MINUTE, ProposalFormat, SplitSettings};
use anyhow::Result;
use llm_client::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SCRIPT_STYLE: &str = "friendly and approachable";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastConfig {
    /// Narration speed used for all size estimates
    #[serde(default = "default_chars_per_minute")]
    pub chars_per_minute: usize,

    /// Texts shorter than this many minutes are kept as one chunk
    #[serde(default = "default_short_text_minutes")]
    pub short_text_minutes: f64,

    /// Lower bound of the chunk size band (also the merge threshold)
    #[serde(default = "default_chunk_min_chars")]
    pub chunk_min_chars: usize,

    /// Upper bound of the chunk size band
    #[serde(default = "default_chunk_max_chars")]
    pub chunk_max_chars: usize,

    /// Target narration minutes per chunk
    #[serde(default = "default_target_minutes")]
    pub target_minutes: f64,

    /// Reply shape requested from the model: "markers" or "chunks"
    #[serde(default)]
    pub proposal_format: ProposalFormat,

    /// Tone the script rewrite should aim for
    #[serde(default = "default_script_style")]
    pub script_style: String,

    /// Total attempts per model request, including the first
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay between attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Root directory for pipeline artifacts
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_chars_per_minute() -> usize {
    DEFAULT_CHARS_PER_MINUTE
}

fn default_short_text_minutes() -> f64 {
    2.0
}

fn default_chunk_min_chars() -> usize {
    600
}

fn default_chunk_max_chars() -> usize {
    1200
}

fn default_target_minutes() -> f64 {
    5.0
}

fn default_script_style() -> String {
    DEFAULT_SCRIPT_STYLE.to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PodcastConfig {
    fn default() -> Self {
        Self {
            chars_per_minute: default_chars_per_minute(),
            short_text_minutes: default_short_text_minutes(),
            chunk_min_chars: default_chunk_min_chars(),
            chunk_max_chars: default_chunk_max_chars(),
            target_minutes: default_target_minutes(),
            proposal_format: ProposalFormat::default(),
            script_style: default_script_style(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            output_dir: default_output_dir(),
        }
    }
}

impl PodcastConfig {
    /// Get the config file path: ~/.config/cli-programs/gen-podcast.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("gen-podcast.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: PodcastConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn split_settings(&self) -> SplitSettings {
        SplitSettings {
            chars_per_minute: self.chars_per_minute.max(1),
            short_text_minutes: self.short_text_minutes,
            chunk_min_chars: self.chunk_min_chars,
            chunk_max_chars: self.chunk_max_chars.max(self.chunk_min_chars),
            proposal_format: self.proposal_format,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_secs(self.retry_delay_secs),
        )
    }
}
