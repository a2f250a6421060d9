use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{LlmError, Result};

/// Pipeline phases that talk to a model and may carry their own preset
pub const PHASES: &[&str] = &["split", "script"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Preset used when a phase has no default of its own
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Per-phase default presets (phase name -> preset name)
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Named model presets; user entries are layered over the built-in ones
    #[serde(default = "builtin_presets", deserialize_with = "merge_presets")]
    pub presets: HashMap<String, ModelPreset>,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_preset() -> String {
    "gemini-flash".to_string()
}

fn builtin_presets() -> HashMap<String, ModelPreset> {
    let mut presets = HashMap::new();
    presets.insert(
        "gemini-flash".to_string(),
        ModelPreset {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
        },
    );
    presets
}

fn merge_presets<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, ModelPreset>, D::Error>
where
    D: Deserializer<'de>,
{
    let user = HashMap::<String, ModelPreset>::deserialize(deserializer)?;
    let mut presets = builtin_presets();
    presets.extend(user);
    Ok(presets)
}

/// A named model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Provider identifier (gemini)
    pub provider: String,

    /// Model name/identifier for the provider
    pub model: String,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| LlmError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/llm.toml"))
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&ModelPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| LlmError::InvalidPreset(name.to_string()))
    }

    /// Get the default preset name for a pipeline phase
    ///
    /// Falls back to `default_preset` if no phase-specific default is set.
    pub fn get_default_for_phase(&self, phase: &str) -> &str {
        self.defaults
            .get(phase)
            .map(String::as_str)
            .unwrap_or(&self.default_preset)
    }

    /// Resolve the preset a phase should run with.
    ///
    /// An explicit preset name wins over the phase default. The model can then
    /// be overridden per phase through `MODEL_SPLIT` / `MODEL_SCRIPT`.
    pub fn resolve_for_phase(&self, phase: &str, preset_name: Option<&str>) -> Result<ModelPreset> {
        let name = preset_name.unwrap_or_else(|| self.get_default_for_phase(phase));
        let mut preset = self.get_preset(name)?.clone();

        if let Ok(model) = std::env::var(model_env_var(phase)) {
            if !model.trim().is_empty() {
                preset.model = model.trim().to_string();
            }
        }

        Ok(preset)
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }
}

/// Environment variable that overrides the model for a phase
pub fn model_env_var(phase: &str) -> String {
    format!("MODEL_{}", phase.to_uppercase())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            defaults: HashMap::new(),
            presets: builtin_presets(),
            providers: HashMap::new(),
        }
    }
}
