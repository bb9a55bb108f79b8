//! Layered configuration for a Glia call.
//!
//! Precedence: env `GLIA__SECTION__KEY` > TOML file (`GLIA_CONFIG`, default
//! `config/glia.toml`) > built-in defaults.

use crate::error::{CallError, CallResult};
use glia_voice::{AudioConfig, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file, used when `GLIA_CONFIG` is unset and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "config/glia.toml";

fn default_agent_name() -> String {
    "Glia".to_string()
}

fn default_primary_language() -> String {
    "en".to_string()
}

fn default_strict_pain_score() -> bool {
    true
}

fn default_pain_score_min() -> i64 {
    1
}

fn default_pain_score_max() -> i64 {
    10
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Name the agent introduces itself with (default: "Glia")
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// Language the agent speaks; any other detected language triggers a
    /// language-support note (default: "en")
    #[serde(default = "default_primary_language")]
    pub primary_language: String,

    /// Reject pain scores outside `pain_score_min..=pain_score_max` (default: true)
    #[serde(default = "default_strict_pain_score")]
    pub strict_pain_score: bool,

    #[serde(default = "default_pain_score_min")]
    pub pain_score_min: i64,

    #[serde(default = "default_pain_score_max")]
    pub pain_score_max: i64,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            agent_name: default_agent_name(),
            primary_language: default_primary_language(),
            strict_pain_score: default_strict_pain_score(),
            pain_score_min: default_pain_score_min(),
            pain_score_max: default_pain_score_max(),
        }
    }
}

/// Top-level configuration: one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GliaConfig {
    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub dialog: DialogConfig,
}

impl GliaConfig {
    /// Load from `GLIA_CONFIG` (or `config/glia.toml`) and the environment.
    pub fn load() -> CallResult<Self> {
        let config_path =
            std::env::var("GLIA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load with an explicit file path. A missing file is skipped; env still applies.
    pub fn load_from(path: &Path) -> CallResult<Self> {
        let builder = config::Config::builder();
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix("GLIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on its own, without file or environment layers.
    pub fn from_toml_str(toml: &str) -> CallResult<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CallResult<()> {
        self.audio.validate()?;
        if self.dialog.pain_score_min > self.dialog.pain_score_max {
            return Err(CallError::Config(config::ConfigError::Message(format!(
                "pain_score_min ({}) must not exceed pain_score_max ({})",
                self.dialog.pain_score_min, self.dialog.pain_score_max
            ))));
        }
        if self.model.timeout_secs == 0 {
            return Err(CallError::Config(config::ConfigError::Message(
                "model.timeout_secs must be positive".to_string(),
            )));
        }
        Ok(())
    }
}
