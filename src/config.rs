use std::{path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::Level;

use crate::classifier::HeuristicThresholds;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "lumicheck";
pub const ENV_PREFIX: &str = "LUMICHECK";

/// Which classification backend drives a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierStrategy {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub strategy: ClassifierStrategy,
    pub inter_item_delay_ms: u64,
    pub max_image_width: u32,
    pub api_key: Option<String>,
    pub remote_model: String,
    pub remote_endpoint: String,
    pub remote_command: Option<PathBuf>,
    pub remote_timeout_secs: u64,
    pub ocr_command: Option<PathBuf>,
    pub log_level: String,
    pub thresholds: HeuristicThresholds,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            strategy: ClassifierStrategy::Local,
            inter_item_delay_ms: 500,
            max_image_width: 1000,
            api_key: None,
            remote_model: "gemini-2.5-flash".to_string(),
            remote_endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            remote_command: None,
            remote_timeout_secs: 30,
            ocr_command: None,
            log_level: "info".to_string(),
            thresholds: HeuristicThresholds::default(),
        }
    }
}

impl Configuration {
    /// Defaults, then `lumicheck.toml` if present, then `LUMICHECK_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_file(DEFAULT_CONFIG_FILE, false)
    }

    /// Like [`Configuration::load`], but the named file must exist.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::load_file(path, true)
    }

    fn load_file(path: &str, required: bool) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(required))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let configuration: Configuration = settings.try_deserialize()?;
        Ok(configuration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_image_width == 0 {
            return Err(ConfigError::Invalid(
                "Max image width must be greater than 0".to_string(),
            ));
        }

        if self.strategy == ClassifierStrategy::Remote {
            self.api_key()?;
            if self.remote_timeout_secs == 0 {
                return Err(ConfigError::Invalid(
                    "Remote timeout must be greater than 0".to_string(),
                ));
            }
        }

        self.thresholds.validate()
    }

    /// The remote service credential; blank keys count as missing.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredentials)
    }

    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}
