use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AgencyError, Result};

/// Top-level configuration for the agency assistant.
///
/// Loaded from `~/.agency/config.toml` by default. Every section falls back to
/// its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgencyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl AgencyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AgencyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AgencyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the embedded database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.agency/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Which record store the assistant talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Embedded SQLite database under `data_dir`.
    #[default]
    Sqlite,
    /// Hosted PostgREST endpoint.
    Rest,
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Database file name, relative to `general.data_dir` unless absolute.
    pub sqlite_path: String,
    /// Base URL of the hosted project, e.g. `https://xyz.supabase.co`.
    pub rest_url: String,
    /// Anonymous API key sent as `apikey` and bearer token.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Sqlite,
            sqlite_path: "agency.db".to_string(),
            rest_url: String::new(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Chat assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Delay before the welcome turn is shown, in milliseconds.
    pub welcome_delay_ms: u64,
    /// Artificial "thinking" delay before each bot reply, in milliseconds.
    pub reply_delay_ms: u64,
    /// Maximum records listed in a single reply.
    pub max_results: usize,
    /// Currency label appended to prices and budgets.
    pub currency: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_delay_ms: 1000,
            reply_delay_ms: 1500,
            max_results: 5,
            currency: "EGP".to_string(),
        }
    }
}

impl ChatConfig {
    pub fn welcome_delay(&self) -> Duration {
        Duration::from_millis(self.welcome_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}
