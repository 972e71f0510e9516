//! CLI argument definitions for the agency assistant.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use agency_core::config::{AgencyConfig, BackendKind};

/// Agency dashboard assistant: answers questions about orders, clients,
/// campaigns and services.
#[derive(Parser, Debug)]
#[command(name = "agency", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// SQLite database file. Selects the SQLite backend.
    #[arg(short = 'd', long = "db", conflicts_with = "rest_url")]
    pub db: Option<PathBuf>,

    /// Base URL of a hosted PostgREST project. Selects the REST backend.
    #[arg(short = 'r', long = "rest-url")]
    pub rest_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Insert demo records when the store has no users.
    #[arg(long = "seed")]
    pub seed: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat session (default).
    Chat,
    /// Print the dashboard counters and exit.
    Stats {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > AGENCY_CONFIG env var > ~/.agency/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("AGENCY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// The subcommand to run; `chat` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    /// Apply command-line and environment overrides on top of the file config.
    pub fn apply(&self, config: &mut AgencyConfig) {
        if let Some(ref db) = self.db {
            config.backend.kind = BackendKind::Sqlite;
            config.backend.sqlite_path = db.to_string_lossy().to_string();
        }
        if let Some(ref url) = self.rest_url {
            config.backend.kind = BackendKind::Rest;
            config.backend.rest_url = url.clone();
        }
        if let Ok(key) = std::env::var("AGENCY_API_KEY") {
            if !key.is_empty() {
                config.backend.api_key = key;
            }
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".agency").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".agency").join("config.toml");
    }
    PathBuf::from("config.toml")
}
