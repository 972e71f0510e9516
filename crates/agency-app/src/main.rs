//! Agency assistant binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Open the record store (embedded SQLite or hosted PostgREST)
//! 3. Optionally seed demo data
//! 4. Run the interactive chat session, or print dashboard counters

mod cli;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use agency_chat::{
    ChatError, DialogueSession, ResponseComposer, SessionHandle, SessionSettings, TokioDelay,
};
use agency_core::config::{AgencyConfig, BackendKind};
use agency_storage::{
    seed_demo_data, DashboardStats, DataSource, Database, RestSource, SqliteSource,
};

use cli::{CliArgs, Command};
use terminal::TerminalView;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

/// Open the configured backend behind the data access boundary.
fn open_source(config: &AgencyConfig) -> Result<Arc<dyn DataSource>, Box<dyn std::error::Error>> {
    match config.backend.kind {
        BackendKind::Sqlite => {
            // An absolute sqlite_path replaces data_dir on join.
            let db_path = resolve_data_dir(&config.general.data_dir).join(&config.backend.sqlite_path);
            let db = Database::new(&db_path)?;
            tracing::info!(path = %db_path.display(), "SQLite database opened");
            Ok(Arc::new(SqliteSource::new(Arc::new(db))))
        }
        BackendKind::Rest => {
            if config.backend.rest_url.is_empty() {
                tracing::error!("REST backend selected but no URL configured");
                return Err("backend.rest_url is empty; pass --rest-url or set it in the config".into());
            }
            let source = RestSource::new(
                &config.backend.rest_url,
                &config.backend.api_key,
                config.backend.timeout(),
            )?;
            tracing::info!(url = %config.backend.rest_url, "Using REST backend");
            Ok(Arc::new(source))
        }
    }
}

async fn run_stats(source: &dyn DataSource, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stats = DashboardStats::load(source).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("New orders:        {}", stats.new_orders);
        println!("Total clients:     {}", stats.total_clients);
        println!("Active campaigns:  {}", stats.active_campaigns);
        println!("Services:          {}", stats.total_services);
    }
    Ok(())
}

async fn run_chat(
    source: Arc<dyn DataSource>,
    config: &AgencyConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let composer = Arc::new(ResponseComposer::new(source, &config.chat));
    let view = Arc::new(TerminalView::new());
    let session = DialogueSession::new(
        composer,
        view.clone(),
        Arc::new(TokioDelay),
        SessionSettings::from(&config.chat),
    );
    let handle = SessionHandle::spawn(session);
    println!("Type a question, a suggestion number, or \"exit\" to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        match handle.submit(view.resolve_input(line)) {
            Ok(()) => {}
            Err(ChatError::QueueFull) => println!("{}", ChatError::QueueFull),
            Err(err) => return Err(err.into()),
        }
    }

    let session = handle.shutdown().await?;
    tracing::info!(turns = session.transcript().len(), "Chat session closed");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = AgencyConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing. Logs go to stderr so they do not interleave with the chat.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting agency assistant v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if config.backend.kind == BackendKind::Sqlite {
        let data_dir = resolve_data_dir(&config.general.data_dir);
        if let Err(e) = std::fs::create_dir_all(&data_dir) {
            tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
            return Err(e.into());
        }
    }

    let source = open_source(&config)?;

    if args.seed {
        let summary = seed_demo_data(source.as_ref()).await?;
        if !summary.skipped {
            println!(
                "Seeded {} clients, {} services, {} orders, {} campaigns.",
                summary.clients, summary.services, summary.orders, summary.campaigns
            );
        }
    }

    match args.command() {
        Command::Stats { json } => run_stats(source.as_ref(), json).await,
        Command::Chat => run_chat(source, &config).await,
    }
}
