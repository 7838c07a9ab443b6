//! spx backend - one-shot asset and project queries
//!
//! Loads configuration, connects to the database, syncs and validates the
//! entity tables, runs a single command and prints the result as JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spx_backend::cli::Command;
use spx_backend::config::{Config, LogFormat};
use spx_backend::db::Database;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "spx_backend=debug,sqlx=warn".into());

    // Logs go to stderr so stdout stays valid JSON
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let command = Command::from_args()?;
    tracing::info!(?command, "Starting spx backend");

    let db = Database::connect_with_retry(
        &config.database_url,
        config.database_max_connections,
        std::time::Duration::from_secs(2),
        config.database_connect_timeout,
    )
    .await
    .context("Database unavailable")?;
    tracing::info!("Database connected");

    let sync = db.sync_schemas().await?;
    tracing::info!(tables_created = ?sync.tables_created, "Entity tables validated");

    let outcome = run(&db, &config, command).await;
    db.close().await;
    outcome
}

async fn run(db: &Database, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Sync => Ok(()),
        Command::Assets {
            page_index,
            page_size,
            asset_type,
        } => {
            let page = db
                .assets(&config.asset_url_prefix)
                .asset_list(&page_index, &page_size, &asset_type)
                .await?;
            print_json(&page)
        }
        Command::Asset { id } => {
            let asset = db.assets(&config.asset_url_prefix).asset(&id).await?;
            print_json(&asset)
        }
        Command::Project { id } => {
            let project = db.projects().file_info(&id).await?;
            print_json(&project)
        }
    }
}
