//! PDI Ingest - NPPES provider directory ingestion tool

use anyhow::{Context, Result};
use clap::Parser;
use pdi_common::logging::{init_logging, LogConfig, LogLevel};
use pdi_ingest::config::IngestConfig;
use pdi_ingest::nppes::IngestPipeline;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "pdi-ingest")]
#[command(author, version, about = "NPPES provider directory ingestion tool")]
struct Cli {
    /// Taxonomy description to search for, e.g. "dentist"
    #[arg(short, long)]
    specialty: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing or empty specialty is fatal here, before any logging,
    // network or database activity.
    let cli = Cli::parse();
    anyhow::ensure!(
        !cli.specialty.trim().is_empty(),
        "--specialty must not be empty"
    );

    // .env is optional; real environments set variables directly
    let _ = dotenvy::dotenv();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    init_logging(&log_config)?;

    info!(specialty = %cli.specialty, "Starting ingestion for specialty");

    let config = IngestConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connection pool established");

    let pipeline = IngestPipeline::new(config, pool.clone())?;
    let result = pipeline.run(&cli.specialty).await;
    pool.close().await;

    match result {
        Ok(stats) => {
            info!("{}", stats.summary());
            Ok(())
        }
        Err(err) => {
            error!(
                error = ?err,
                "Ingestion run failed; all writes of this run were rolled back"
            );
            Err(err)
        }
    }
}
