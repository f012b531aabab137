//! PDI Ingest Library
//!
//! Pulls individual-provider records from the NPPES registry API and keeps a
//! relational store of providers, specialties, insurance plans and practice
//! locations consistent with upstream.
//!
//! The pipeline walks every US jurisdiction, paginating the upstream search
//! endpoint per state, normalizing each record, and upserting it across four
//! tables inside a single run-wide transaction.
//!
//! # Example
//!
//! ```no_run
//! use pdi_ingest::config::IngestConfig;
//! use pdi_ingest::nppes::IngestPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let pool = sqlx::PgPool::connect(&config.database_url).await?;
//!     let pipeline = IngestPipeline::new(config, pool)?;
//!     let stats = pipeline.run("dentist").await?;
//!     println!("{}", stats.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod nppes;
pub mod rate_limit;

pub use config::IngestConfig;
pub use nppes::IngestPipeline;
