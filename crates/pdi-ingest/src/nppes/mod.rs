//! NPPES registry ingestion module
//!
//! Everything specific to the upstream NPPES directory API lives here:
//!
//! - **models**: serde models of the v2.1 search response
//! - **client**: rate-limited paginated fetcher with loop-guard termination
//! - **dedup**: per-jurisdiction seen-NPI tracking
//! - **normalize**: credential/name cleanup and derived-field computation
//! - **storage**: ordered four-table transactional upsert for one provider
//! - **pipeline**: the jurisdiction loop and the run-wide transaction
//!
//! # Example
//! ```no_run
//! use pdi_ingest::config::IngestConfig;
//! use pdi_ingest::nppes::IngestPipeline;
//!
//! # async fn example(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let config = IngestConfig::from_env()?;
//! let pipeline = IngestPipeline::new(config, pool)?;
//! let stats = pipeline.run("dentist").await?;
//! tracing::info!("{}", stats.summary());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dedup;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod storage;

// Re-export commonly used types
pub use client::NppesClient;
pub use dedup::SeenNpis;
pub use models::{ProviderRecord, SearchResponse};
pub use normalize::{normalize_record, NormalizedProvider};
pub use pipeline::{IngestPipeline, RunStats};
pub use storage::ProviderStore;

/// Errors from the NPPES fetch layer
///
/// These never abort a run: the fetcher downgrades every variant to an empty
/// page after logging it (observed upstream-failure policy, carried as-is).
#[derive(Debug, thiserror::Error)]
pub enum NppesError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(reqwest::StatusCode),
}
