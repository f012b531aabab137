//! NPPES ingestion pipeline
//!
//! Drives the full run: for every US jurisdiction, fetch the deduplicated
//! result set, normalize it, and store each provider. The entire run executes
//! inside ONE database transaction, opened before the first state and
//! committed after the last; any persistence failure rolls back everything
//! ingested so far.
//!
//! Holding a transaction for a run that can take tens of minutes is a
//! deliberate trade: all-or-nothing durability for the run, at the cost of
//! long-held locks.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;
use tokio::time::sleep;
use tracing::info;

use pdi_common::states::US_STATES;

use super::client::NppesClient;
use super::dedup::SeenNpis;
use super::normalize::normalize_record;
use super::storage::ProviderStore;
use crate::config::IngestConfig;

/// The full-run ingestion pipeline
pub struct IngestPipeline {
    config: IngestConfig,
    db: PgPool,
    client: NppesClient,
}

impl IngestPipeline {
    /// Create a pipeline from configuration and a connection pool
    pub fn new(config: IngestConfig, db: PgPool) -> Result<Self> {
        let client = NppesClient::new(config.nppes.clone())?;
        Ok(Self { config, db, client })
    }

    /// Run a full multi-jurisdiction ingestion for one search specialty
    ///
    /// Steps per jurisdiction:
    /// 1. Reset the seen-NPI scope
    /// 2. Fetch the deduplicated result set (fetch errors become empty pages)
    /// 3. Normalize every record
    /// 4. Store each provider inside the run transaction
    /// 5. Pause before the next jurisdiction
    ///
    /// Returns run statistics; on error the transaction is dropped and every
    /// write of the run is rolled back.
    pub async fn run(&self, specialty: &str) -> Result<RunStats> {
        info!(specialty, states = US_STATES.len(), "Starting NPPES ingestion run");

        let store = ProviderStore::new(specialty);
        let mut stats = RunStats::default();
        let mut seen = SeenNpis::new();

        let mut tx = self
            .db
            .begin()
            .await
            .context("Failed to begin run transaction")?;

        for (index, state) in US_STATES.iter().enumerate() {
            info!(
                "Processing state {} / {}: {}",
                index + 1,
                US_STATES.len(),
                state.name
            );

            seen.reset();
            let records = self
                .client
                .fetch_state(specialty, state.code, &mut seen)
                .await;
            info!(
                state = state.code,
                records = records.len(),
                "Jurisdiction result set fetched"
            );

            let today = Utc::now().date_naive();
            for record in records {
                let normalized = normalize_record(record, today);
                store
                    .store_provider_tx(&mut tx, &normalized, state.code)
                    .await
                    .with_context(|| {
                        format!("Failed to store provider in state {}", state.code)
                    })?;
                stats.providers_stored += 1;
            }
            stats.states_processed += 1;

            if index + 1 < US_STATES.len() {
                sleep(self.config.nppes.state_pause()).await;
            }
        }

        tx.commit().await.context("Failed to commit run transaction")?;

        info!(
            states = stats.states_processed,
            providers = stats.providers_stored,
            "Ingestion run committed"
        );
        Ok(stats)
    }
}

/// Statistics for one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Jurisdictions walked to completion
    pub states_processed: usize,
    /// Providers written (insert or update) across all jurisdictions
    pub providers_stored: usize,
}

impl RunStats {
    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Ingestion complete: {} providers stored across {} states",
            self.providers_stored, self.states_processed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = RunStats::default();
        assert_eq!(stats.states_processed, 0);
        assert_eq!(stats.providers_stored, 0);
    }

    #[test]
    fn summary_reports_both_counts() {
        let stats = RunStats {
            states_processed: 51,
            providers_stored: 1234,
        };
        let summary = stats.summary();
        assert!(summary.contains("1234 providers"));
        assert!(summary.contains("51 states"));
    }
}
