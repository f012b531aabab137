//! Paginated NPPES search client
//!
//! Walks the search endpoint one page at a time per jurisdiction, pacing
//! requests through an injected [`FixedIntervalGate`]. The endpoint does not
//! signal end-of-pages, and at high offsets it has been observed to serve its
//! result window again instead of an empty list, so termination is heuristic:
//! stop on an empty page, or on a page made up entirely of already-seen NPIs.
//!
//! A request-level failure (transport error or non-2xx) is logged and treated
//! as an empty page, never retried. That keeps one bad page from aborting the
//! run but can under-fetch a jurisdiction when the failure is transient; the
//! risk is carried deliberately.

use tracing::{debug, warn};

use super::dedup::SeenNpis;
use super::models::{ProviderRecord, SearchResponse};
use super::NppesError;
use crate::config::NppesApiConfig;
use crate::rate_limit::FixedIntervalGate;

/// Fixed entity-type filter: individual providers only
const ENUMERATION_TYPE: &str = "NPI-1";

/// Rate-limited paginated fetcher for the NPPES search endpoint
pub struct NppesClient {
    http: reqwest::Client,
    config: NppesApiConfig,
    gate: FixedIntervalGate,
}

impl NppesClient {
    /// Create a client from API configuration
    pub fn new(config: NppesApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .user_agent(concat!("pdi-ingest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let gate = FixedIntervalGate::new(config.page_interval());
        Ok(Self { http, config, gate })
    }

    /// Fetch one page of results
    async fn fetch_page(
        &self,
        specialty: &str,
        state: &str,
        skip: u32,
    ) -> Result<Vec<ProviderRecord>, NppesError> {
        let limit = self.config.page_size.to_string();
        let skip_param = skip.to_string();
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("taxonomy_description", specialty),
                ("enumeration_type", ENUMERATION_TYPE),
                ("state", state),
                ("limit", limit.as_str()),
                ("skip", skip_param.as_str()),
                ("pretty", "true"),
                ("version", self.config.api_version.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NppesError::Status(status));
        }

        let page: SearchResponse = response.json().await?;
        Ok(page.results)
    }

    /// Fetch the full result set for one jurisdiction
    ///
    /// `seen` must be reset by the caller when moving to a new jurisdiction;
    /// it doubles as the termination guard and the repeat filter, so the
    /// returned records are already deduplicated. Fetch failures surface as
    /// a warning and an early end of pagination, not an error.
    pub async fn fetch_state(
        &self,
        specialty: &str,
        state: &str,
        seen: &mut SeenNpis,
    ) -> Vec<ProviderRecord> {
        let mut collected = Vec::new();
        let mut skip = 0u32;

        loop {
            self.gate.acquire().await;
            debug!(state, skip, limit = self.config.page_size, "Requesting page");

            let page = match self.fetch_page(specialty, state, skip).await {
                Ok(records) => records,
                Err(err) => {
                    warn!(
                        state,
                        skip,
                        error = %err,
                        "Page fetch failed, treating as empty page"
                    );
                    Vec::new()
                }
            };

            if page.is_empty() {
                break;
            }

            let fresh: Vec<ProviderRecord> = page
                .into_iter()
                .filter(|record| !seen.contains(&record.number))
                .collect();

            if fresh.is_empty() {
                // Every NPI on the page was a repeat: upstream is looping
                // its window rather than ending, so call the state done.
                debug!(state, skip, "Page contained only repeats, ending pagination");
                break;
            }

            for record in fresh {
                seen.insert(&record.number);
                collected.push(record);
            }

            skip += self.config.page_size;
        }

        debug!(state, records = collected.len(), "Jurisdiction exhausted");
        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> NppesApiConfig {
        NppesApiConfig {
            base_url,
            api_version: "2.1".to_string(),
            page_size: 2,
            page_interval_ms: 0,
            state_pause_ms: 0,
            http_timeout_secs: 5,
        }
    }

    fn record(npi: &str) -> serde_json::Value {
        json!({
            "number": npi,
            "enumeration_type": "NPI-1",
            "basic": {"first_name": "A", "last_name": "B", "status": "A"}
        })
    }

    fn page(npis: &[&str]) -> serde_json::Value {
        json!({
            "result_count": npis.len(),
            "results": npis.iter().map(|n| record(n)).collect::<Vec<_>>()
        })
    }

    #[tokio::test]
    async fn stops_when_a_page_repeats_all_known_npis() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("state", "IL"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1", "2"])))
            .expect(1)
            .mount(&server)
            .await;
        // Upstream loops: the second page repeats the first verbatim.
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("state", "IL"))
            .and(query_param("skip", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1", "2"])))
            .expect(1)
            .mount(&server)
            .await;
        // A third page must never be requested.
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("skip", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["3"])))
            .expect(0)
            .mount(&server)
            .await;

        let client = NppesClient::new(test_config(server.uri())).unwrap();
        let mut seen = SeenNpis::new();
        let records = client.fetch_state("dentist", "IL", &mut seen).await;

        let npis: Vec<&str> = records.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(npis, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn empty_first_page_ends_immediately() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let client = NppesClient::new(test_config(server.uri())).unwrap();
        let mut seen = SeenNpis::new();
        let records = client.fetch_state("dentist", "WY", &mut seen).await;

        assert!(records.is_empty());
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn partial_last_page_collects_everything() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["1", "2"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("skip", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["3"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("skip", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
            .mount(&server)
            .await;

        let client = NppesClient::new(test_config(server.uri())).unwrap();
        let mut seen = SeenNpis::new();
        let records = client.fetch_state("dentist", "OH", &mut seen).await;

        assert_eq!(records.len(), 3);
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn server_error_is_treated_as_empty_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = NppesClient::new(test_config(server.uri())).unwrap();
        let mut seen = SeenNpis::new();
        let records = client.fetch_state("dentist", "TX", &mut seen).await;

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn dedup_scope_is_per_state_not_global() {
        let server = MockServer::start().await;

        // The same NPI is licensed in two states.
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("state", "CA"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["42"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("state", "CA"))
            .and(query_param("skip", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("state", "NY"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&["42"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("state", "NY"))
            .and(query_param("skip", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
            .mount(&server)
            .await;

        let client = NppesClient::new(test_config(server.uri())).unwrap();
        let mut seen = SeenNpis::new();

        let ca = client.fetch_state("dentist", "CA", &mut seen).await;
        seen.reset();
        let ny = client.fetch_state("dentist", "NY", &mut seen).await;

        assert_eq!(ca.len(), 1);
        assert_eq!(ny.len(), 1, "NPI seen in CA must be processed again in NY");
    }
}
