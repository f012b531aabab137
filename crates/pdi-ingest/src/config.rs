//! Ingestion configuration
//!
//! Environment-driven configuration for an ingestion run. The search
//! specialty is the only run parameter taken on the command line; everything
//! else (endpoint, page size, pacing) comes from `INGEST_*` / `NPPES_*`
//! variables with production defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Postgres connection string
    pub database_url: String,
    /// Maximum connections for the run's pool
    pub max_db_connections: u32,
    /// Upstream API configuration
    pub nppes: NppesApiConfig,
}

/// NPPES registry API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NppesApiConfig {
    /// Base URL of the NPPES search endpoint
    pub base_url: String,
    /// Upstream API version parameter
    pub api_version: String,
    /// Records requested per page
    pub page_size: u32,
    /// Pause between any two page requests, in milliseconds
    pub page_interval_ms: u64,
    /// Pause between jurisdictions, in milliseconds
    pub state_pause_ms: u64,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
}

impl Default for NppesApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://npiregistry.cms.hhs.gov/api".to_string(),
            api_version: "2.1".to_string(),
            page_size: 200,
            page_interval_ms: 1_000,
            state_pause_ms: 2_000,
            http_timeout_secs: 30,
        }
    }
}

impl IngestConfig {
    /// Load ingestion configuration from environment variables
    ///
    /// `DATABASE_URL` is required; everything else has defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let config = Self {
            database_url,
            max_db_connections: env_parsed("INGEST_MAX_DB_CONNECTIONS", 5),
            nppes: NppesApiConfig::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("DATABASE_URL cannot be empty");
        }
        if self.max_db_connections == 0 {
            anyhow::bail!("INGEST_MAX_DB_CONNECTIONS must be greater than 0");
        }
        self.nppes.validate()
    }
}

impl NppesApiConfig {
    /// Load NPPES API configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("NPPES_API_URL").unwrap_or(defaults.base_url),
            api_version: std::env::var("NPPES_API_VERSION").unwrap_or(defaults.api_version),
            page_size: env_parsed("INGEST_PAGE_SIZE", defaults.page_size),
            page_interval_ms: env_parsed("INGEST_PAGE_INTERVAL_MS", defaults.page_interval_ms),
            state_pause_ms: env_parsed("INGEST_STATE_PAUSE_MS", defaults.state_pause_ms),
            http_timeout_secs: env_parsed("INGEST_HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
        }
    }

    /// Validate NPPES API configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("NPPES_API_URL cannot be empty");
        }
        if self.api_version.is_empty() {
            anyhow::bail!("NPPES_API_VERSION cannot be empty");
        }
        if self.page_size == 0 || self.page_size > 200 {
            // The upstream API rejects limit values above 200
            anyhow::bail!(
                "INGEST_PAGE_SIZE must be between 1 and 200, got {}",
                self.page_size
            );
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("INGEST_HTTP_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    /// Pause between page requests as a Duration
    pub fn page_interval(&self) -> Duration {
        Duration::from_millis(self.page_interval_ms)
    }

    /// Pause between jurisdictions as a Duration
    pub fn state_pause(&self) -> Duration {
        Duration::from_millis(self.state_pause_ms)
    }

    /// HTTP client timeout as a Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Read an env var and parse it, falling back to `default` when unset or bad
fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nppes_config_defaults() {
        let config = NppesApiConfig::default();
        assert_eq!(config.base_url, "https://npiregistry.cms.hhs.gov/api");
        assert_eq!(config.api_version, "2.1");
        assert_eq!(config.page_size, 200);
        assert_eq!(config.page_interval(), Duration::from_secs(1));
        assert_eq!(config.state_pause(), Duration::from_secs(2));
    }

    #[test]
    fn nppes_config_default_is_valid() {
        assert!(NppesApiConfig::default().validate().is_ok());
    }

    #[test]
    fn page_size_bounds_are_enforced() {
        let mut config = NppesApiConfig::default();
        config.page_size = 0;
        assert!(config.validate().is_err());
        config.page_size = 201;
        assert!(config.validate().is_err());
        config.page_size = 200;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let mut config = NppesApiConfig::default();
        config.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn ingest_config_rejects_empty_database_url() {
        let config = IngestConfig {
            database_url: String::new(),
            max_db_connections: 5,
            nppes: NppesApiConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_accessor_converts_seconds() {
        let config = NppesApiConfig {
            http_timeout_secs: 90,
            ..Default::default()
        };
        assert_eq!(config.http_timeout(), Duration::from_secs(90));
    }
}
