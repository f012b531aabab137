//! PDI Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared functionality for the PDI (Provider Directory Ingest) workspace:
//!
//! - **Logging**: tracing subscriber configuration shared by every binary
//! - **States**: the fixed jurisdiction table the ingestion run iterates
//!
//! # Example
//!
//! ```no_run
//! use pdi_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod states;

// Re-export commonly used items
pub use states::{UsState, US_STATES};
