//! Fixed-interval request gate
//!
//! Upstream asks for polite pacing rather than offering rate-limit headers,
//! so requests pass through a gate that releases one slot per fixed interval.
//! The gate is injected into the fetcher; pagination logic never sleeps on
//! its own.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Releases callers at most once per `interval`
///
/// A zero interval disables the gate entirely (used by tests).
#[derive(Debug)]
pub struct FixedIntervalGate {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl FixedIntervalGate {
    /// Create a gate with the given minimum spacing between slots
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait until the next slot opens, then claim it
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        if *next > now {
            sleep(*next - now).await;
        }
        *next = Instant::now() + self.interval;
    }
}
