//! Time limits for sidecar calls.

use std::time::Duration;

use inertia_core::SsrConfig;

/// Time limits applied to each render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsrTimeouts {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout.
    pub total: Duration,
}

impl SsrTimeouts {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: total / 4,
            total,
        }
    }

    /// Take the limits from an SSR configuration.
    pub fn from_config(config: &SsrConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            total: config.timeout(),
        }
    }

    /// The limit for one call given the caller's remaining budget.
    ///
    /// The caller's budget can only shorten the configured total.
    pub fn effective(&self, budget: Option<Duration>) -> Duration {
        match budget {
            Some(budget) => budget.min(self.total),
            None => self.total,
        }
    }
}

impl Default for SsrTimeouts {
    fn default() -> Self {
        Self::from_config(&SsrConfig::default())
    }
}
