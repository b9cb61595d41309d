//! Filter construction and rebuild configuration
//!
//! # Example
//!
//! ```ignore
//! use ha_02_contagion_filter::{FilterConfig, FilterKind};
//!
//! let config = FilterConfig::default().with_kind(FilterKind::Bloom).with_target_fpr(1e-4);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::filter::FilterKind;
use crate::error::FilterError;

/// Filter configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Structure built on every rebuild
    pub kind: FilterKind,
    /// Target false positive rate for the Bloom builder
    pub target_fpr: f64,
    /// Slack added to the record count when sizing a cuckoo filter (percent)
    pub cuckoo_headroom_percent: usize,
    /// Upper bound on cuckoo buckets before a build gives up
    pub cuckoo_max_buckets: usize,
    /// Retry policy of the background rebuild worker
    pub retry: RebuildBackoff,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: FilterKind::Cuckoo,
            target_fpr: 0.0001,
            cuckoo_headroom_percent: 20,
            cuckoo_max_buckets: 1 << 26,
            retry: RebuildBackoff::default(),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), FilterError> {
        if !(self.target_fpr > 0.0 && self.target_fpr < 0.5) {
            return Err(FilterError::InvalidParameters(format!(
                "target_fpr must be in (0, 0.5), got {}",
                self.target_fpr
            )));
        }

        if !self.cuckoo_max_buckets.is_power_of_two() {
            return Err(FilterError::InvalidParameters(
                "cuckoo_max_buckets must be a power of two".to_string(),
            ));
        }

        self.retry.validate()
    }

    pub fn with_kind(mut self, kind: FilterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_target_fpr(mut self, fpr: f64) -> Self {
        self.target_fpr = fpr;
        self
    }

    pub fn with_retry(mut self, retry: RebuildBackoff) -> Self {
        self.retry = retry;
        self
    }
}

/// Capped exponential backoff between failed rebuild attempts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RebuildBackoff {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RebuildBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RebuildBackoff {
    /// Near-immediate retries, for tests.
    pub fn fast() -> Self {
        Self {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.multiplier < 1.0 || self.initial_delay > self.max_delay {
            return Err(FilterError::InvalidParameters(
                "rebuild backoff must not shrink and initial_delay must not exceed max_delay"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt.min(64) as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}
