//! Serializable retry settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Strategy;

/// Exponential backoff settings as they appear in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries per call. `None` means retry indefinitely.
    pub max_retries: Option<usize>,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound on any single delay.
    pub max_delay: Duration,

    /// Exponential backoff multiplier.
    pub multiplier: f64,

    /// Fraction of each delay that may be randomly cut, in `[0, 1]`.
    #[serde(default)]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Some(5),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryConfig {
    /// Builds a jittered exponential backoff strategy that only retries errors accepted by
    /// `is_retryable`.
    pub fn strategy<E, P>(&self, is_retryable: P) -> Strategy<E>
    where
        E: 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let strategy =
            Strategy::exponential_backoff(self.initial_delay, self.max_delay, self.multiplier)
                .with_jitter(self.jitter)
                .when(is_retryable);

        match self.max_retries {
            Some(max) => strategy.with_max_retries(max),
            None => strategy,
        }
    }
}
