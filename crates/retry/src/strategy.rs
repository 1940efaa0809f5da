//! Retry strategies modelled as an error handler plus an attempt budget.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use rand::Rng;
use tracing::debug;

/// Type alias for the error handler function to reduce type complexity.
pub type ErrorHandler<E> = Arc<dyn Fn(&E, usize) -> RetryAction + Send + Sync>;

/// Represents the action to take when an error occurs during retry attempts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RetryAction {
    /// Continue retrying with the specified delay.
    Retry(Duration),

    /// Stop retrying and return the error.
    Stop,
}

/// A retry strategy that determines how to handle errors and when to retry.
pub struct Strategy<E> {
    /// Determines the action to take for a given error and retry attempt number.
    error_handler: ErrorHandler<E>,

    /// Maximum number of retry attempts (None for unlimited).
    max_retries: Option<usize>,
}

impl<E> Clone for Strategy<E> {
    fn clone(&self) -> Self {
        Self {
            error_handler: Arc::clone(&self.error_handler),
            max_retries: self.max_retries,
        }
    }
}

impl<E> fmt::Debug for Strategy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl<E: 'static> Strategy<E> {
    /// Creates a new retry strategy with the given error handler.
    ///
    /// This will retry indefinitely unless a maximum number of retries is set later with
    /// [`Self::with_max_retries`].
    pub fn new<F>(error_handler: F) -> Self
    where
        F: Fn(&E, usize) -> RetryAction + Send + Sync + 'static,
    {
        Self {
            error_handler: Arc::new(error_handler),
            max_retries: None,
        }
    }

    /// Sets the maximum number of retry attempts.
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// The maximum number of retry attempts, if bounded.
    pub const fn max_retries(&self) -> Option<usize> {
        self.max_retries
    }

    /// Creates a strategy that retries with exponential backoff.
    pub fn exponential_backoff(
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Self {
        Self::new(move |_error, attempt| {
            let delay_ms = (initial_delay.as_millis() as f64 * multiplier.powi(attempt as i32))
                .min(max_delay.as_millis() as f64) as u64;
            RetryAction::Retry(Duration::from_millis(delay_ms))
        })
    }

    /// Creates a strategy that retries with a fixed delay.
    pub fn fixed_delay(delay: Duration) -> Self {
        Self::new(move |_error, _attempt| RetryAction::Retry(delay))
    }

    /// Restricts this strategy to errors for which `predicate` holds. Any other error stops.
    pub fn when<P>(self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let handler = self.error_handler;
        Self {
            error_handler: Arc::new(move |error, attempt| {
                if predicate(error) {
                    handler(error, attempt)
                } else {
                    RetryAction::Stop
                }
            }),
            max_retries: self.max_retries,
        }
    }

    /// Randomly shortens every delay by up to `ratio` of its length.
    ///
    /// `ratio` is clamped to `[0, 1]`. A non-finite ratio disables jitter.
    pub fn with_jitter(self, ratio: f64) -> Self {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if ratio == 0.0 {
            return self;
        }

        let handler = self.error_handler;
        Self {
            error_handler: Arc::new(move |error, attempt| match handler(error, attempt) {
                RetryAction::Retry(delay) => {
                    let cut = rand::thread_rng().gen_range(0.0..=ratio);
                    RetryAction::Retry(delay.mul_f64(1.0 - cut))
                }
                RetryAction::Stop => RetryAction::Stop,
            }),
            max_retries: self.max_retries,
        }
    }
}

/// Runs the future produced by `generator` until it succeeds or `strategy` gives up.
///
/// The generator is invoked once per attempt; the initial attempt does not count as a retry.
pub async fn retry_with<A, E, Fut, Gen>(strategy: &Strategy<E>, mut generator: Gen) -> Result<A, E>
where
    Fut: Future<Output = Result<A, E>>,
    Gen: FnMut() -> Fut,
{
    let mut attempt = 0;

    loop {
        match generator().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if strategy.max_retries.is_some_and(|max| attempt >= max) {
                    debug!(%attempt, "retry budget exhausted");
                    return Err(error);
                }

                match (strategy.error_handler)(&error, attempt) {
                    RetryAction::Retry(delay) => {
                        debug!(%attempt, ?delay, "retrying after failure");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryAction::Stop => return Err(error),
                }
            }
        }
    }
}
