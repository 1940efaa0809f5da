//! Retry decorator for template producers.

use serde_json::Value;
use spell_package_retry::{retry_with, RetryConfig, Strategy};

use crate::{
    errors::{ProducerError, ProducerResult},
    response::UnsignedPackage,
    traits::TemplateProducer,
};

/// Wraps a producer and retries requests that failed in transit or on the server side.
#[derive(Debug, Clone)]
pub struct RetryingProducer<P> {
    inner: P,
    strategy: Strategy<ProducerError>,
}

impl<P> RetryingProducer<P> {
    /// Wraps `inner` with the backoff described by `config`.
    pub fn new(inner: P, config: &RetryConfig) -> Self {
        Self::with_strategy(inner, config.strategy(ProducerError::is_transient))
    }

    /// Wraps `inner` with an arbitrary strategy.
    pub const fn with_strategy(inner: P, strategy: Strategy<ProducerError>) -> Self {
        Self { inner, strategy }
    }

    /// The wrapped producer.
    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: TemplateProducer> TemplateProducer for RetryingProducer<P> {
    async fn produce(&self, request: &Value) -> ProducerResult<UnsignedPackage> {
        retry_with(&self.strategy, || self.inner.produce(request)).await
    }
}
