//! Retry decorator for node clients.

use spell_package_primitives::{
    codec::FinalizedTransaction,
    package::PackageResult,
    utxo::{UtxoProvenance, UtxoRef},
};
use spell_package_retry::{retry_with, RetryConfig, Strategy};

use crate::{
    errors::{ClientError, ClientResult},
    traits::{PackageRelay, ProvenanceSource},
};

/// Wraps a node client and retries calls that failed to get an answer.
///
/// Only [transient](ClientError::is_transient) errors are retried. A verdict of the node,
/// including a rejected package, is returned as-is after the first attempt.
#[derive(Debug, Clone)]
pub struct RetryingRelay<C> {
    inner: C,
    strategy: Strategy<ClientError>,
}

impl<C> RetryingRelay<C> {
    /// Wraps `inner` with the backoff described by `config`.
    pub fn new(inner: C, config: &RetryConfig) -> Self {
        Self::with_strategy(inner, config.strategy(ClientError::is_transient))
    }

    /// Wraps `inner` with an arbitrary strategy.
    pub const fn with_strategy(inner: C, strategy: Strategy<ClientError>) -> Self {
        Self { inner, strategy }
    }

    /// The wrapped client.
    pub const fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: PackageRelay> PackageRelay for RetryingRelay<C> {
    async fn submit_package(&self, txs: &[FinalizedTransaction]) -> ClientResult<PackageResult> {
        retry_with(&self.strategy, || self.inner.submit_package(txs)).await
    }
}

impl<C: ProvenanceSource> ProvenanceSource for RetryingRelay<C> {
    async fn fetch(&self, utxo: UtxoRef) -> ClientResult<UtxoProvenance> {
        retry_with(&self.strategy, || self.inner.fetch(utxo)).await
    }
}
