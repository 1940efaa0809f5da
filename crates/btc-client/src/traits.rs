//! Interfaces over the node, so the coordinator can be driven by any implementation.

use std::future::Future;

use spell_package_primitives::{
    codec::FinalizedTransaction,
    package::PackageResult,
    utxo::{UtxoProvenance, UtxoRef},
};

use crate::errors::ClientResult;

/// Relays dependent transactions as one package.
pub trait PackageRelay: Send + Sync {
    /// Submits `txs`, parents first, and reports a verdict per transaction.
    ///
    /// A package the relay evaluated and rejected is an `Ok` result with rejected entries.
    /// Errors are reserved for failures to get a verdict at all.
    fn submit_package(
        &self,
        txs: &[FinalizedTransaction],
    ) -> impl Future<Output = ClientResult<PackageResult>> + Send;
}

/// Supplies the raw parent transaction of a UTXO.
pub trait ProvenanceSource: Send + Sync {
    /// Fetches the provenance of `utxo`.
    fn fetch(&self, utxo: UtxoRef) -> impl Future<Output = ClientResult<UtxoProvenance>> + Send;
}
