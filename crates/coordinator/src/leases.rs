//! Exclusive, scoped claims on the UTXOs of a signing attempt.

use std::{collections::BTreeSet, fmt, sync::Arc};

use parking_lot::Mutex;
use spell_package_primitives::utxo::UtxoRef;
use tracing::{debug, trace};

use crate::errors::{CoordinatorResult, PackageError};

/// The UTXOs currently claimed by running attempts.
///
/// Cloning yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct UtxoLeases {
    leased: Arc<Mutex<BTreeSet<UtxoRef>>>,
}

impl fmt::Debug for UtxoLeases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtxoLeases")
            .field("leased", &*self.leased.lock())
            .finish()
    }
}

impl UtxoLeases {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims every one of `utxos`, or none of them.
    ///
    /// A UTXO counts as leased if it is leased in either byte order of its txid.
    pub fn acquire(&self, utxos: &[UtxoRef]) -> CoordinatorResult<UtxoLease> {
        let mut leased = self.leased.lock();

        if let Some(utxo) = utxos.iter().find(|utxo| is_leased(&leased, utxo)) {
            debug!(%utxo, "utxo already leased");
            return Err(PackageError::UtxoInFlight(*utxo));
        }

        leased.extend(utxos.iter().copied());
        trace!(count = utxos.len(), "leased utxos");

        Ok(UtxoLease {
            registry: self.clone(),
            utxos: utxos.to_vec(),
        })
    }

    /// Whether `utxo` is currently leased.
    pub fn is_leased(&self, utxo: &UtxoRef) -> bool {
        is_leased(&self.leased.lock(), utxo)
    }

    /// The number of UTXOs currently leased.
    pub fn len(&self) -> usize {
        self.leased.lock().len()
    }

    /// Whether nothing is leased.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, utxos: &[UtxoRef]) {
        let mut leased = self.leased.lock();
        for utxo in utxos {
            leased.remove(utxo);
        }
        trace!(count = utxos.len(), "released utxos");
    }
}

fn is_leased(leased: &BTreeSet<UtxoRef>, utxo: &UtxoRef) -> bool {
    leased.contains(utxo) || leased.contains(&utxo.byte_reversed())
}

/// A claim on some UTXOs, returned when dropped.
#[derive(Debug)]
#[must_use = "the lease is released as soon as it is dropped"]
pub struct UtxoLease {
    registry: UtxoLeases,
    utxos: Vec<UtxoRef>,
}

impl UtxoLease {
    /// The UTXOs held by this lease.
    pub fn utxos(&self) -> &[UtxoRef] {
        &self.utxos
    }
}

impl Drop for UtxoLease {
    fn drop(&mut self) {
        self.registry.release(&self.utxos);
    }
}
