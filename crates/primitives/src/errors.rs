//! Errors raised while decoding templates and resolving provenance.

use bitcoin::Txid;
use thiserror::Error;

use crate::utxo::UtxoRef;

/// Errors produced by the pure transaction primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// The bytes could not be parsed as a consensus-encoded transaction.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// The parent transaction supplied as provenance could not be parsed.
    #[error("malformed provenance for {utxo}: {reason}")]
    MalformedProvenance {
        /// The UTXO whose provenance is malformed.
        utxo: UtxoRef,
        /// Why decoding failed.
        reason: String,
    },

    /// The parent transaction does not contain the referenced output.
    #[error("provenance mismatch for {utxo}: {reason}")]
    ProvenanceMismatch {
        /// The UTXO whose provenance does not match.
        utxo: UtxoRef,
        /// What did not match.
        reason: String,
    },

    /// A transaction has an input without a witness.
    #[error("incomplete witness: input {index} of {txid} carries no witness")]
    IncompleteWitness {
        /// The transaction with the unauthenticated input.
        txid: Txid,
        /// The index of the first input without a witness.
        index: usize,
    },
}

/// Result alias for [`TxError`].
pub type TxResult<T> = Result<T, TxError>;
