//! Errors raised while building and finalizing signable templates.

use spell_package_primitives::{errors::TxError, utxo::UtxoRef};
use thiserror::Error;

/// Errors that can occur while classifying, building or finalizing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Decoding or resolution failed.
    #[error(transparent)]
    Tx(#[from] TxError),

    /// An input spends a UTXO with no known provenance, or no input spends the signing target.
    #[error("no input found for {utxo} (input index: {index:?})")]
    InputNotFound {
        /// The UTXO that could not be matched.
        utxo: UtxoRef,
        /// The offending input, or `None` if the target is not spent at all.
        index: Option<usize>,
    },

    /// Two inputs spend the same known UTXO.
    #[error("inputs {first} and {second} both spend {utxo}")]
    DuplicateInput {
        /// The UTXO spent twice.
        utxo: UtxoRef,
        /// The first input spending it.
        first: usize,
        /// The second input spending it.
        second: usize,
    },

    /// Anchor and funding name the same UTXO.
    #[error("anchor and funding both reference {0}")]
    DuplicateProvenance(UtxoRef),

    /// The signer's public key material is not a valid key.
    #[error("invalid signer key: {0}")]
    InvalidSignerKey(String),

    /// The output of the first phase has already been recorded for this attempt.
    #[error("prior phase output already recorded")]
    PriorPhaseAlreadyRecorded,

    /// An input cannot be expressed in a PSBT for signing.
    #[error("input {index} is not supported: {reason}")]
    UnsupportedInput {
        /// The offending input.
        index: usize,
        /// Why it is not supported.
        reason: String,
    },

    /// The signer returned material that does not belong to this template.
    #[error("invalid signer response: {0}")]
    InvalidSignerResponse(String),
}

/// Result alias for [`BuildError`].
pub type BuildResult<T> = Result<T, BuildError>;
