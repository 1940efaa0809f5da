//! The interface between the signing coordinator and whoever holds the keys.

use std::{collections::BTreeMap, fmt, future::Future};

use bitcoin::{Psbt, Witness};
use serde::{Deserialize, Serialize};

use crate::errors::SignerResult;

/// The phase of a package signing attempt a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningPhase {
    /// Funding input of the commit transaction.
    Commit,

    /// Anchor input (and possibly the commit spend) of the spell transaction.
    Spell,
}

impl fmt::Display for SigningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => f.write_str("commit"),
            Self::Spell => f.write_str("spell"),
        }
    }
}

/// A request for signatures over some inputs of a PSBT.
///
/// Every input of `psbt` carries its `witness_utxo`; inputs that already carry a witness are
/// finalized and never appear in `indices`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignRequest {
    /// Which phase of the attempt this is.
    pub phase: SigningPhase,

    /// The transaction to sign, with per-input metadata.
    pub psbt: Psbt,

    /// The inputs the signer is asked to sign.
    pub indices: Vec<usize>,
}

/// Signature material returned by a signer that agreed to sign.
#[derive(Debug, Clone, PartialEq)]
pub enum SignedInputs {
    /// The request's PSBT with signatures (or finalized witnesses) filled in.
    Psbt(Psbt),

    /// Complete witnesses keyed by input index.
    Witnesses(BTreeMap<usize, Witness>),
}

/// A validated answer from an external signer.
#[derive(Debug, Clone, PartialEq)]
pub enum SignerResponse {
    /// The signer produced signature material.
    Signed(SignedInputs),

    /// The signer (or the human behind it) declined.
    Rejected {
        /// The reason given, if any.
        reason: String,
    },
}

/// A party able to sign inputs of a PSBT.
///
/// Calls may wait on human approval for an unbounded amount of time. Callers are expected to
/// bound them with a timeout.
pub trait ExternalSigner: Send + Sync {
    /// Requests signatures for `request.indices`.
    fn sign(
        &self,
        request: SignRequest,
    ) -> impl Future<Output = SignerResult<SignerResponse>> + Send;
}
