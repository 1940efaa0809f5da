//! JSON wire format spoken with signers reachable over HTTP.
//!
//! A reply is decoded into [`SignerReply`] and validated exactly once, into a
//! [`SignerResponse`]. Nothing downstream ever inspects raw JSON.

use std::collections::{btree_map::Entry, BTreeMap};

use base64::{engine::general_purpose::STANDARD, Engine};
use bitcoin::{Psbt, Witness};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{SignerError, SignerResult},
    traits::{SignRequest, SignedInputs, SignerResponse, SigningPhase},
};

/// Body of a signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequestBody {
    /// Which phase of the attempt this is.
    pub phase: SigningPhase,

    /// The base64-encoded PSBT.
    pub psbt: String,

    /// The inputs the signer is asked to sign.
    pub indices: Vec<usize>,
}

impl From<&SignRequest> for SignRequestBody {
    fn from(request: &SignRequest) -> Self {
        Self {
            phase: request.phase,
            psbt: STANDARD.encode(request.psbt.serialize()),
            indices: request.indices.clone(),
        }
    }
}

/// A witness for one input, as hex-encoded stack elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireWitness {
    /// The input the witness belongs to.
    pub index: usize,

    /// The witness stack, bottom first.
    pub stack: Vec<String>,
}

/// Body of a signer's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignerReply {
    /// The request's PSBT, signed.
    SignedPsbt {
        /// The base64-encoded PSBT.
        psbt: String,
    },

    /// Complete witnesses for the requested inputs.
    Witnesses {
        /// One entry per signed input.
        witnesses: Vec<WireWitness>,
    },

    /// The signer declined.
    Rejected {
        /// The reason given, if any.
        #[serde(default)]
        reason: String,
    },
}

impl SignerReply {
    /// Validates the reply into a [`SignerResponse`].
    pub fn validate(self) -> SignerResult<SignerResponse> {
        match self {
            Self::SignedPsbt { psbt } => {
                let bytes = STANDARD
                    .decode(psbt.trim())
                    .map_err(|e| invalid(format!("psbt is not base64: {e}")))?;
                let psbt = Psbt::deserialize(&bytes)
                    .map_err(|e| invalid(format!("psbt does not decode: {e}")))?;

                Ok(SignerResponse::Signed(SignedInputs::Psbt(psbt)))
            }
            Self::Witnesses { witnesses } => {
                let mut by_index = BTreeMap::new();
                for WireWitness { index, stack } in witnesses {
                    if stack.is_empty() {
                        return Err(invalid(format!("empty witness for input {index}")));
                    }

                    let stack = stack
                        .iter()
                        .map(hex::decode)
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|e| invalid(format!("witness for input {index}: {e}")))?;

                    match by_index.entry(index) {
                        Entry::Vacant(entry) => {
                            entry.insert(Witness::from_slice(&stack));
                        }
                        Entry::Occupied(_) => {
                            return Err(invalid(format!("duplicate witness for input {index}")));
                        }
                    }
                }

                Ok(SignerResponse::Signed(SignedInputs::Witnesses(by_index)))
            }
            Self::Rejected { reason } => Ok(SignerResponse::Rejected { reason }),
        }
    }
}

impl From<&SignerResponse> for SignerReply {
    fn from(response: &SignerResponse) -> Self {
        match response {
            SignerResponse::Signed(SignedInputs::Psbt(psbt)) => Self::SignedPsbt {
                psbt: STANDARD.encode(psbt.serialize()),
            },
            SignerResponse::Signed(SignedInputs::Witnesses(witnesses)) => Self::Witnesses {
                witnesses: witnesses
                    .iter()
                    .map(|(index, witness)| WireWitness {
                        index: *index,
                        stack: witness.iter().map(hex::encode).collect(),
                    })
                    .collect(),
            },
            SignerResponse::Rejected { reason } => Self::Rejected {
                reason: reason.clone(),
            },
        }
    }
}

fn invalid(reason: String) -> SignerError {
    SignerError::InvalidResponse(reason)
}
