//! Errors that end a package signing attempt.

use std::{fmt, time::Duration};

use bitcoin::Txid;
use spell_package_btc_client::ClientError;
use spell_package_primitives::{errors::TxError, utxo::UtxoRef};
use spell_package_signer::{SignerError, SigningPhase};
use spell_package_tx_builder::BuildError;
use thiserror::Error;

/// Every error is fatal for the attempt that raised it. Nothing signed under a failed attempt
/// survives it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    /// A template does not decode.
    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// A parent transaction does not decode.
    #[error("malformed provenance for {utxo}: {reason}")]
    MalformedProvenance {
        /// The UTXO whose provenance is malformed.
        utxo: UtxoRef,
        /// Why decoding failed.
        reason: String,
    },

    /// A parent transaction does not contain the referenced output.
    #[error("provenance mismatch for {utxo}: {reason}")]
    ProvenanceMismatch {
        /// The UTXO whose provenance does not match.
        utxo: UtxoRef,
        /// What did not match.
        reason: String,
    },

    /// An input spends a UTXO of unknown provenance, or no input spends the signing target.
    #[error("no input found for {utxo} (input index: {index:?})")]
    InputNotFound {
        /// The UTXO that could not be matched.
        utxo: UtxoRef,
        /// The offending input, if any.
        index: Option<usize>,
    },

    /// Two inputs of a template spend the same UTXO.
    #[error("inputs {first} and {second} both spend {utxo}")]
    DuplicateInput {
        /// The UTXO spent twice.
        utxo: UtxoRef,
        /// The first input spending it.
        first: usize,
        /// The second input spending it.
        second: usize,
    },

    /// An input was still unauthenticated after signing.
    #[error("incomplete witness: input {index} of {txid} carries no witness")]
    IncompleteWitness {
        /// The transaction that could not be finalized.
        txid: Txid,
        /// The first input without a witness.
        index: usize,
    },

    /// The signer returned material that does not belong to the request.
    #[error("invalid signer response: {0}")]
    InvalidSignerResponse(String),

    /// The signer did not answer in time.
    #[error("signer timed out after {timeout:?} in {phase} phase")]
    SignerTimeout {
        /// The phase that timed out.
        phase: SigningPhase,
        /// The configured bound.
        timeout: Duration,
    },

    /// The signer declined.
    #[error("signer rejected {phase} phase: {reason}")]
    SignerRejected {
        /// The phase that was declined.
        phase: SigningPhase,
        /// The reason the signer gave.
        reason: String,
    },

    /// The signer could not be reached or failed.
    #[error("signer failed in {phase} phase: {source}")]
    SignerFailed {
        /// The phase that failed.
        phase: SigningPhase,
        /// The underlying failure.
        #[source]
        source: SignerError,
    },

    /// The caller abandoned the attempt.
    #[error("cancelled during {phase} phase")]
    Cancelled {
        /// The phase that was running.
        phase: SigningPhase,
    },

    /// Another attempt is currently spending this UTXO.
    #[error("{0} is in flight in another attempt")]
    UtxoInFlight(UtxoRef),

    /// The spell template does not spend the commit output.
    #[error("spell {spell} does not spend commit output {commit}")]
    SpellDoesNotSpendCommit {
        /// The spell template.
        spell: Txid,
        /// The commit output it should spend.
        commit: UtxoRef,
    },

    /// The request is inconsistent, e.g. the same UTXO is given as anchor and funding.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The relay evaluated the package and did not accept all of it.
    #[error("package rejected: {}", describe_rejections(.rejections, .package_msg))]
    PackageRejected {
        /// The transactions that were not accepted, with the relay's error text.
        rejections: Vec<Rejection>,
        /// The relay's package-level message.
        package_msg: Option<String>,
    },

    /// The relay could not be asked for a verdict.
    #[error("relay error: {0}")]
    Relay(#[source] ClientError),
}

impl PackageError {
    /// Whether a fresh attempt with the same inputs may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SignerTimeout { .. } | Self::SignerRejected { .. } | Self::Cancelled { .. }
        )
    }

    /// Attributes a signer failure to `phase`.
    pub(crate) fn from_signer(phase: SigningPhase, err: SignerError) -> Self {
        match err {
            SignerError::InvalidResponse(reason) => Self::InvalidSignerResponse(reason),
            source => Self::SignerFailed { phase, source },
        }
    }
}

impl From<TxError> for PackageError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::MalformedTransaction(reason) => Self::MalformedTransaction(reason),
            TxError::MalformedProvenance { utxo, reason } => {
                Self::MalformedProvenance { utxo, reason }
            }
            TxError::ProvenanceMismatch { utxo, reason } => {
                Self::ProvenanceMismatch { utxo, reason }
            }
            TxError::IncompleteWitness { txid, index } => Self::IncompleteWitness { txid, index },
        }
    }
}

impl From<BuildError> for PackageError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Tx(err) => err.into(),
            BuildError::InputNotFound { utxo, index } => Self::InputNotFound { utxo, index },
            BuildError::DuplicateInput {
                utxo,
                first,
                second,
            } => Self::DuplicateInput {
                utxo,
                first,
                second,
            },
            BuildError::InvalidSignerResponse(reason) => Self::InvalidSignerResponse(reason),
            err @ (BuildError::DuplicateProvenance(_)
            | BuildError::InvalidSignerKey(_)
            | BuildError::PriorPhaseAlreadyRecorded
            | BuildError::UnsupportedInput { .. }) => Self::InvalidRequest(err.to_string()),
        }
    }
}

/// A transaction of a package the relay did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The rejected transaction.
    pub txid: Txid,

    /// The relay's error text, verbatim. `None` if the relay did not mention the transaction.
    pub error: Option<String>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{}: {error}", self.txid),
            None => write!(f, "{}: missing from relay response", self.txid),
        }
    }
}

fn describe_rejections(rejections: &[Rejection], package_msg: &Option<String>) -> String {
    let mut description = rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");

    if let Some(msg) = package_msg {
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(&format!("({msg})"));
    }

    description
}

/// Result alias for [`PackageError`].
pub type CoordinatorResult<T> = Result<T, PackageError>;
