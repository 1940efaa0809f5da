//! Errors raised while producing templates.

use spell_package_primitives::errors::TxError;
use thiserror::Error;

/// Errors that can occur while asking the prover for templates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerError {
    /// The prover could not be reached, or did not answer in time.
    #[error("transport error: {0}")]
    Transport(String),

    /// The prover answered with a non-success status.
    #[error("prover returned status {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The body of the response.
        body: String,
    },

    /// The prover answered with something that is not a list of transactions.
    #[error("invalid prover response: {0}")]
    InvalidResponse(String),

    /// A transaction returned by the prover does not decode.
    #[error(transparent)]
    Tx(#[from] TxError),
}

impl ProducerError {
    /// Whether asking again unchanged may succeed.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::InvalidResponse(_) | Self::Tx(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProducerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result alias for [`ProducerError`].
pub type ProducerResult<T> = Result<T, ProducerError>;
