//! Errors raised by the node clients.

use spell_package_primitives::errors::TxError;
use thiserror::Error;

/// Errors that can occur while talking to the node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The node could not be reached or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a non-success status and no JSON-RPC error.
    #[error("http status {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The body of the response.
        body: String,
    },

    /// The node rejected the call.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The error message, verbatim.
        message: String,
    },

    /// The node answered with something that does not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A transaction returned by the node does not decode.
    #[error(transparent)]
    Tx(#[from] TxError),
}

impl ClientError {
    /// Whether the call may succeed if repeated unchanged.
    ///
    /// Only failures to reach the node, and server-side HTTP failures, qualify. A verdict of
    /// the node is never retryable.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Rpc { .. } | Self::InvalidResponse(_) | Self::Tx(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result alias for [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;
