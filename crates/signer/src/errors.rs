//! Errors raised while talking to an external signer.

use thiserror::Error;

/// Errors that can occur while requesting signatures.
///
/// A signer that declines to sign is not an error at this level; it is reported through
/// [`SignerResponse::Rejected`](crate::SignerResponse::Rejected).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// The signer could not be reached or the exchange was interrupted.
    #[error("signer transport failed: {0}")]
    Transport(String),

    /// The signer answered with a non-success status.
    #[error("signer returned http status {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The body of the response, if readable.
        body: String,
    },

    /// The signer answered with something that is not a valid response.
    #[error("invalid signer response: {0}")]
    InvalidResponse(String),

    /// The request cannot be signed as given.
    #[error("invalid signing request: {0}")]
    InvalidRequest(String),
}

/// Result alias for [`SignerError`].
pub type SignerResult<T> = Result<T, SignerError>;
