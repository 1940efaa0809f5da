//! Turns an unsigned transaction template into a signer-ready PSBT and back into a finalized
//! transaction.
//!
//! Every input of a template is classified against the UTXOs of the current signing attempt.
//! Inputs that already carry a witness are preserved verbatim. The remaining ones get their
//! spent output and key context attached so that an external signer can produce a signature.

pub mod classify;
pub mod context;
pub mod errors;
mod finalize;
pub mod signable;

#[cfg(test)]
mod test_support;

pub use classify::{classify, ClassifiedInput, InputRole};
pub use context::{SignerKey, SigningContext};
pub use errors::{BuildError, BuildResult};
pub use signable::{build, SignableTemplate};
