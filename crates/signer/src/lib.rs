//! The external signer interface used by both signing phases, along with the two signers this
//! workspace ships: an in-memory keypair signer and a client for a signer reachable over HTTP.

pub mod errors;
pub mod http;
pub mod keypair;
pub mod traits;
pub mod wire;

pub use errors::{SignerError, SignerResult};
pub use http::HttpSigner;
pub use keypair::KeypairSigner;
pub use traits::{ExternalSigner, SignRequest, SignedInputs, SignerResponse, SigningPhase};
