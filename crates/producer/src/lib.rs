//! This crate talks to the prover service that turns a spell request into the unsigned commit
//! and spell transaction templates.
//!
//! The request itself is opaque here: callers assemble it and the producer only validates what
//! comes back.

pub mod errors;
pub mod prover;
pub mod response;
pub mod retrying;
pub mod traits;

pub use errors::{ProducerError, ProducerResult};
pub use prover::ProverClient;
pub use response::{ProverResponse, UnsignedPackage};
pub use retrying::RetryingProducer;
pub use traits::TemplateProducer;
