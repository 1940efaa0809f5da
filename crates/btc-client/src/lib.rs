//! Clients for the Bitcoin node the package is relayed through.
//!
//! The node plays two roles: it is the [`ProvenanceSource`] for the UTXOs a package spends and
//! the [`PackageRelay`] that evaluates the finished package atomically.

pub mod errors;
pub mod relay;
pub mod retrying;
pub mod rpc;
pub mod traits;

pub use errors::{ClientError, ClientResult};
pub use relay::SubmitPackageResponse;
pub use retrying::RetryingRelay;
pub use rpc::BitcoinRpcClient;
pub use traits::{PackageRelay, ProvenanceSource};
