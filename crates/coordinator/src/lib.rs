//! Drives the two signing phases of a spell package and hands the result to a relay.
//!
//! Phase one signs the funding input of the commit transaction. Its finalized output is then
//! recorded and phase two signs the anchor input of the spell transaction, which spends it. Both
//! transactions are broadcast together as a single package, or not at all.

pub mod broadcast;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod leases;

pub use broadcast::SignedPackage;
pub use config::{CommitSpendPolicy, CoordinatorConfig};
pub use coordinator::{PackageCoordinator, PackageRequest};
pub use errors::{CoordinatorResult, PackageError, Rejection};
pub use leases::{UtxoLease, UtxoLeases};
