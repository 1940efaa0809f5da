//! This crate provides deterministic fixtures and mock collaborators for testing the package
//! signing pipeline.
//!
//! Everything here panics on misuse instead of returning errors.

pub mod bitcoin;
pub mod fixtures;
pub mod mocks;

pub use fixtures::PackageFixture;
pub use mocks::{MockBehaviour, MockRelay, MockSigner};

pub use self::bitcoin::{keypair, p2tr_script, p2wpkh_script, parent_tx, provenance, template};
