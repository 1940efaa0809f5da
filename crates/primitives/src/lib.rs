//! This crate contains the pure transaction types shared across the workspace: the consensus
//! codec for templates, UTXO references and their provenance, and the result of a package
//! submission.
//!
//! It lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend on any
//! other crate in this workspace and performs no I/O.

pub mod codec;
pub mod errors;
pub mod package;
pub mod provenance;
pub mod utxo;
