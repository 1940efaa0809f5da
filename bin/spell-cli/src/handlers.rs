//! Subcommand handlers.

pub(crate) mod inspect;
pub(crate) mod prove;
pub(crate) mod sign;
