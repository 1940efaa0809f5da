//! Composable retry strategies for the network clients around the signing core.
//!
//! Strategies classify an error and decide, per attempt, whether to wait and try again. They are
//! only ever applied by client decorators; the signing state machine itself never retries.

mod config;
mod strategy;

pub use config::RetryConfig;
pub use strategy::{retry_with, ErrorHandler, RetryAction, Strategy};
