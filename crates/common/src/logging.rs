//! Provides utilities to initialize logging.
use std::env;

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable name for the service label, which is appended to the
/// whoami string.
pub const SVC_LABEL_ENVVAR: &str = "SPELL_PACKAGE_SVC_LABEL";

/// Set to `1` to include the source file in every event.
pub const LOG_FILE_ENVVAR: &str = "LOG_FILE";

/// Set to `1` to include the source line in every event.
pub const LOG_LINE_NUM_ENVVAR: &str = "LOG_LINE_NUM";

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// The whoami string, which is used to identify the service in logs.
    whoami: String,

    /// Include the source file in every event.
    with_file: bool,

    /// Include the source line in every event.
    with_line_number: bool,
}

impl LoggerConfig {
    /// Creates a new instance with whoami set and source locations taken from the environment.
    pub fn new(whoami: String) -> Self {
        Self {
            whoami,
            with_file: env_flag(LOG_FILE_ENVVAR),
            with_line_number: env_flag(LOG_LINE_NUM_ENVVAR),
        }
    }

    /// Creates a new instance with the whoami string set to the provided
    /// string.
    pub fn with_base_name(s: &str) -> Self {
        Self::new(get_whoami_string(s))
    }

    /// Includes or omits source locations, overriding the environment.
    pub const fn with_source_locations(mut self, file: bool, line_number: bool) -> Self {
        self.with_file = file;
        self.with_line_number = line_number;
        self
    }

    /// The whoami string.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(spell-package)")
    }
}

/// Initializes the logging subsystem with the provided config.
///
/// The filter is read from `RUST_LOG`.
pub fn init(config: LoggerConfig) {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    let stdout_sub = tracing_subscriber::fmt::layer()
        .compact()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(config.with_file)
                .with_line_number(config.with_line_number),
        )
        .with_filter(filt);

    tracing_subscriber::registry().with(stdout_sub).init();

    info!(whoami = %config.whoami, "logging started");
}

/// Gets the service label from the standard envvar, which should be included
/// in the whoami string.
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes a standard whoami string.
pub fn get_whoami_string(base: &str) -> String {
    whoami_with_label(base, get_service_label_from_env().as_deref())
}

fn whoami_with_label(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| v == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_appended_to_whoami() {
        assert_eq!(whoami_with_label("spell-cli", Some("alice")), "spell-cli%alice");
        assert_eq!(whoami_with_label("spell-cli", None), "spell-cli");
    }

    #[test]
    fn source_locations_can_be_overridden() {
        let config = LoggerConfig::new("test".into()).with_source_locations(true, false);

        assert!(config.with_file);
        assert!(!config.with_line_number);
        assert_eq!(config.whoami(), "test");
    }
}
