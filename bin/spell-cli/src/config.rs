//! The configuration file of the CLI.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spell_package_coordinator::CoordinatorConfig;
use spell_package_producer::prover::DEFAULT_PROVE_TIMEOUT;
use spell_package_retry::RetryConfig;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Signing behaviour.
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// The node used to look up parent transactions and to relay the package.
    pub btc_client: BtcClientConfig,

    /// The prover, only needed to prove before signing.
    pub prover: Option<ProverConfig>,

    /// Who holds the signing key.
    pub signer: SignerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BtcClientConfig {
    pub url: String,
    pub user: String,
    pub pass: String,

    /// Bound on a single RPC call.
    pub timeout: Option<Duration>,

    /// Backoff for calls that did not reach the node.
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProverConfig {
    pub url: String,

    /// Bound on a single prove call.
    #[serde(default = "default_prove_timeout")]
    pub timeout: Duration,

    /// Backoff for calls that failed in transit or on the prover's side.
    #[serde(default)]
    pub retry: RetryConfig,
}

const fn default_prove_timeout() -> Duration {
    DEFAULT_PROVE_TIMEOUT
}

/// Either a local key file or a remote signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignerConfig {
    /// A file holding a hex-encoded secret key.
    Keypair { key_path: PathBuf },

    /// A signer reachable over HTTP.
    Http { url: String },
}

impl Config {
    /// Reads and parses the TOML file at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        trace!(?path, "read config file");

        toml::from_str(&contents).with_context(|| format!("parse config file {}", path.display()))
    }
}
