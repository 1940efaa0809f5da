//! Coordinator settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the spell's spend of the commit output gets its witness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSpendPolicy {
    /// The spell template already witnesses the commit spend, typically with a proof.
    #[default]
    Presatisfied,

    /// The commit spend is signed in the same request as the anchor, unless the template already
    /// witnesses it.
    CoSign,
}

/// Settings of a [`PackageCoordinator`](crate::PackageCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Bound on a single signer call, human approval included.
    pub signer_timeout: Duration,

    /// See [`CommitSpendPolicy`].
    pub commit_spend: CommitSpendPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            signer_timeout: Duration::from_secs(120),
            commit_spend: CommitSpendPolicy::default(),
        }
    }
}
