//! Submission of a signed package and interpretation of the relay's verdict.

use bitcoin::Txid;
use spell_package_btc_client::{ClientError, PackageRelay};
use spell_package_primitives::{codec::FinalizedTransaction, package::PackageResult};
use tracing::{info, warn};

use crate::errors::{CoordinatorResult, PackageError, Rejection};

/// A fully witnessed commit and spell, ready to be relayed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPackage {
    /// The commit transaction.
    pub commit: FinalizedTransaction,

    /// The spell transaction, spending the commit.
    pub spell: FinalizedTransaction,
}

impl SignedPackage {
    /// The txids of the package, parent first.
    pub fn txids(&self) -> [Txid; 2] {
        [self.commit.txid(), self.spell.txid()]
    }

    /// The transactions of the package, parent first.
    pub fn transactions(&self) -> [FinalizedTransaction; 2] {
        [self.commit.clone(), self.spell.clone()]
    }
}

/// Submits `package` to `relay` once and requires every transaction to be accepted.
///
/// A rejected or missing transaction fails with [`PackageError::PackageRejected`], carrying the
/// relay's error text as-is. An error the relay itself raised while evaluating the package is
/// reported the same way. Only failures to reach the relay are [`PackageError::Relay`].
pub async fn submit<R: PackageRelay>(
    relay: &R,
    package: &SignedPackage,
) -> CoordinatorResult<PackageResult> {
    let txids = package.txids();
    info!(commit = %txids[0], spell = %txids[1], "submitting package");

    let result = match relay.submit_package(&package.transactions()).await {
        Ok(result) => result,
        Err(ClientError::Rpc { message, .. }) => {
            warn!(%message, "relay refused package");
            return Err(PackageError::PackageRejected {
                rejections: Vec::new(),
                package_msg: Some(message),
            });
        }
        Err(err) => return Err(PackageError::Relay(err)),
    };

    if result.is_success(&txids) {
        info!(msg = ?result.package_msg, "package accepted");
        return Ok(result);
    }

    let rejections = result
        .rejections(&txids)
        .into_iter()
        .map(|(txid, error)| Rejection { txid, error })
        .collect::<Vec<_>>();
    warn!(?rejections, msg = ?result.package_msg, "package rejected");

    Err(PackageError::PackageRejected {
        rejections,
        package_msg: result.package_msg,
    })
}
