//! Outcome of submitting a package to a relay.

use std::collections::BTreeMap;

use bitcoin::Txid;
use serde::{Deserialize, Serialize};

/// The relay's verdict on a single transaction of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxAcceptance {
    /// Whether the relay accepted the transaction.
    pub accepted: bool,

    /// The relay's error text, verbatim, if it reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TxAcceptance {
    /// An accepted transaction.
    pub const fn accepted() -> Self {
        Self {
            accepted: true,
            error: None,
        }
    }

    /// A rejected transaction with the relay's reason.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            error: Some(error.into()),
        }
    }
}

/// Per-transaction result of a package submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResult {
    /// Verdict per transaction, keyed by txid.
    pub per_transaction: BTreeMap<Txid, TxAcceptance>,

    /// The package-level message the relay returned, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_msg: Option<String>,
}

impl PackageResult {
    /// Whether every one of `submitted` is present and accepted.
    ///
    /// An empty result is never a success.
    pub fn is_success<'a>(&self, submitted: impl IntoIterator<Item = &'a Txid>) -> bool {
        let mut any = false;
        for txid in submitted {
            any = true;
            match self.per_transaction.get(txid) {
                Some(entry) if entry.accepted => {}
                _ => return false,
            }
        }

        any
    }

    /// The transactions of `submitted` the relay did not accept, with its error text.
    ///
    /// A txid missing from the result is reported with `None`.
    pub fn rejections<'a>(
        &self,
        submitted: impl IntoIterator<Item = &'a Txid>,
    ) -> Vec<(Txid, Option<String>)> {
        submitted
            .into_iter()
            .filter_map(|txid| match self.per_transaction.get(txid) {
                Some(entry) if entry.accepted => None,
                Some(entry) => Some((*txid, entry.error.clone())),
                None => Some((*txid, None)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;

    use super::*;

    fn txid(byte: u8) -> Txid {
        Txid::from_byte_array([byte; 32])
    }

    #[test]
    fn success_requires_every_submitted_txid() {
        let mut result = PackageResult::default();
        result.per_transaction.insert(txid(1), TxAcceptance::accepted());

        assert!(result.is_success(&[txid(1)]));
        assert!(!result.is_success(&[txid(1), txid(2)]));
        assert!(!result.is_success(&[]));
    }

    #[test]
    fn rejections_keep_relay_text() {
        let mut result = PackageResult::default();
        result.per_transaction.insert(txid(1), TxAcceptance::accepted());
        result
            .per_transaction
            .insert(txid(2), TxAcceptance::rejected("bad-witness"));

        assert!(!result.is_success(&[txid(1), txid(2)]));
        assert_eq!(
            result.rejections(&[txid(1), txid(2), txid(3)]),
            vec![
                (txid(2), Some("bad-witness".to_string())),
                (txid(3), None)
            ]
        );
    }
}
