//! Package relay through Bitcoin Core's `submitpackage`.

use std::collections::BTreeMap;

use bitcoin::{Txid, Wtxid};
use serde::Deserialize;
use serde_json::Value;
use spell_package_primitives::{
    codec::FinalizedTransaction,
    package::{PackageResult, TxAcceptance},
};
use tracing::{info, warn};

use crate::{errors::ClientResult, rpc::BitcoinRpcClient, traits::PackageRelay};

/// The result of `submitpackage`, as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitPackageResponse {
    /// The node's summary of the package evaluation, `"success"` if all went well.
    pub package_msg: String,

    /// Per-transaction results, keyed by wtxid.
    #[serde(rename = "tx-results")]
    pub tx_results: BTreeMap<Wtxid, SubmitPackageTxResult>,

    /// Transactions evicted from the mempool by this package.
    #[serde(rename = "replaced-transactions", default)]
    pub replaced_transactions: Vec<Txid>,
}

/// The node's verdict on one transaction of a package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmitPackageTxResult {
    /// The txid of the transaction.
    pub txid: Txid,

    /// The wtxid of an identical transaction with a different witness already in the mempool.
    #[serde(rename = "other-wtxid", default)]
    pub other_wtxid: Option<Wtxid>,

    /// Virtual size, if the transaction was evaluated.
    #[serde(default)]
    pub vsize: Option<u64>,

    /// Why the transaction was not accepted, if it was not.
    #[serde(default)]
    pub error: Option<String>,
}

impl From<SubmitPackageResponse> for PackageResult {
    fn from(response: SubmitPackageResponse) -> Self {
        let per_transaction = response
            .tx_results
            .into_values()
            .map(|entry| {
                let acceptance = match entry.error {
                    Some(error) => TxAcceptance::rejected(error),
                    None => TxAcceptance::accepted(),
                };
                (entry.txid, acceptance)
            })
            .collect();

        Self {
            per_transaction,
            package_msg: Some(response.package_msg),
        }
    }
}

impl PackageRelay for BitcoinRpcClient {
    async fn submit_package(&self, txs: &[FinalizedTransaction]) -> ClientResult<PackageResult> {
        let raw = txs
            .iter()
            .map(|tx| Value::String(tx.encode_hex()))
            .collect::<Vec<_>>();
        let txids = txs.iter().map(FinalizedTransaction::txid).collect::<Vec<_>>();
        info!(?txids, "submitting package");

        let response: SubmitPackageResponse =
            self.call("submitpackage", &[Value::Array(raw)]).await?;

        if !response.replaced_transactions.is_empty() {
            warn!(
                replaced = ?response.replaced_transactions,
                "package replaced mempool transactions"
            );
        }
        info!(package_msg = %response.package_msg, "package evaluated");

        Ok(response.into())
    }
}
