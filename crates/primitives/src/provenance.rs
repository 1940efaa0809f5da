//! Resolution of a UTXO's spendable output from its parent transaction.

use bitcoin::{consensus, Amount, ScriptBuf, Transaction, TxOut};
use tracing::warn;

use crate::{
    errors::{TxError, TxResult},
    utxo::{UtxoProvenance, UtxoRef},
};

/// The output a [`UtxoRef`] points to, as decoded from its parent transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    /// The output being resolved.
    pub utxo: UtxoRef,

    /// The value locked in the output.
    pub value: Amount,

    /// The locking script of the output.
    pub script_pubkey: ScriptBuf,
}

impl ResolvedOutput {
    /// Returns the output in the form sighash computation expects.
    pub fn to_txout(&self) -> TxOut {
        TxOut {
            value: self.value,
            script_pubkey: self.script_pubkey.clone(),
        }
    }

    /// Resolves output `vout` of an already decoded transaction.
    pub fn from_parent(parent: &Transaction, vout: u32) -> TxResult<Self> {
        let utxo = UtxoRef::new(parent.compute_txid(), vout);
        let txout = output_at(parent, &utxo)?;

        Ok(Self {
            utxo,
            value: txout.value,
            script_pubkey: txout.script_pubkey.clone(),
        })
    }
}

/// Derives the spendable output described by `provenance`.
///
/// The value and script are always taken from the decoded parent. The claimed value is only used
/// to warn about disagreements.
pub fn resolve(provenance: &UtxoProvenance) -> TxResult<ResolvedOutput> {
    let utxo = provenance.utxo;

    let parent: Transaction = consensus::deserialize(&provenance.parent_raw_tx).map_err(|e| {
        TxError::MalformedProvenance {
            utxo,
            reason: e.to_string(),
        }
    })?;

    let parent_txid = parent.compute_txid();
    if !utxo.matches_txid(&parent_txid) {
        return Err(TxError::ProvenanceMismatch {
            utxo,
            reason: format!("parent transaction is {parent_txid}"),
        });
    }

    let txout = output_at(&parent, &utxo)?;

    if txout.value != provenance.value {
        warn!(
            %utxo,
            claimed = %provenance.value,
            decoded = %txout.value,
            "claimed value disagrees with parent transaction, using decoded value"
        );
    }

    Ok(ResolvedOutput {
        utxo,
        value: txout.value,
        script_pubkey: txout.script_pubkey.clone(),
    })
}

fn output_at<'tx>(parent: &'tx Transaction, utxo: &UtxoRef) -> TxResult<&'tx TxOut> {
    parent
        .output
        .get(utxo.vout as usize)
        .ok_or_else(|| TxError::ProvenanceMismatch {
            utxo: *utxo,
            reason: format!(
                "vout {} out of range, parent has {} outputs",
                utxo.vout,
                parent.output.len()
            ),
        })
}
