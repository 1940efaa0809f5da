//! Consensus codec for transaction templates and finalized transactions.
//!
//! Everything in here is pure. A template that is decoded and re-encoded without modification
//! yields the exact input bytes.

use bitcoin::{
    consensus::{self, encode},
    Amount, Script, Sequence, Transaction, Txid, Witness, Wtxid,
};

use crate::{
    errors::{TxError, TxResult},
    utxo::UtxoRef,
};

/// An unsigned (or partially signed) transaction produced by an external template producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionTemplate {
    tx: Transaction,
}

/// A borrowed view of one input of a [`TransactionTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateInput<'tx> {
    /// Position of the input in the template.
    pub index: usize,

    /// The output this input spends, exactly as serialized in the template.
    pub prev_ref: UtxoRef,

    /// The input's sequence number.
    pub sequence: Sequence,

    /// The witness the template already carries for this input, if any.
    pub existing_witness: Option<&'tx Witness>,
}

/// A borrowed view of one output of a [`TransactionTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOutput<'tx> {
    /// The value locked in the output.
    pub value: Amount,

    /// The locking script of the output.
    pub script: &'tx Script,
}

impl TransactionTemplate {
    /// Decodes a consensus-encoded transaction.
    pub fn decode(bytes: &[u8]) -> TxResult<Self> {
        let tx: Transaction = consensus::deserialize(bytes)
            .map_err(|e| TxError::MalformedTransaction(e.to_string()))?;

        Ok(Self { tx })
    }

    /// Decodes a hex-encoded transaction.
    pub fn decode_hex(hex: &str) -> TxResult<Self> {
        let tx: Transaction = encode::deserialize_hex(hex.trim())
            .map_err(|e| TxError::MalformedTransaction(e.to_string()))?;

        Ok(Self { tx })
    }

    /// Consensus-encodes the template.
    pub fn encode(&self) -> Vec<u8> {
        consensus::serialize(&self.tx)
    }

    /// The txid of the template. Witness data does not contribute to it.
    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    /// Iterates over the inputs in order.
    pub fn inputs(&self) -> impl ExactSizeIterator<Item = TemplateInput<'_>> + '_ {
        self.tx
            .input
            .iter()
            .enumerate()
            .map(|(index, txin)| TemplateInput {
                index,
                prev_ref: txin.previous_output.into(),
                sequence: txin.sequence,
                existing_witness: (!txin.witness.is_empty()).then_some(&txin.witness),
            })
    }

    /// Iterates over the outputs in order.
    pub fn outputs(&self) -> impl ExactSizeIterator<Item = TemplateOutput<'_>> + '_ {
        self.tx.output.iter().map(|txout| TemplateOutput {
            value: txout.value,
            script: txout.script_pubkey.as_script(),
        })
    }

    /// The underlying transaction.
    pub const fn as_tx(&self) -> &Transaction {
        &self.tx
    }
}

impl From<Transaction> for TransactionTemplate {
    fn from(tx: Transaction) -> Self {
        Self { tx }
    }
}

/// A transaction in which every input carries a non-empty witness.
///
/// The only way to obtain one is through [`FinalizedTransaction::new`], which enforces that
/// invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTransaction {
    tx: Transaction,
}

impl FinalizedTransaction {
    /// Wraps `tx` after checking that no input lacks a witness.
    pub fn new(tx: Transaction) -> TxResult<Self> {
        if let Some(index) = tx.input.iter().position(|txin| txin.witness.is_empty()) {
            return Err(TxError::IncompleteWitness {
                txid: tx.compute_txid(),
                index,
            });
        }

        Ok(Self { tx })
    }

    /// Consensus-encodes the transaction, witnesses included.
    pub fn encode(&self) -> Vec<u8> {
        consensus::serialize(&self.tx)
    }

    /// Hex-encodes the transaction, witnesses included.
    pub fn encode_hex(&self) -> String {
        encode::serialize_hex(&self.tx)
    }

    /// The txid of the transaction.
    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    /// The wtxid of the transaction.
    pub fn wtxid(&self) -> Wtxid {
        self.tx.compute_wtxid()
    }

    /// The underlying transaction.
    pub const fn as_tx(&self) -> &Transaction {
        &self.tx
    }
}

impl AsRef<Transaction> for FinalizedTransaction {
    fn as_ref(&self) -> &Transaction {
        &self.tx
    }
}
