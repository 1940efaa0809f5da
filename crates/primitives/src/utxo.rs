//! Identifiers and provenance of the outputs a package spends.

use std::{fmt, str::FromStr};

use bitcoin::{hashes::Hash, Amount, OutPoint, Txid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference to a spendable output: the transaction that created it and its output index.
///
/// Transaction identifiers are displayed byte-reversed relative to their serialized form, and the
/// producers of templates and of references do not agree on a single convention. Comparisons
/// against decoded inputs therefore go through [`UtxoRef::matches`], which accepts both orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UtxoRef {
    /// The identifier of the transaction that created the output.
    pub txid: Txid,

    /// The index of the output in that transaction.
    pub vout: u32,
}

impl UtxoRef {
    /// Creates a new reference.
    pub const fn new(txid: Txid, vout: u32) -> Self {
        Self { txid, vout }
    }

    /// Returns the same reference with the identifier bytes in the opposite order.
    pub fn byte_reversed(&self) -> Self {
        let mut bytes = self.txid.to_byte_array();
        bytes.reverse();

        Self {
            txid: Txid::from_byte_array(bytes),
            vout: self.vout,
        }
    }

    /// Both serializations of the identifier, stored order first.
    pub fn txid_candidates(&self) -> [Txid; 2] {
        [self.txid, self.byte_reversed().txid]
    }

    /// Whether `txid` names the same transaction as this reference, in either byte order.
    pub fn matches_txid(&self, txid: &Txid) -> bool {
        self.txid_candidates().contains(txid)
    }

    /// Whether `outpoint` names the same output as this reference, in either byte order.
    pub fn matches(&self, outpoint: &OutPoint) -> bool {
        self.vout == outpoint.vout && self.matches_txid(&outpoint.txid)
    }

    /// Converts this reference into an [`OutPoint`] without reinterpreting the identifier.
    pub const fn to_outpoint(self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

impl From<OutPoint> for UtxoRef {
    fn from(outpoint: OutPoint) -> Self {
        Self::new(outpoint.txid, outpoint.vout)
    }
}

impl fmt::Display for UtxoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Errors that occur while parsing a `<txid>:<vout>` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseUtxoRefError {
    /// The string has no `:` separating identifier and index.
    #[error("missing ':' separator in {0:?}")]
    MissingSeparator(String),

    /// The identifier is not 32 bytes of hex.
    #[error("invalid txid {0:?}")]
    InvalidTxid(String),

    /// The output index is not a `u32`.
    #[error("invalid vout {0:?}")]
    InvalidVout(String),
}

impl FromStr for UtxoRef {
    type Err = ParseUtxoRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, vout) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ParseUtxoRefError::MissingSeparator(s.to_string()))?;

        // hex producers disagree on case as well
        let txid = Txid::from_str(&txid.to_ascii_lowercase())
            .map_err(|_| ParseUtxoRefError::InvalidTxid(txid.to_string()))?;
        let vout = vout
            .parse::<u32>()
            .map_err(|_| ParseUtxoRefError::InvalidVout(vout.to_string()))?;

        Ok(Self { txid, vout })
    }
}

impl TryFrom<String> for UtxoRef {
    type Error = ParseUtxoRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UtxoRef> for String {
    fn from(value: UtxoRef) -> Self {
        value.to_string()
    }
}

/// Raw provenance for a UTXO as supplied by a provenance source.
///
/// `value` is informational only. The spendable value and locking script are always derived
/// from `parent_raw_tx` by [`resolve`](crate::provenance::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoProvenance {
    /// The output this provenance describes.
    pub utxo: UtxoRef,

    /// The value the source claims the output holds.
    #[serde(rename = "value_sats", with = "bitcoin::amount::serde::as_sat")]
    pub value: Amount,

    /// The consensus-encoded transaction that created the output.
    #[serde(with = "hex")]
    pub parent_raw_tx: Vec<u8>,
}

impl UtxoProvenance {
    /// Creates a new provenance record.
    pub const fn new(utxo: UtxoRef, value: Amount, parent_raw_tx: Vec<u8>) -> Self {
        Self {
            utxo,
            value,
            parent_raw_tx,
        }
    }
}
