//! Validation of the prover's answer.

use serde::Deserialize;
use spell_package_primitives::codec::TransactionTemplate;
use tracing::debug;

use crate::errors::{ProducerError, ProducerResult};

/// One transaction in the prover's answer.
///
/// Provers either wrap the hex in a chain-tagged object or return it bare.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProvedTransaction {
    /// `{"bitcoin": "<hex>"}`
    Tagged {
        /// Hex encoding of the transaction.
        bitcoin: String,
    },

    /// `"<hex>"`
    Bare(String),
}

impl ProvedTransaction {
    /// The hex encoding of the transaction.
    pub fn hex(&self) -> &str {
        match self {
            Self::Tagged { bitcoin } | Self::Bare(bitcoin) => bitcoin,
        }
    }
}

/// The body the prover answers with: the commit transaction, then the spell transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ProverResponse(pub Vec<ProvedTransaction>);

impl ProverResponse {
    /// Parses and validates a raw response body.
    pub fn parse(body: &str) -> ProducerResult<UnsignedPackage> {
        let response: Self = serde_json::from_str(body)
            .map_err(|e| ProducerError::InvalidResponse(e.to_string()))?;

        response.validate()
    }

    /// Decodes the first two entries into templates.
    ///
    /// Fewer than two entries is an error. Entries past the second are ignored.
    pub fn validate(self) -> ProducerResult<UnsignedPackage> {
        let entries = self.0.len();
        let mut txs = self.0.into_iter();

        let (Some(commit), Some(spell)) = (txs.next(), txs.next()) else {
            return Err(ProducerError::InvalidResponse(format!(
                "expected at least 2 transactions, got {entries}"
            )));
        };

        if entries > 2 {
            debug!(%entries, "ignoring extra transactions in prover response");
        }

        Ok(UnsignedPackage {
            commit: TransactionTemplate::decode_hex(commit.hex())?,
            spell: TransactionTemplate::decode_hex(spell.hex())?,
        })
    }
}

/// The unsigned templates of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedPackage {
    /// Spends the funding UTXO and creates the output the spell consumes.
    pub commit: TransactionTemplate,

    /// Spends the commit output and the anchor.
    pub spell: TransactionTemplate,
}
