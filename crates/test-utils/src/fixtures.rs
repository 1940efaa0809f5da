//! A complete commit/spell package over deterministic UTXOs.

use bitcoin::{Amount, OutPoint, Transaction, TxOut, Witness};
use secp256k1::{Keypair, PublicKey};
use spell_package_primitives::{
    codec::{FinalizedTransaction, TransactionTemplate},
    utxo::UtxoProvenance,
};

use crate::bitcoin::{keypair, p2tr_script, p2wpkh_script, parent_tx, provenance, template};

/// Value of the anchor UTXO.
pub const ANCHOR_VALUE: Amount = Amount::from_sat(500);
/// Value of the funding UTXO.
pub const FUNDING_VALUE: Amount = Amount::from_sat(2_000);
/// Value of the commit output.
pub const COMMIT_VALUE: Amount = Amount::from_sat(1_500);
/// Value paid by the spell.
pub const SPELL_VALUE: Amount = Amount::from_sat(1_800);

/// Templates and provenance for one package, all locked to a single signer key.
///
/// The anchor is output 0 of its parent and the funding output 1 of its parent. The commit
/// spends the funding and pays [`COMMIT_VALUE`] back to the signer. The spell spends the commit
/// output and the anchor.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    /// The signer's keypair.
    pub keypair: Keypair,

    /// The transaction that created the anchor.
    pub anchor_parent: Transaction,

    /// The transaction that created the funding UTXO.
    pub funding_parent: Transaction,

    /// Provenance of the anchor.
    pub anchor: UtxoProvenance,

    /// Provenance of the funding UTXO.
    pub funding: UtxoProvenance,

    /// The unsigned commit template.
    pub commit: TransactionTemplate,

    /// The spell template.
    pub spell: TransactionTemplate,
}

impl PackageFixture {
    /// Spell inputs are `[commit:0, anchor]`, neither witnessed, so the commit spend must be
    /// co-signed.
    pub fn scenario_a() -> Self {
        let fixture = Self::base();
        let inputs = [
            (fixture.commit_outpoint(), Witness::new()),
            (fixture.anchor_outpoint(), Witness::new()),
        ];

        fixture.with_spell(&inputs)
    }

    /// Spell inputs are `[anchor, commit:0]`, the commit spend carrying a 64-byte proof witness.
    pub fn scenario_b() -> Self {
        let fixture = Self::base();
        let inputs = [
            (fixture.anchor_outpoint(), Witness::new()),
            (fixture.commit_outpoint(), fixture.proof_witness()),
        ];

        fixture.with_spell(&inputs)
    }

    fn base() -> Self {
        let stranger = keypair(0x22);
        let keypair = keypair(0x11);

        let anchor_parent = parent_tx(
            1,
            &[TxOut {
                value: ANCHOR_VALUE,
                script_pubkey: p2tr_script(&keypair),
            }],
        );
        let funding_parent = parent_tx(
            2,
            &[
                TxOut {
                    value: Amount::from_sat(700),
                    script_pubkey: p2wpkh_script(&stranger),
                },
                TxOut {
                    value: FUNDING_VALUE,
                    script_pubkey: p2tr_script(&keypair),
                },
            ],
        );

        let anchor = provenance(&anchor_parent, 0);
        let funding = provenance(&funding_parent, 1);

        let commit = template(
            &[(funding.utxo.to_outpoint(), Witness::new())],
            &[TxOut {
                value: COMMIT_VALUE,
                script_pubkey: p2tr_script(&keypair),
            }],
        );

        Self {
            keypair,
            anchor_parent,
            funding_parent,
            anchor,
            funding,
            spell: commit.clone(),
            commit,
        }
    }

    /// Replaces the spell with one spending `inputs` and paying [`Self::spell_outputs`].
    pub fn with_spell(mut self, inputs: &[(OutPoint, Witness)]) -> Self {
        self.spell = template(inputs, &self.spell_outputs());
        self
    }

    /// The signer's public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// The anchor UTXO.
    pub fn anchor_outpoint(&self) -> OutPoint {
        self.anchor.utxo.to_outpoint()
    }

    /// The funding UTXO.
    pub fn funding_outpoint(&self) -> OutPoint {
        self.funding.utxo.to_outpoint()
    }

    /// Output 0 of the commit.
    pub fn commit_outpoint(&self) -> OutPoint {
        OutPoint::new(self.commit.txid(), 0)
    }

    /// The outputs of the spell.
    pub fn spell_outputs(&self) -> Vec<TxOut> {
        vec![TxOut {
            value: SPELL_VALUE,
            script_pubkey: p2wpkh_script(&keypair(0x22)),
        }]
    }

    /// The opaque proof witness carried by the commit spend in [`Self::scenario_b`].
    pub fn proof_witness(&self) -> Witness {
        Witness::from_slice(&[[0xab; 64]])
    }

    /// The commit with a placeholder witness on its funding input.
    pub fn witnessed_commit(&self) -> FinalizedTransaction {
        let mut tx = self.commit.as_tx().clone();
        tx.input[0].witness = Witness::from_slice(&[[0xcd; 64]]);

        FinalizedTransaction::new(tx).expect("every input is witnessed")
    }
}
