//! Deterministic keys, scripts and transactions.

use bitcoin::{
    absolute, hashes::Hash, transaction::Version, Amount, CompressedPublicKey, OutPoint, ScriptBuf,
    Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use secp256k1::{Keypair, SecretKey, SECP256K1};
use spell_package_primitives::{
    codec::TransactionTemplate,
    utxo::{UtxoProvenance, UtxoRef},
};

/// Derives a keypair from a non-zero `seed`.
pub fn keypair(seed: u8) -> Keypair {
    let sk = SecretKey::from_slice(&[seed; 32]).expect("seed must be a valid secret key");

    Keypair::from_secret_key(SECP256K1, &sk)
}

/// The taproot key-path output script of `keypair`, without a script tree.
pub fn p2tr_script(keypair: &Keypair) -> ScriptBuf {
    let (internal_key, _parity) = keypair.x_only_public_key();

    ScriptBuf::new_p2tr(SECP256K1, internal_key, None)
}

/// The P2WPKH output script of `keypair`.
pub fn p2wpkh_script(keypair: &Keypair) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&CompressedPublicKey(keypair.public_key()).wpubkey_hash())
}

/// A transaction paying `outputs`, made unique by `nonce`.
pub fn parent_tx(nonce: u8, outputs: &[TxOut]) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: absolute::LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from_byte_array([nonce; 32]), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::from_slice(&[[nonce; 64]]),
        }],
        output: outputs.to_vec(),
    }
}

/// Provenance of output `vout` of `parent`, claiming the value the parent actually pays.
pub fn provenance(parent: &Transaction, vout: u32) -> UtxoProvenance {
    let value = parent
        .output
        .get(vout as usize)
        .map_or(Amount::ZERO, |txout| txout.value);

    UtxoProvenance::new(
        UtxoRef::new(parent.compute_txid(), vout),
        value,
        bitcoin::consensus::serialize(parent),
    )
}

/// A template spending `inputs` (with their existing witnesses) and paying `outputs`.
pub fn template(inputs: &[(OutPoint, Witness)], outputs: &[TxOut]) -> TransactionTemplate {
    let input = inputs
        .iter()
        .map(|(previous_output, witness)| TxIn {
            previous_output: *previous_output,
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: witness.clone(),
        })
        .collect();

    TransactionTemplate::from(Transaction {
        version: Version::TWO,
        lock_time: absolute::LockTime::ZERO,
        input,
        output: outputs.to_vec(),
    })
}
