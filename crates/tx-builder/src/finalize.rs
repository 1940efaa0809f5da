//! Extraction of witnesses from a signer's material.

use std::collections::{BTreeMap, BTreeSet};

use bitcoin::{psbt, taproot::TapLeafHash, Psbt, Witness};
use tracing::{trace, warn};

use crate::errors::{BuildError, BuildResult};

/// Extracts witnesses for `signing` from a PSBT returned by the signer.
///
/// The returned PSBT must describe the same unsigned transaction as `requested`. Inputs without
/// any usable signature are simply absent from the result.
pub(crate) fn from_psbt(
    requested: &Psbt,
    signed: &Psbt,
    signing: &BTreeSet<usize>,
) -> BuildResult<BTreeMap<usize, Witness>> {
    let requested_txid = requested.unsigned_tx.compute_txid();
    let signed_txid = signed.unsigned_tx.compute_txid();
    if requested_txid != signed_txid || signed.inputs.len() != requested.inputs.len() {
        return Err(BuildError::InvalidSignerResponse(format!(
            "signed psbt describes {signed_txid}, expected {requested_txid}"
        )));
    }

    Ok(signing
        .iter()
        .filter_map(|&index| witness_for(&signed.inputs[index]).map(|witness| (index, witness)))
        .collect())
}

/// Keeps the witnesses for `signing` out of those returned by the signer.
pub(crate) fn from_witnesses(
    n_inputs: usize,
    witnesses: BTreeMap<usize, Witness>,
    signing: &BTreeSet<usize>,
) -> BuildResult<BTreeMap<usize, Witness>> {
    if let Some(index) = witnesses.keys().find(|index| **index >= n_inputs) {
        return Err(BuildError::InvalidSignerResponse(format!(
            "witness for input {index}, transaction has {n_inputs} inputs"
        )));
    }

    Ok(witnesses
        .into_iter()
        .filter(|(index, witness)| {
            let keep = signing.contains(index) && !witness.is_empty();
            if !keep {
                warn!(%index, "ignoring witness for an input that was not requested");
            }
            keep
        })
        .collect())
}

/// Picks the witness for a single signed input.
///
/// In order of preference: the taproot key-path signature, the first taproot script-path
/// signature (with its leaf script and control block when the PSBT carries them), the first
/// ECDSA signature as a P2WPKH witness, and finally a witness the signer finalized itself.
fn witness_for(input: &psbt::Input) -> Option<Witness> {
    if let Some(signature) = &input.tap_key_sig {
        trace!("using taproot key-path signature");
        return Some(Witness::p2tr_key_spend(signature));
    }

    if let Some(((_, leaf_hash), signature)) = input.tap_script_sigs.iter().next() {
        trace!(%leaf_hash, "using taproot script-path signature");
        let mut witness = Witness::p2tr_key_spend(signature);

        let leaf = input.tap_scripts.iter().find(|(_, (script, version))| {
            TapLeafHash::from_script(script, *version) == *leaf_hash
        });
        if let Some((control_block, (script, _))) = leaf {
            witness.push(script.as_bytes());
            witness.push(control_block.serialize());
        }

        return Some(witness);
    }

    if let Some((pubkey, signature)) = input.partial_sigs.iter().next() {
        trace!(%pubkey, "using ecdsa signature");
        return Some(Witness::p2wpkh(signature, &pubkey.inner));
    }

    input
        .final_script_witness
        .clone()
        .filter(|witness| !witness.is_empty())
}
