//! In-memory signer backed by a single keypair.

use bitcoin::{
    ecdsa,
    hashes::Hash,
    key::TapTweak,
    sighash::{EcdsaSighashType, Prevouts, SighashCache},
    taproot, CompressedPublicKey, Psbt, ScriptBuf, TapSighashType, TxOut,
};
use secp256k1::{Keypair, Message, SECP256K1};
use tracing::{debug, warn};

use crate::{
    errors::{SignerError, SignerResult},
    traits::{ExternalSigner, SignRequest, SignedInputs, SignerResponse},
};

/// Signs taproot key-path and P2WPKH inputs locked to one key.
///
/// Inputs locked to any other script are left untouched.
#[derive(Debug, Clone)]
pub struct KeypairSigner {
    /// Keypair for signing messages.
    keypair: Keypair,
}

impl KeypairSigner {
    /// Creates a new signer for `keypair`.
    pub const fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// The compressed public key of the signer.
    pub fn public_key(&self) -> secp256k1::PublicKey {
        self.keypair.public_key()
    }

    /// The taproot key-path output script for this key.
    pub fn p2tr_script(&self) -> ScriptBuf {
        let (internal_key, _parity) = self.keypair.x_only_public_key();
        ScriptBuf::new_p2tr(SECP256K1, internal_key, None)
    }

    /// The P2WPKH output script for this key.
    pub fn p2wpkh_script(&self) -> ScriptBuf {
        ScriptBuf::new_p2wpkh(&CompressedPublicKey(self.keypair.public_key()).wpubkey_hash())
    }

    /// Signs `indices` of `psbt` in place.
    pub fn sign_psbt(&self, psbt: &mut Psbt, indices: &[usize]) -> SignerResult<()> {
        let prevouts = psbt
            .inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                input.witness_utxo.clone().ok_or_else(|| {
                    SignerError::InvalidRequest(format!("input {index} has no witness utxo"))
                })
            })
            .collect::<SignerResult<Vec<TxOut>>>()?;

        let p2tr = self.p2tr_script();
        let p2wpkh = self.p2wpkh_script();
        let mut cache = SighashCache::new(&psbt.unsigned_tx);

        for &index in indices {
            let prevout = prevouts.get(index).ok_or_else(|| {
                SignerError::InvalidRequest(format!("input {index} does not exist"))
            })?;

            if prevout.script_pubkey == p2tr {
                let sighash = cache
                    .taproot_key_spend_signature_hash(
                        index,
                        &Prevouts::All(&prevouts),
                        TapSighashType::Default,
                    )
                    .map_err(|e| SignerError::InvalidRequest(e.to_string()))?;
                let message = Message::from_digest(sighash.to_raw_hash().to_byte_array());

                let signature = self
                    .keypair
                    .tap_tweak(SECP256K1, None)
                    .to_keypair()
                    .sign_schnorr(message);

                psbt.inputs[index].tap_key_sig = Some(taproot::Signature {
                    signature,
                    sighash_type: TapSighashType::Default,
                });
                debug!(%index, "signed taproot key-path input");
            } else if prevout.script_pubkey == p2wpkh {
                let sighash = cache
                    .p2wpkh_signature_hash(
                        index,
                        &prevout.script_pubkey,
                        prevout.value,
                        EcdsaSighashType::All,
                    )
                    .map_err(|e| SignerError::InvalidRequest(e.to_string()))?;
                let message = Message::from_digest(sighash.to_raw_hash().to_byte_array());

                let signature = SECP256K1.sign_ecdsa(&message, &self.keypair.secret_key());

                psbt.inputs[index].partial_sigs.insert(
                    bitcoin::PublicKey::new(self.keypair.public_key()),
                    ecdsa::Signature {
                        signature,
                        sighash_type: EcdsaSighashType::All,
                    },
                );
                debug!(%index, "signed p2wpkh input");
            } else {
                warn!(
                    %index,
                    script = %prevout.script_pubkey,
                    "input is not locked to this key, skipping"
                );
            }
        }

        Ok(())
    }
}

impl ExternalSigner for KeypairSigner {
    async fn sign(&self, request: SignRequest) -> SignerResult<SignerResponse> {
        let SignRequest {
            phase,
            mut psbt,
            indices,
        } = request;

        debug!(%phase, ?indices, "signing with in-memory keypair");
        self.sign_psbt(&mut psbt, &indices)?;

        Ok(SignerResponse::Signed(SignedInputs::Psbt(psbt)))
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{
        absolute, hashes::Hash, transaction, Amount, OutPoint, Transaction, TxIn, Txid,
    };
    use secp256k1::SecretKey;

    use super::*;
    use crate::traits::SigningPhase;

    fn signer() -> KeypairSigner {
        let sk = SecretKey::from_slice(&[0x11; 32]).expect("valid secret key");
        KeypairSigner::new(Keypair::from_secret_key(SECP256K1, &sk))
    }

    fn psbt_spending(scripts: &[ScriptBuf]) -> Psbt {
        let tx = Transaction {
            version: transaction::Version::TWO,
            lock_time: absolute::LockTime::ZERO,
            input: (0..scripts.len())
                .map(|i| TxIn {
                    previous_output: OutPoint::new(Txid::from_byte_array([i as u8; 32]), 0),
                    ..Default::default()
                })
                .collect(),
            output: vec![TxOut {
                value: Amount::from_sat(900),
                script_pubkey: ScriptBuf::from_bytes(vec![0x6a]),
            }],
        };

        let mut psbt = Psbt::from_unsigned_tx(tx).expect("witness should be empty");
        for (input, script) in psbt.inputs.iter_mut().zip(scripts) {
            input.witness_utxo = Some(TxOut {
                value: Amount::from_sat(1_000),
                script_pubkey: script.clone(),
            });
        }

        psbt
    }

    #[tokio::test]
    async fn signs_only_requested_inputs_it_owns() {
        let signer = signer();
        let foreign = ScriptBuf::from_bytes(vec![0x51]);
        let psbt = psbt_spending(&[signer.p2tr_script(), signer.p2wpkh_script(), foreign]);

        let response = signer
            .sign(SignRequest {
                phase: SigningPhase::Commit,
                psbt,
                indices: vec![0, 1, 2],
            })
            .await
            .unwrap();

        let SignerResponse::Signed(SignedInputs::Psbt(signed)) = response else {
            panic!("expected a signed psbt");
        };
        assert!(signed.inputs[0].tap_key_sig.is_some());
        assert_eq!(signed.inputs[1].partial_sigs.len(), 1);
        assert!(signed.inputs[2].tap_key_sig.is_none());
        assert!(signed.inputs[2].partial_sigs.is_empty());
    }

    #[test]
    fn taproot_signature_verifies_against_output_key() {
        let signer = signer();
        let mut psbt = psbt_spending(&[signer.p2tr_script()]);
        signer.sign_psbt(&mut psbt, &[0]).unwrap();

        let prevouts = vec![psbt.inputs[0].witness_utxo.clone().unwrap()];
        let sighash = SighashCache::new(&psbt.unsigned_tx)
            .taproot_key_spend_signature_hash(
                0,
                &Prevouts::All(&prevouts),
                TapSighashType::Default,
            )
            .unwrap();
        let message = Message::from_digest(sighash.to_raw_hash().to_byte_array());
        let (output_key, _parity) = signer
            .keypair
            .tap_tweak(SECP256K1, None)
            .to_keypair()
            .x_only_public_key();

        let signature = psbt.inputs[0].tap_key_sig.as_ref().unwrap().signature;
        assert!(SECP256K1
            .verify_schnorr(&signature, &message, &output_key)
            .is_ok());
    }

    #[test]
    fn missing_witness_utxo_is_an_invalid_request() {
        let signer = signer();
        let mut psbt = psbt_spending(&[signer.p2tr_script()]);
        psbt.inputs[0].witness_utxo = None;

        assert!(matches!(
            signer.sign_psbt(&mut psbt, &[0]),
            Err(SignerError::InvalidRequest(_))
        ));
    }
}
