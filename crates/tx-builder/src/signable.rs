//! Signer-ready PSBTs built from classified templates.

use std::collections::{BTreeMap, BTreeSet};

use bitcoin::{
    bip32::{DerivationPath, Fingerprint},
    psbt, Psbt, Script, Transaction, TxOut, Txid, Witness,
};
use spell_package_primitives::{
    codec::{FinalizedTransaction, TransactionTemplate},
    errors::TxError,
    provenance::ResolvedOutput,
};
use spell_package_signer::{SignRequest, SignedInputs, SigningPhase};
use tracing::debug;

use crate::{
    classify::{classify, InputRole},
    context::{SignerKey, SigningContext},
    errors::{BuildError, BuildResult},
    finalize,
};

/// A template with every input classified and described, ready to be sent to a signer.
///
/// Pre-satisfied inputs carry their template witness as `final_script_witness` and are never
/// part of a signing request. The transaction is rebuilt from the template in
/// [`SignableTemplate::finalize`], so the output set and input order are exactly the template's.
#[derive(Debug, Clone, PartialEq)]
pub struct SignableTemplate {
    /// The partially signed bitcoin transaction.
    psbt: Psbt,

    /// The template as received, existing witnesses included.
    template: Transaction,

    /// Role of each input, by index.
    roles: Vec<InputRole>,

    /// The prevouts for sighash computation.
    prevouts: Vec<TxOut>,

    /// Index of the signing target.
    target_index: usize,

    /// Witnesses captured from the template, by index.
    preserved: BTreeMap<usize, Witness>,

    /// Inputs to request signatures for.
    signing: BTreeSet<usize>,

    /// Key material attached to signed inputs.
    signer_key: SignerKey,
}

/// Builds a [`SignableTemplate`] from `template`, requesting a signature for the input that
/// spends `target`.
///
/// See [`classify`] for how inputs are matched. Outputs are never touched.
pub fn build(
    template: &TransactionTemplate,
    target: &ResolvedOutput,
    ctx: &SigningContext,
) -> BuildResult<SignableTemplate> {
    let classified = classify(template, target, ctx)?;

    if let Some(txin) = template
        .as_tx()
        .input
        .iter()
        .position(|txin| !txin.script_sig.is_empty())
    {
        return Err(BuildError::UnsupportedInput {
            index: txin,
            reason: "non-empty script_sig, only witness spends are supported".to_string(),
        });
    }

    let mut unsigned = template.as_tx().clone();
    unsigned
        .input
        .iter_mut()
        .for_each(|txin| txin.witness = Witness::new());

    let mut psbt = Psbt::from_unsigned_tx(unsigned)
        .map_err(|e| TxError::MalformedTransaction(e.to_string()))?;

    let signer_key = ctx.signer_key();
    let mut roles = Vec::with_capacity(classified.len());
    let mut prevouts = Vec::with_capacity(classified.len());
    let mut preserved = BTreeMap::new();
    let mut signing = BTreeSet::new();
    let mut target_index = 0;

    for input in classified {
        let txout = input.prevout.to_txout();
        let psbt_input = &mut psbt.inputs[input.index];
        psbt_input.witness_utxo = Some(txout.clone());

        if input.role == InputRole::SigningTarget {
            target_index = input.index;
        }

        match input.existing_witness {
            Some(witness) => {
                psbt_input.final_script_witness = Some(witness.clone());
                preserved.insert(input.index, witness);
            }
            None if input.role == InputRole::SigningTarget => {
                attach_key_context(psbt_input, &txout.script_pubkey, signer_key);
                signing.insert(input.index);
            }
            None => {}
        }

        roles.push(input.role);
        prevouts.push(txout);
    }

    debug!(
        txid = %psbt.unsigned_tx.compute_txid(),
        %target_index,
        ?signing,
        preserved = ?preserved.keys().collect::<Vec<_>>(),
        "built signable template"
    );

    Ok(SignableTemplate {
        psbt,
        template: template.as_tx().clone(),
        roles,
        prevouts,
        target_index,
        preserved,
        signing,
        signer_key,
    })
}

/// Sets the key context a signer needs to recognize `input` as its own.
fn attach_key_context(input: &mut psbt::Input, script: &Script, key: SignerKey) {
    if script.is_p2tr() {
        input.tap_internal_key = Some(key.x_only());
    } else if let Some(pk) = key.full() {
        input
            .bip32_derivation
            .insert(pk, (Fingerprint::from([0u8; 4]), DerivationPath::master()));
    }
}

impl SignableTemplate {
    /// Additionally requests signatures for inputs with `role` that carry no witness yet.
    pub fn with_co_signed(mut self, role: InputRole) -> Self {
        for (index, input_role) in self.roles.iter().enumerate() {
            if *input_role == role && !self.preserved.contains_key(&index) {
                attach_key_context(
                    &mut self.psbt.inputs[index],
                    &self.prevouts[index].script_pubkey,
                    self.signer_key,
                );
                self.signing.insert(index);
            }
        }

        self
    }

    /// The PSBT sent to the signer.
    pub const fn psbt(&self) -> &Psbt {
        &self.psbt
    }

    /// The role of each input, by index.
    pub fn roles(&self) -> &[InputRole] {
        &self.roles
    }

    /// The outputs spent by each input, by index.
    pub fn prevouts(&self) -> &[TxOut] {
        &self.prevouts
    }

    /// The index of the signing target.
    pub const fn target_index(&self) -> usize {
        self.target_index
    }

    /// The inputs a signing request covers, in ascending order.
    pub fn signing_indices(&self) -> Vec<usize> {
        self.signing.iter().copied().collect()
    }

    /// The witnesses captured from the template, by index.
    pub const fn preserved(&self) -> &BTreeMap<usize, Witness> {
        &self.preserved
    }

    /// The txid of the template. Signing does not change it.
    pub fn txid(&self) -> Txid {
        self.psbt.unsigned_tx.compute_txid()
    }

    /// A signing request for this template.
    pub fn sign_request(&self, phase: SigningPhase) -> SignRequest {
        SignRequest {
            phase,
            psbt: self.psbt.clone(),
            indices: self.signing_indices(),
        }
    }

    /// Attaches the signer's material to the requested inputs and the captured witnesses to the
    /// pre-satisfied ones.
    ///
    /// Fails with [`TxError::IncompleteWitness`] if any input is still unauthenticated
    /// afterwards, so a transaction with a missing witness is never returned.
    pub fn finalize(self, signed: SignedInputs) -> BuildResult<FinalizedTransaction> {
        let witnesses = match signed {
            SignedInputs::Psbt(psbt) => finalize::from_psbt(&self.psbt, &psbt, &self.signing)?,
            SignedInputs::Witnesses(witnesses) => {
                finalize::from_witnesses(self.template.input.len(), witnesses, &self.signing)?
            }
        };

        let mut tx = self.template;
        for (index, witness) in witnesses {
            tx.input[index].witness = witness;
        }
        for (index, witness) in self.preserved {
            tx.input[index].witness = witness;
        }

        Ok(FinalizedTransaction::new(tx)?)
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::{hashes::Hash, OutPoint, Txid};
    use spell_package_primitives::errors::TxError;
    use spell_package_signer::{KeypairSigner, SignedInputs};
    use spell_package_test_utils::{template, PackageFixture};

    use super::*;
    use crate::test_support::{context, context_after_commit};

    #[test]
    fn commit_template_requests_funding_signature() {
        let fixture = PackageFixture::scenario_a();
        let ctx = context(&fixture);

        let signable = build(&fixture.commit, ctx.funding(), &ctx).unwrap();

        assert_eq!(signable.signing_indices(), vec![0]);
        assert_eq!(signable.txid(), fixture.commit.txid());
        assert_eq!(
            signable.psbt().inputs[0].witness_utxo,
            Some(ctx.funding().to_txout())
        );
        assert_eq!(
            signable.psbt().inputs[0].tap_internal_key,
            Some(fixture.public_key().x_only_public_key().0)
        );
        assert_eq!(signable.psbt().unsigned_tx.output, fixture.commit.as_tx().output);
    }

    #[test]
    fn presatisfied_input_is_never_requested() {
        let fixture = PackageFixture::scenario_b();
        let ctx = context_after_commit(&fixture);

        let signable = build(&fixture.spell, ctx.anchor(), &ctx)
            .unwrap()
            .with_co_signed(InputRole::PriorPhaseOutput);

        assert_eq!(signable.signing_indices(), vec![0]);
        assert_eq!(signable.preserved()[&1], fixture.proof_witness());
        assert_eq!(
            signable.psbt().inputs[1].final_script_witness,
            Some(fixture.proof_witness())
        );
        assert!(signable.psbt().unsigned_tx.input[1].witness.is_empty());
    }

    #[test]
    fn co_signing_adds_the_commit_spend() {
        let fixture = PackageFixture::scenario_a();
        let ctx = context_after_commit(&fixture);

        let signable = build(&fixture.spell, ctx.anchor(), &ctx).unwrap();
        assert_eq!(signable.signing_indices(), vec![1]);

        let signable = signable.with_co_signed(InputRole::PriorPhaseOutput);
        assert_eq!(signable.signing_indices(), vec![0, 1]);
        assert_eq!(signable.target_index(), 1);
    }

    #[test]
    fn script_sig_is_unsupported() {
        let fixture = PackageFixture::scenario_a();
        let ctx = context(&fixture);
        let mut tx = fixture.commit.as_tx().clone();
        tx.input[0].script_sig = bitcoin::ScriptBuf::from_bytes(vec![0x51]);

        assert!(matches!(
            build(&TransactionTemplate::from(tx), ctx.funding(), &ctx),
            Err(BuildError::UnsupportedInput { index: 0, .. })
        ));
    }

    #[test]
    fn keypair_signature_finalizes_commit() {
        let fixture = PackageFixture::scenario_a();
        let ctx = context(&fixture);
        let signable = build(&fixture.commit, ctx.funding(), &ctx).unwrap();

        let mut psbt = signable.psbt().clone();
        KeypairSigner::new(fixture.keypair)
            .sign_psbt(&mut psbt, &signable.signing_indices())
            .unwrap();

        let finalized = signable.finalize(SignedInputs::Psbt(psbt)).unwrap();
        assert_eq!(finalized.txid(), fixture.commit.txid());
        assert_eq!(finalized.as_tx().input[0].witness.len(), 1);
        assert_eq!(finalized.as_tx().input[0].witness[0].len(), 64);
    }

    #[test]
    fn preserved_witness_survives_finalization() {
        let fixture = PackageFixture::scenario_b();
        let ctx = context_after_commit(&fixture);
        let signable = build(&fixture.spell, ctx.anchor(), &ctx).unwrap();

        let mut psbt = signable.psbt().clone();
        KeypairSigner::new(fixture.keypair)
            .sign_psbt(&mut psbt, &signable.signing_indices())
            .unwrap();

        let finalized = signable.finalize(SignedInputs::Psbt(psbt)).unwrap();
        assert_eq!(finalized.as_tx().input[1].witness, fixture.proof_witness());
        assert_eq!(finalized.txid(), fixture.spell.txid());
    }

    #[test]
    fn response_without_target_signature_is_incomplete() {
        let fixture = PackageFixture::scenario_b();
        let ctx = context_after_commit(&fixture);
        let signable = build(&fixture.spell, ctx.anchor(), &ctx).unwrap();
        let psbt = signable.psbt().clone();

        assert_eq!(
            signable.finalize(SignedInputs::Psbt(psbt)).unwrap_err(),
            BuildError::Tx(TxError::IncompleteWitness {
                txid: fixture.spell.txid(),
                index: 0,
            })
        );
    }

    #[test]
    fn unrequested_witness_is_ignored() {
        let fixture = PackageFixture::scenario_a();
        let ctx = context_after_commit(&fixture);
        let signable = build(&fixture.spell, ctx.anchor(), &ctx).unwrap();

        let witnesses = [
            (0, Witness::from_slice(&[[1u8; 64]])),
            (1, Witness::from_slice(&[[2u8; 64]])),
        ]
        .into_iter()
        .collect();

        assert!(matches!(
            signable.finalize(SignedInputs::Witnesses(witnesses)),
            Err(BuildError::Tx(TxError::IncompleteWitness { index: 0, .. }))
        ));
    }

    #[test]
    fn psbt_for_another_transaction_is_invalid() {
        let fixture = PackageFixture::scenario_a();
        let ctx = context(&fixture);
        let signable = build(&fixture.commit, ctx.funding(), &ctx).unwrap();

        let other = template(
            &[(
                OutPoint::new(Txid::from_byte_array([9; 32]), 0),
                Witness::new(),
            )],
            &fixture.spell_outputs(),
        );
        let psbt = Psbt::from_unsigned_tx(other.as_tx().clone()).unwrap();

        assert!(matches!(
            signable.finalize(SignedInputs::Psbt(psbt)),
            Err(BuildError::InvalidSignerResponse(_))
        ));
    }
}
