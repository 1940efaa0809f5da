//! The UTXOs and key material of a single package signing attempt.

use bitcoin::secp256k1::{PublicKey, XOnlyPublicKey};
use spell_package_primitives::{
    codec::FinalizedTransaction,
    provenance::{resolve, ResolvedOutput},
    utxo::UtxoProvenance,
};
use tracing::debug;

use crate::{
    classify::InputRole,
    errors::{BuildError, BuildResult},
};

/// The signer's public key material.
///
/// A compressed key can be used for every supported script type. An x-only key only for
/// taproot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignerKey {
    /// A full, compressed public key.
    Full(PublicKey),

    /// An x-only public key.
    XOnly(XOnlyPublicKey),
}

impl SignerKey {
    /// Parses 33-byte compressed or 32-byte x-only key material.
    pub fn from_slice(bytes: &[u8]) -> BuildResult<Self> {
        match bytes.len() {
            33 => PublicKey::from_slice(bytes).map(Self::Full),
            32 => XOnlyPublicKey::from_slice(bytes).map(Self::XOnly),
            len => {
                return Err(BuildError::InvalidSignerKey(format!(
                    "expected 32 or 33 bytes, got {len}"
                )))
            }
        }
        .map_err(|e| BuildError::InvalidSignerKey(e.to_string()))
    }

    /// The key as used for taproot.
    pub fn x_only(&self) -> XOnlyPublicKey {
        match self {
            Self::Full(pk) => pk.x_only_public_key().0,
            Self::XOnly(xonly) => *xonly,
        }
    }

    /// The full key, if known.
    pub const fn full(&self) -> Option<PublicKey> {
        match self {
            Self::Full(pk) => Some(*pk),
            Self::XOnly(_) => None,
        }
    }
}

impl From<PublicKey> for SignerKey {
    fn from(pk: PublicKey) -> Self {
        Self::Full(pk)
    }
}

impl From<XOnlyPublicKey> for SignerKey {
    fn from(xonly: XOnlyPublicKey) -> Self {
        Self::XOnly(xonly)
    }
}

/// Everything known about the UTXOs a package spends.
///
/// A context belongs to exactly one signing attempt. It is deliberately not [`Clone`]: once an
/// attempt ends, its context is dropped along with anything signed under it.
#[derive(Debug)]
pub struct SigningContext {
    anchor: ResolvedOutput,
    funding: ResolvedOutput,
    prior_phase_output: Option<ResolvedOutput>,
    signer_key: SignerKey,
}

impl SigningContext {
    /// Resolves the provenance of the anchor and funding UTXOs.
    pub fn new(
        anchor: &UtxoProvenance,
        funding: &UtxoProvenance,
        signer_key: SignerKey,
    ) -> BuildResult<Self> {
        if anchor.utxo.matches(&funding.utxo.to_outpoint()) {
            return Err(BuildError::DuplicateProvenance(anchor.utxo));
        }

        Ok(Self {
            anchor: resolve(anchor)?,
            funding: resolve(funding)?,
            prior_phase_output: None,
            signer_key,
        })
    }

    /// Records output 0 of the finalized commit transaction as the prior phase output.
    ///
    /// The output is read from `commit` itself and may only be recorded once.
    pub fn record_prior_phase_output(
        &mut self,
        commit: &FinalizedTransaction,
    ) -> BuildResult<&ResolvedOutput> {
        if self.prior_phase_output.is_some() {
            return Err(BuildError::PriorPhaseAlreadyRecorded);
        }

        let output = ResolvedOutput::from_parent(commit.as_tx(), 0)?;
        debug!(utxo = %output.utxo, value = %output.value, "recorded prior phase output");

        Ok(self.prior_phase_output.insert(output))
    }

    /// The anchor UTXO.
    pub const fn anchor(&self) -> &ResolvedOutput {
        &self.anchor
    }

    /// The funding UTXO.
    pub const fn funding(&self) -> &ResolvedOutput {
        &self.funding
    }

    /// The output of the first phase, once recorded.
    pub const fn prior_phase_output(&self) -> Option<&ResolvedOutput> {
        self.prior_phase_output.as_ref()
    }

    /// The signer's public key material.
    pub const fn signer_key(&self) -> SignerKey {
        self.signer_key
    }

    /// Known UTXOs in classification order.
    pub(crate) fn known(&self) -> impl Iterator<Item = (InputRole, &ResolvedOutput)> + '_ {
        [
            (InputRole::Anchor, Some(&self.anchor)),
            (InputRole::Funding, Some(&self.funding)),
            (InputRole::PriorPhaseOutput, self.prior_phase_output.as_ref()),
        ]
        .into_iter()
        .filter_map(|(role, output)| output.map(|output| (role, output)))
    }
}

#[cfg(test)]
mod tests {
    use spell_package_test_utils::PackageFixture;

    use super::*;
    use crate::test_support::context;

    #[test]
    fn parses_both_key_encodings() {
        let fixture = PackageFixture::scenario_a();
        let pk = fixture.public_key();

        let full = SignerKey::from_slice(&pk.serialize()).unwrap();
        let xonly = SignerKey::from_slice(&pk.x_only_public_key().0.serialize()).unwrap();

        assert_eq!(full, SignerKey::Full(pk));
        assert_eq!(full.x_only(), xonly.x_only());
        assert_eq!(xonly.full(), None);
        assert!(matches!(
            SignerKey::from_slice(&[2; 20]),
            Err(BuildError::InvalidSignerKey(_))
        ));
    }

    #[test]
    fn rejects_anchor_equal_to_funding() {
        let fixture = PackageFixture::scenario_a();
        let mut funding = fixture.anchor.clone();
        funding.utxo = funding.utxo.byte_reversed();

        let result = SigningContext::new(&fixture.anchor, &funding, fixture.public_key().into());

        assert_eq!(
            result.unwrap_err(),
            BuildError::DuplicateProvenance(fixture.anchor.utxo)
        );
    }

    #[test]
    fn prior_phase_output_is_recorded_once() {
        let fixture = PackageFixture::scenario_a();
        let mut ctx = context(&fixture);
        let commit = fixture.witnessed_commit();

        let recorded = ctx.record_prior_phase_output(&commit).unwrap().clone();
        assert_eq!(recorded.utxo.txid, commit.txid());
        assert_eq!(recorded.value, commit.as_tx().output[0].value);

        assert_eq!(
            ctx.record_prior_phase_output(&commit).unwrap_err(),
            BuildError::PriorPhaseAlreadyRecorded
        );
    }

    #[test]
    fn known_outputs_follow_classification_order() {
        let fixture = PackageFixture::scenario_a();
        let ctx = context(&fixture);

        let roles = ctx.known().map(|(role, _)| role).collect::<Vec<_>>();
        assert_eq!(roles, vec![InputRole::Anchor, InputRole::Funding]);
    }
}
