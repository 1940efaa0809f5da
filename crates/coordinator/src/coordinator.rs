//! The two-phase signing state machine.

use std::collections::BTreeMap;

use spell_package_btc_client::PackageRelay;
use spell_package_primitives::{
    codec::{FinalizedTransaction, TransactionTemplate},
    package::PackageResult,
    utxo::UtxoProvenance,
};
use spell_package_signer::{ExternalSigner, SignedInputs, SignerResponse, SigningPhase};
use spell_package_tx_builder::{build, InputRole, SignableTemplate, SignerKey, SigningContext};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    broadcast::{self, SignedPackage},
    config::{CommitSpendPolicy, CoordinatorConfig},
    errors::{CoordinatorResult, PackageError},
    leases::{UtxoLease, UtxoLeases},
};

/// Everything needed for one signing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    /// The unsigned commit template, spending the funding UTXO.
    pub commit_template: TransactionTemplate,

    /// The spell template, spending the commit output and the anchor.
    pub spell_template: TransactionTemplate,

    /// Provenance of the anchor UTXO.
    pub anchor: UtxoProvenance,

    /// Provenance of the funding UTXO.
    pub funding: UtxoProvenance,

    /// Public key of the signer.
    pub signer_pubkey: SignerKey,
}

/// Signs commit and spell in sequence with an external signer, then relays them as a package.
///
/// Each call is one self-contained attempt: a fresh [`SigningContext`] is built for it and
/// dropped when it ends. The anchor and funding UTXOs are leased for the duration of the
/// attempt, so concurrent attempts over the same UTXOs fail fast with
/// [`PackageError::UtxoInFlight`].
#[derive(Debug)]
pub struct PackageCoordinator<S, R> {
    signer: S,
    relay: R,
    config: CoordinatorConfig,
    leases: UtxoLeases,
}

impl<S: ExternalSigner, R: PackageRelay> PackageCoordinator<S, R> {
    /// Creates a coordinator with its own lease registry.
    pub fn new(signer: S, relay: R, config: CoordinatorConfig) -> Self {
        Self::with_leases(signer, relay, config, UtxoLeases::new())
    }

    /// Creates a coordinator that shares `leases` with others.
    pub const fn with_leases(
        signer: S,
        relay: R,
        config: CoordinatorConfig,
        leases: UtxoLeases,
    ) -> Self {
        Self {
            signer,
            relay,
            config,
            leases,
        }
    }

    /// The signer.
    pub const fn signer(&self) -> &S {
        &self.signer
    }

    /// The relay.
    pub const fn relay(&self) -> &R {
        &self.relay
    }

    /// The lease registry.
    pub const fn leases(&self) -> &UtxoLeases {
        &self.leases
    }

    /// The settings.
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Signs the package without broadcasting it.
    ///
    /// The anchor and funding UTXOs stay leased until the returned lease is dropped. Hold it
    /// until the package has been broadcast or abandoned.
    pub async fn sign_package(
        &self,
        request: &PackageRequest,
        cancel: &CancellationToken,
    ) -> CoordinatorResult<(SignedPackage, UtxoLease)> {
        let lease = self.lease(request)?;
        let package = self.sign_phases(request, cancel).await?;

        Ok((package, lease))
    }

    /// Signs the package and submits it to the relay exactly once.
    ///
    /// Cancellation is honoured up to the moment of submission. Once submitted, the relay's
    /// verdict is awaited.
    pub async fn sign_and_broadcast_package(
        &self,
        request: PackageRequest,
        cancel: &CancellationToken,
    ) -> CoordinatorResult<PackageResult> {
        let _lease = self.lease(&request)?;

        let package = self.sign_phases(&request, cancel).await?;

        if cancel.is_cancelled() {
            warn!("attempt cancelled before broadcast, dropping signed package");
            return Err(PackageError::Cancelled {
                phase: SigningPhase::Spell,
            });
        }

        broadcast::submit(&self.relay, &package).await
    }

    fn lease(&self, request: &PackageRequest) -> CoordinatorResult<UtxoLease> {
        self.leases.acquire(&[request.anchor.utxo, request.funding.utxo])
    }

    async fn sign_phases(
        &self,
        request: &PackageRequest,
        cancel: &CancellationToken,
    ) -> CoordinatorResult<SignedPackage> {
        let mut ctx =
            SigningContext::new(&request.anchor, &request.funding, request.signer_pubkey)?;

        let commit = self
            .sign_commit(&request.commit_template, &mut ctx, cancel)
            .await?;
        let spell = self.sign_spell(&request.spell_template, &ctx, cancel).await?;

        Ok(SignedPackage { commit, spell })
    }

    /// Phase one: funding input of the commit.
    #[instrument(skip_all, fields(phase = %SigningPhase::Commit, template = %template.txid()))]
    async fn sign_commit(
        &self,
        template: &TransactionTemplate,
        ctx: &mut SigningContext,
        cancel: &CancellationToken,
    ) -> CoordinatorResult<FinalizedTransaction> {
        let signable = build(template, ctx.funding(), ctx)?;
        let commit = self
            .request_signatures(SigningPhase::Commit, signable, cancel)
            .await?;

        let output = ctx.record_prior_phase_output(&commit)?;
        info!(txid = %commit.txid(), output = %output.utxo, "commit finalized");

        Ok(commit)
    }

    /// Phase two: anchor input of the spell, plus the commit spend under
    /// [`CommitSpendPolicy::CoSign`].
    #[instrument(skip_all, fields(phase = %SigningPhase::Spell, template = %template.txid()))]
    async fn sign_spell(
        &self,
        template: &TransactionTemplate,
        ctx: &SigningContext,
        cancel: &CancellationToken,
    ) -> CoordinatorResult<FinalizedTransaction> {
        let mut signable = build(template, ctx.anchor(), ctx)?;

        if !signable.roles().contains(&InputRole::PriorPhaseOutput) {
            let commit = ctx
                .prior_phase_output()
                .map(|output| output.utxo)
                .ok_or_else(|| PackageError::InvalidRequest("commit not recorded".into()))?;

            return Err(PackageError::SpellDoesNotSpendCommit {
                spell: template.txid(),
                commit,
            });
        }

        if self.config.commit_spend == CommitSpendPolicy::CoSign {
            signable = signable.with_co_signed(InputRole::PriorPhaseOutput);
        }

        let spell = self
            .request_signatures(SigningPhase::Spell, signable, cancel)
            .await?;
        info!(txid = %spell.txid(), "spell finalized");

        Ok(spell)
    }

    /// Asks the signer for the inputs `signable` requests and finalizes it with the answer.
    ///
    /// The call is bounded by the configured timeout and abandoned as soon as `cancel` fires.
    async fn request_signatures(
        &self,
        phase: SigningPhase,
        signable: SignableTemplate,
        cancel: &CancellationToken,
    ) -> CoordinatorResult<FinalizedTransaction> {
        if cancel.is_cancelled() {
            return Err(PackageError::Cancelled { phase });
        }

        if signable.signing_indices().is_empty() {
            debug!("every input is already witnessed, skipping signer");
            return Ok(signable.finalize(SignedInputs::Witnesses(BTreeMap::new()))?);
        }

        let request = signable.sign_request(phase);
        debug!(indices = ?request.indices, "requesting signatures");

        let timeout = self.config.signer_timeout;
        let response = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                warn!("attempt cancelled while waiting for signer");
                return Err(PackageError::Cancelled { phase });
            }
            response = tokio::time::timeout(timeout, self.signer.sign(request)) => {
                response.map_err(|_| {
                    warn!(?timeout, "signer timed out");
                    PackageError::SignerTimeout { phase, timeout }
                })?
            }
        };

        match response.map_err(|err| PackageError::from_signer(phase, err))? {
            SignerResponse::Signed(signed) => Ok(signable.finalize(signed)?),
            SignerResponse::Rejected { reason } => {
                warn!(%reason, "signer rejected request");
                Err(PackageError::SignerRejected { phase, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bitcoin::{hashes::Hash, OutPoint, Txid, Witness};
    use proptest::prelude::*;
    use spell_package_btc_client::ClientError;
    use spell_package_primitives::utxo::UtxoRef;
    use spell_package_signer::SignerError;
    use spell_package_test_utils::{
        parent_tx, provenance, MockBehaviour, MockRelay, MockSigner, PackageFixture,
    };

    use super::*;
    use crate::errors::Rejection;

    fn request(fixture: &PackageFixture) -> PackageRequest {
        PackageRequest {
            commit_template: fixture.commit.clone(),
            spell_template: fixture.spell.clone(),
            anchor: fixture.anchor.clone(),
            funding: fixture.funding.clone(),
            signer_pubkey: fixture.public_key().into(),
        }
    }

    fn coordinator(
        signer: MockSigner,
        relay: MockRelay,
        commit_spend: CommitSpendPolicy,
    ) -> PackageCoordinator<MockSigner, MockRelay> {
        PackageCoordinator::new(
            signer,
            relay,
            CoordinatorConfig {
                signer_timeout: Duration::from_millis(200),
                commit_spend,
            },
        )
    }

    fn honest(fixture: &PackageFixture) -> MockSigner {
        MockSigner::new(fixture.keypair)
    }

    #[tokio::test]
    async fn scenario_a_signs_commit_then_anchor_and_commit_spend() {
        let fixture = PackageFixture::scenario_a();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::CoSign,
        );

        let result = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap();

        let requests = coordinator.signer().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].phase, SigningPhase::Commit);
        assert_eq!(requests[0].indices, vec![0]);
        assert_eq!(requests[1].phase, SigningPhase::Spell);
        assert_eq!(requests[1].indices, vec![0, 1]);

        let submitted = coordinator.relay().submissions();
        assert_eq!(submitted.len(), 1);
        let [commit, spell] = [&submitted[0][0], &submitted[0][1]];
        assert!(commit.as_tx().input.iter().all(|txin| !txin.witness.is_empty()));
        assert!(spell.as_tx().input.iter().all(|txin| !txin.witness.is_empty()));
        assert_eq!(spell.as_tx().input[0].previous_output, OutPoint::new(commit.txid(), 0));
        assert!(result.is_success(&[commit.txid(), spell.txid()]));
    }

    #[tokio::test]
    async fn scenario_a_without_co_signing_is_incomplete() {
        let fixture = PackageFixture::scenario_a();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PackageError::IncompleteWitness { index: 0, .. }));
        assert_eq!(coordinator.relay().calls(), 0);
    }

    #[tokio::test]
    async fn scenario_b_preserves_the_proof_witness() {
        let fixture = PackageFixture::scenario_b();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let (package, _lease) = coordinator
            .sign_package(&request(&fixture), &CancellationToken::new())
            .await
            .unwrap();

        let spell = package.spell.as_tx();
        assert_eq!(spell.input[1].witness, fixture.proof_witness());
        assert_eq!(spell.input[0].witness.len(), 1);
        assert_eq!(spell.input[0].witness[0].len(), 64);
        assert_eq!(coordinator.signer().requests()[1].indices, vec![0]);
        assert_eq!(package.spell.txid(), fixture.spell.txid());
        assert_eq!(coordinator.relay().calls(), 0);
    }

    #[tokio::test]
    async fn scenario_b_co_signing_leaves_the_proof_alone() {
        let fixture = PackageFixture::scenario_b();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::CoSign,
        );

        let (package, _lease) = coordinator
            .sign_package(&request(&fixture), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(coordinator.signer().requests()[1].indices, vec![0]);
        assert_eq!(package.spell.as_tx().input[1].witness, fixture.proof_witness());
    }

    #[tokio::test]
    async fn scenario_c_out_of_range_vout_is_a_provenance_mismatch() {
        let fixture = PackageFixture::scenario_b();
        let mut request = request(&fixture);
        request.anchor = provenance(&fixture.anchor_parent, 3);
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_and_broadcast_package(request, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PackageError::ProvenanceMismatch { utxo, .. } if utxo.vout == 3));
        assert_eq!(coordinator.signer().calls(), 0);
        assert_eq!(coordinator.relay().calls(), 0);
    }

    #[tokio::test]
    async fn scenario_d_unknown_spell_input_is_not_found() {
        let stranger = OutPoint::new(Txid::from_byte_array([0x99; 32]), 0);
        let fixture = PackageFixture::scenario_b();
        let fixture = fixture.clone().with_spell(&[
            (fixture.anchor_outpoint(), Witness::new()),
            (fixture.commit_outpoint(), fixture.proof_witness()),
            (stranger, Witness::new()),
        ]);
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PackageError::InputNotFound {
                utxo: UtxoRef::from(stranger),
                index: Some(2),
            }
        );
        assert_eq!(coordinator.signer().calls(), 1, "only the commit was signed");
        assert_eq!(coordinator.relay().calls(), 0);
    }

    #[tokio::test]
    async fn scenario_e_relay_rejection_is_reported_verbatim() {
        let fixture = PackageFixture::scenario_b();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::rejecting(1, "bad-witness"),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        let PackageError::PackageRejected { rejections, .. } = &err else {
            panic!("expected a rejected package, got {err:?}");
        };
        assert_eq!(
            rejections,
            &vec![Rejection {
                txid: fixture.spell.txid(),
                error: Some("bad-witness".into()),
            }]
        );
        assert!(err.to_string().contains("bad-witness"));
        assert_eq!(coordinator.relay().calls(), 1);
    }

    #[tokio::test]
    async fn witness_responses_are_accepted() {
        let fixture = PackageFixture::scenario_b();
        let signer = honest(&fixture)
            .with(SigningPhase::Commit, MockBehaviour::Witnesses)
            .with(SigningPhase::Spell, MockBehaviour::Witnesses);
        let coordinator = coordinator(
            signer,
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        assert!(coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn missing_signature_never_yields_a_transaction() {
        let fixture = PackageFixture::scenario_b();
        let signer = honest(&fixture).with(SigningPhase::Spell, MockBehaviour::OmitSignatures);
        let coordinator = coordinator(
            signer,
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PackageError::IncompleteWitness {
                txid: fixture.spell.txid(),
                index: 0,
            }
        );
        assert_eq!(coordinator.relay().calls(), 0);
    }

    #[tokio::test]
    async fn signer_rejection_is_retryable() {
        let fixture = PackageFixture::scenario_b();
        let signer = honest(&fixture).with(
            SigningPhase::Commit,
            MockBehaviour::Reject("user declined".into()),
        );
        let coordinator = coordinator(
            signer,
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PackageError::SignerRejected {
                phase: SigningPhase::Commit,
                reason: "user declined".into(),
            }
        );
        assert!(err.is_retryable());
        assert_eq!(coordinator.signer().calls(), 1);
    }

    #[tokio::test]
    async fn signer_transport_failure_is_attributed_to_its_phase() {
        let fixture = PackageFixture::scenario_b();
        let signer = honest(&fixture).with(
            SigningPhase::Spell,
            MockBehaviour::Fail(SignerError::Transport("connection reset".into())),
        );
        let coordinator = coordinator(
            signer,
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_package(&request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PackageError::SignerFailed {
                phase: SigningPhase::Spell,
                source: SignerError::Transport(_),
            }
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn slow_signer_times_out() {
        let fixture = PackageFixture::scenario_b();
        let signer = honest(&fixture).with(
            SigningPhase::Spell,
            MockBehaviour::Delay(Duration::from_secs(10)),
        );
        let coordinator = coordinator(
            signer,
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PackageError::SignerTimeout {
                phase: SigningPhase::Spell,
                timeout: Duration::from_millis(200),
            }
        );
        assert_eq!(coordinator.relay().calls(), 0);
        assert!(coordinator.leases().is_empty());
    }

    #[tokio::test]
    async fn cancellation_aborts_the_attempt() {
        let fixture = PackageFixture::scenario_b();
        let signer = honest(&fixture).with(
            SigningPhase::Commit,
            MockBehaviour::Delay(Duration::from_secs(10)),
        );
        let coordinator = coordinator(
            signer,
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            }
        };
        let (result, ()) = tokio::join!(
            coordinator.sign_and_broadcast_package(request(&fixture), &cancel),
            canceller
        );

        assert_eq!(
            result.unwrap_err(),
            PackageError::Cancelled {
                phase: SigningPhase::Commit
            }
        );
        assert_eq!(coordinator.signer().calls(), 1);
        assert_eq!(coordinator.relay().calls(), 0);
        assert!(coordinator.leases().is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_never_reaches_the_signer() {
        let fixture = PackageFixture::scenario_b();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(matches!(
            coordinator.sign_and_broadcast_package(request(&fixture), &cancel).await,
            Err(PackageError::Cancelled { .. })
        ));
        assert_eq!(coordinator.signer().calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_attempts_over_the_same_utxos_conflict() {
        let fixture = PackageFixture::scenario_b();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let held = coordinator
            .leases()
            .acquire(&[fixture.funding.utxo.byte_reversed()])
            .unwrap();

        let err = coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, PackageError::UtxoInFlight(fixture.funding.utxo));
        assert_eq!(coordinator.signer().calls(), 0);

        drop(held);
        assert!(coordinator
            .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
            .await
            .is_ok());
        assert!(coordinator.leases().is_empty());
    }

    #[tokio::test]
    async fn spell_must_spend_the_commit() {
        let fixture = PackageFixture::scenario_b();
        let fixture = fixture
            .clone()
            .with_spell(&[(fixture.anchor_outpoint(), Witness::new())]);
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        let err = coordinator
            .sign_package(&request(&fixture), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PackageError::SpellDoesNotSpendCommit {
                spell: fixture.spell.txid(),
                commit: UtxoRef::new(fixture.commit.txid(), 0),
            }
        );
    }

    #[tokio::test]
    async fn same_anchor_and_funding_is_an_invalid_request() {
        let fixture = PackageFixture::scenario_b();
        let mut request = request(&fixture);
        request.anchor = fixture.funding.clone();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        assert!(matches!(
            coordinator
                .sign_package(&request, &CancellationToken::new())
                .await,
            Err(PackageError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn signed_package_keeps_its_utxos_leased() {
        let fixture = PackageFixture::scenario_b();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );
        let request = request(&fixture);

        let (_package, lease) = coordinator
            .sign_package(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert!(coordinator.leases().is_leased(&request.anchor.utxo));
        assert!(coordinator.leases().is_leased(&request.funding.utxo));
        assert_eq!(
            coordinator
                .sign_package(&request, &CancellationToken::new())
                .await
                .unwrap_err(),
            PackageError::UtxoInFlight(request.anchor.utxo)
        );

        drop(lease);

        assert!(coordinator.leases().is_empty());
        assert!(coordinator
            .sign_package(&request, &CancellationToken::new())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_relay_error() {
        let fixture = PackageFixture::scenario_b();
        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::failing(ClientError::Transport("connection refused".into())),
            CommitSpendPolicy::Presatisfied,
        );

        assert!(matches!(
            coordinator
                .sign_and_broadcast_package(request(&fixture), &CancellationToken::new())
                .await,
            Err(PackageError::Relay(_))
        ));
    }

    #[tokio::test]
    async fn foreign_parent_provenance_is_rejected() {
        let fixture = PackageFixture::scenario_b();
        let mut request = request(&fixture);
        let other = parent_tx(9, &fixture.anchor_parent.output);
        request.anchor.parent_raw_tx = bitcoin::consensus::serialize(&other);

        let coordinator = coordinator(
            honest(&fixture),
            MockRelay::accepting(),
            CommitSpendPolicy::Presatisfied,
        );

        assert!(matches!(
            coordinator
                .sign_package(&request, &CancellationToken::new())
                .await,
            Err(PackageError::ProvenanceMismatch { .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn pre_existing_witnesses_survive_signing(
            stack in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..80), 1..4),
        ) {
            let proof = Witness::from_slice(&stack);
            let fixture = PackageFixture::scenario_b();
            let fixture = fixture.clone().with_spell(&[
                (fixture.anchor_outpoint(), Witness::new()),
                (fixture.commit_outpoint(), proof.clone()),
            ]);
            let coordinator = coordinator(
                honest(&fixture),
                MockRelay::accepting(),
                CommitSpendPolicy::CoSign,
            );

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let (package, _lease) = runtime
                .block_on(coordinator.sign_package(&request(&fixture), &CancellationToken::new()))
                .unwrap();

            prop_assert_eq!(&package.spell.as_tx().input[1].witness, &proof);
        }
    }
}
