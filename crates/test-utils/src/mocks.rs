//! Scriptable stand-ins for the external signer and the package relay.

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use bitcoin::Witness;
use parking_lot::Mutex;
use secp256k1::Keypair;
use spell_package_btc_client::{ClientError, ClientResult, PackageRelay};
use spell_package_primitives::{
    codec::FinalizedTransaction,
    package::{PackageResult, TxAcceptance},
};
use spell_package_signer::{
    ExternalSigner, KeypairSigner, SignRequest, SignedInputs, SignerError, SignerResponse,
    SignerResult, SigningPhase,
};

/// How a [`MockSigner`] answers requests of one phase.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Sign and return the PSBT.
    Honest,

    /// Sign and return taproot key-path witnesses instead of the PSBT.
    Witnesses,

    /// Return the PSBT without signing anything.
    OmitSignatures,

    /// Wait, then sign honestly.
    Delay(Duration),

    /// Decline with the given reason.
    Reject(String),

    /// Fail with the given error.
    Fail(SignerError),
}

/// A signer that behaves as configured per phase and records every request.
#[derive(Debug)]
pub struct MockSigner {
    inner: KeypairSigner,
    behaviours: HashMap<SigningPhase, MockBehaviour>,
    requests: Mutex<Vec<SignRequest>>,
}

impl MockSigner {
    /// A signer that honestly signs with `keypair` in every phase.
    pub fn new(keypair: Keypair) -> Self {
        Self {
            inner: KeypairSigner::new(keypair),
            behaviours: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sets the behaviour for `phase`.
    pub fn with(mut self, phase: SigningPhase, behaviour: MockBehaviour) -> Self {
        self.behaviours.insert(phase, behaviour);
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<SignRequest> {
        self.requests.lock().clone()
    }

    /// The number of requests received so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

impl ExternalSigner for MockSigner {
    async fn sign(&self, request: SignRequest) -> SignerResult<SignerResponse> {
        self.requests.lock().push(request.clone());

        let behaviour = self
            .behaviours
            .get(&request.phase)
            .cloned()
            .unwrap_or(MockBehaviour::Honest);

        match behaviour {
            MockBehaviour::Honest => self.inner.sign(request).await,
            MockBehaviour::Witnesses => {
                let mut psbt = request.psbt;
                self.inner.sign_psbt(&mut psbt, &request.indices)?;

                let witnesses = request
                    .indices
                    .iter()
                    .filter_map(|&index| {
                        let signature = psbt.inputs[index].tap_key_sig.as_ref()?;
                        Some((index, Witness::p2tr_key_spend(signature)))
                    })
                    .collect();

                Ok(SignerResponse::Signed(SignedInputs::Witnesses(witnesses)))
            }
            MockBehaviour::OmitSignatures => {
                Ok(SignerResponse::Signed(SignedInputs::Psbt(request.psbt)))
            }
            MockBehaviour::Delay(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.sign(request).await
            }
            MockBehaviour::Reject(reason) => Ok(SignerResponse::Rejected { reason }),
            MockBehaviour::Fail(error) => Err(error),
        }
    }
}

/// A relay that accepts every transaction except the configured ones, and records every
/// submission.
#[derive(Debug, Default)]
pub struct MockRelay {
    rejections: BTreeMap<usize, String>,
    failure: Option<ClientError>,
    submissions: Mutex<Vec<Vec<FinalizedTransaction>>>,
}

impl MockRelay {
    /// A relay that accepts everything.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// A relay that rejects the transaction at `index` of a package with `error`.
    pub fn rejecting(index: usize, error: impl Into<String>) -> Self {
        Self {
            rejections: BTreeMap::from([(index, error.into())]),
            ..Self::default()
        }
    }

    /// A relay that never answers with a verdict.
    pub fn failing(error: ClientError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Every package submitted so far.
    pub fn submissions(&self) -> Vec<Vec<FinalizedTransaction>> {
        self.submissions.lock().clone()
    }

    /// The number of submissions so far.
    pub fn calls(&self) -> usize {
        self.submissions.lock().len()
    }
}

impl PackageRelay for MockRelay {
    async fn submit_package(&self, txs: &[FinalizedTransaction]) -> ClientResult<PackageResult> {
        self.submissions.lock().push(txs.to_vec());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let per_transaction = txs
            .iter()
            .enumerate()
            .map(|(index, tx)| {
                let acceptance = match self.rejections.get(&index) {
                    Some(error) => TxAcceptance::rejected(error.clone()),
                    None => TxAcceptance::accepted(),
                };
                (tx.txid(), acceptance)
            })
            .collect();

        let package_msg = if self.rejections.is_empty() {
            "success"
        } else {
            "transaction failed"
        };

        Ok(PackageResult {
            per_transaction,
            package_msg: Some(package_msg.to_string()),
        })
    }
}
