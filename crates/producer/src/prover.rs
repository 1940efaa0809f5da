//! HTTP client for the prover service.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    errors::{ProducerError, ProducerResult},
    response::{ProverResponse, UnsignedPackage},
    traits::TemplateProducer,
};

/// Default bound on a single prove call. Proving is slow.
pub const DEFAULT_PROVE_TIMEOUT: Duration = Duration::from_secs(300);

/// Posts spell requests to a prover and validates the templates it returns.
#[derive(Debug, Clone)]
pub struct ProverClient {
    client: Client,
    url: String,
}

impl ProverClient {
    /// Creates a client for the prover at `url`, bounding every request by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> ProducerResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self::with_client(client, url))
    }

    /// Creates a client that sends requests through `client`.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The prover endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TemplateProducer for ProverClient {
    async fn produce(&self, request: &Value) -> ProducerResult<UnsignedPackage> {
        info!(url = %self.url, "requesting templates from prover");

        let response = self.client.post(&self.url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(%status, "prover refused request");
            return Err(ProducerError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!(len = body.len(), "received prover response");
        let package = ProverResponse::parse(&body)?;
        info!(commit = %package.commit.txid(), spell = %package.spell.txid(), "received templates");

        Ok(package)
    }
}
