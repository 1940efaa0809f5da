//! Client for a signer reachable over HTTP.

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::{
    errors::{SignerError, SignerResult},
    traits::{ExternalSigner, SignRequest, SignerResponse},
    wire::{SignRequestBody, SignerReply},
};

/// Posts signing requests as JSON to a remote signer.
///
/// No timeout is configured on the client itself. The signer may wait for a human, so the
/// caller bounds each call instead.
#[derive(Debug, Clone)]
pub struct HttpSigner {
    client: Client,
    url: String,
}

impl HttpSigner {
    /// Creates a signer that posts to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Creates a signer that posts to `url` using an existing client.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl ExternalSigner for HttpSigner {
    async fn sign(&self, request: SignRequest) -> SignerResult<SignerResponse> {
        let body = SignRequestBody::from(&request);
        info!(
            phase = %request.phase,
            indices = ?request.indices,
            url = %self.url,
            "requesting signatures"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SignerError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SignerError::Transport(e.to_string()))?;

        parse_reply(status, &body)
    }
}

/// Interprets a signer's HTTP reply.
///
/// A non-success status is an error whatever the body says.
fn parse_reply(status: StatusCode, body: &str) -> SignerResult<SignerResponse> {
    if !status.is_success() {
        return Err(SignerError::Http {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let reply: SignerReply =
        serde_json::from_str(body).map_err(|e| SignerError::InvalidResponse(e.to_string()))?;
    debug!(?reply, "received signer reply");

    reply.validate()
}
