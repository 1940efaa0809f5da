//! Minimal JSON-RPC 1.0 client for Bitcoin Core.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use bitcoin::{consensus::encode, Amount, Transaction, Txid};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use spell_package_primitives::{
    errors::TxError,
    utxo::{UtxoProvenance, UtxoRef},
};
use tracing::{debug, trace, warn};

use crate::{
    errors::{ClientError, ClientResult},
    traits::ProvenanceSource,
};

/// Error code Bitcoin Core returns for unknown transactions.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// A Bitcoin Core JSON-RPC client.
#[derive(Debug, Clone)]
pub struct BitcoinRpcClient {
    client: Client,
    url: String,
    auth: Option<(String, String)>,
    next_id: Arc<AtomicU64>,
}

impl BitcoinRpcClient {
    /// Creates a client for the node at `url`.
    ///
    /// `auth` is a `(user, password)` pair for basic authentication. `timeout` bounds every
    /// request.
    pub fn new(
        url: impl Into<String>,
        auth: Option<(String, String)>,
        timeout: Option<Duration>,
    ) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.into(),
            auth,
            next_id: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Calls `method` with positional `params`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[Value],
    ) -> ClientResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "1.0",
            id,
            method,
            params,
        };
        trace!(%method, %id, "sending rpc request");

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some((user, pass)) = &self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        parse_response(status, &body)
    }

    /// Fetches the hex encoding of a transaction.
    pub async fn get_raw_transaction_hex(&self, txid: Txid) -> ClientResult<String> {
        self.call("getrawtransaction", &[json!(txid.to_string()), json!(false)])
            .await
    }
}

/// Interprets the body of a JSON-RPC reply.
///
/// Bitcoin Core reports call failures with a non-success status and an `error` object, so the
/// body is inspected before the status.
fn parse_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> ClientResult<T> {
    match serde_json::from_str::<RpcResponse>(body) {
        Ok(RpcResponse {
            error: Some(error), ..
        }) => Err(ClientError::Rpc {
            code: error.code,
            message: error.message,
        }),
        Ok(RpcResponse { result, .. }) if status.is_success() => {
            serde_json::from_value(result.unwrap_or(Value::Null))
                .map_err(|e| ClientError::InvalidResponse(e.to_string()))
        }
        Err(e) if status.is_success() => Err(ClientError::InvalidResponse(e.to_string())),
        _ => Err(ClientError::Http {
            status: status.as_u16(),
            body: body.to_string(),
        }),
    }
}

impl ProvenanceSource for BitcoinRpcClient {
    async fn fetch(&self, utxo: UtxoRef) -> ClientResult<UtxoProvenance> {
        fetch_provenance(utxo, |txid| self.get_raw_transaction_hex(txid)).await
    }
}

/// Looks up the parent of `utxo` with `lookup`, retrying with the reversed txid if the node does
/// not know the txid as given.
///
/// A `vout` the parent does not have is reported with a zero value. Resolving the provenance
/// rejects it later.
async fn fetch_provenance<F, Fut>(utxo: UtxoRef, lookup: F) -> ClientResult<UtxoProvenance>
where
    F: Fn(Txid) -> Fut,
    Fut: Future<Output = ClientResult<String>>,
{
    let hex = match lookup(utxo.txid).await {
        Err(ClientError::Rpc { code, .. }) if code == RPC_INVALID_ADDRESS_OR_KEY => {
            debug!(%utxo, "parent not found, retrying with reversed txid");
            lookup(utxo.byte_reversed().txid).await?
        }
        other => other?,
    };

    let parent: Transaction =
        encode::deserialize_hex(&hex).map_err(|e| TxError::MalformedProvenance {
            utxo,
            reason: e.to_string(),
        })?;

    let value = match parent.output.get(utxo.vout as usize) {
        Some(txout) => txout.value,
        None => {
            warn!(%utxo, outputs = parent.output.len(), "parent has no such output");
            Amount::ZERO
        }
    };

    Ok(UtxoProvenance::new(utxo, value, encode::serialize(&parent)))
}
