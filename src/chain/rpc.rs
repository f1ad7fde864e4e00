use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use super::{ChainConnection, ChainError, Confirmation, ConfirmationStrategy, LatestBlockhash};

const JSONRPC_VERSION: &str = "2.0";

/// Commitment level a signature must reach to count as confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level {other:?}")),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcContextual<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    slot: u64,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<String>,
}

impl SignatureStatus {
    fn reached(&self, commitment: Commitment) -> bool {
        self.confirmation_status
            .as_deref()
            .and_then(|status| status.parse::<Commitment>().ok())
            .map_or(false, |status| status >= commitment)
    }
}

/// JSON-RPC connection to a Solana cluster.
#[derive(Clone)]
pub struct RpcChainClient {
    inner: Client,
    url: Url,
    commitment: Commitment,
    poll_interval: Duration,
}

impl RpcChainClient {
    pub fn from_endpoint(
        endpoint: &str,
        timeout: Duration,
        poll_interval: Duration,
        commitment: Commitment,
    ) -> Result<Self, ChainError> {
        let url = Url::parse(endpoint)
            .map_err(|err| ChainError::InvalidEndpoint(format!("{endpoint}: {err}")))?;
        Self::from_url(url, timeout, poll_interval, commitment)
    }

    pub fn from_url(
        url: Url,
        timeout: Duration,
        poll_interval: Duration,
        commitment: Commitment,
    ) -> Result<Self, ChainError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: client,
            url,
            commitment,
            poll_interval,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let payload = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: 1,
            method,
            params,
        };
        let response = self.inner.post(self.url.clone()).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(ChainError::HttpStatus(response.status()));
        }

        let response: JsonRpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response.result.ok_or(ChainError::EmptyResponse)
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, ChainError> {
        let value = self.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn block_height(&self) -> Result<u64, ChainError> {
        self.call("getBlockHeight", json!([{ "commitment": self.commitment.as_str() }]))
            .await
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, ChainError> {
        let statuses: RpcContextual<Vec<Option<SignatureStatus>>> = self
            .call("getSignatureStatuses", json!([[signature.to_string()]]))
            .await?;
        Ok(statuses.value.into_iter().next().flatten())
    }
}

pub(crate) fn encode_transaction(transaction: &Transaction) -> Result<String, ChainError> {
    let bytes =
        bincode::serialize(transaction).map_err(|err| ChainError::Encoding(err.to_string()))?;
    Ok(STANDARD.encode(bytes))
}

#[async_trait]
impl ChainConnection for RpcChainClient {
    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, ChainError> {
        let latest: RpcContextual<BlockhashValue> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;
        let blockhash = Hash::from_str(&latest.value.blockhash)
            .map_err(|_| ChainError::Malformed(latest.value.blockhash.clone()))?;
        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height: latest.value.last_valid_block_height,
        })
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        let encoded = encode_transaction(transaction)?;
        let signature: String = self
            .call(
                "sendTransaction",
                json!([encoded, {
                    "encoding": "base64",
                    "preflightCommitment": self.commitment.as_str(),
                }]),
            )
            .await?;
        Signature::from_str(&signature).map_err(|_| ChainError::Malformed(signature))
    }

    async fn confirm_transaction(
        &self,
        strategy: &ConfirmationStrategy,
    ) -> Result<Confirmation, ChainError> {
        loop {
            if let Some(status) = self.signature_status(&strategy.signature).await? {
                if status.err.is_some() || status.reached(self.commitment) {
                    return Ok(Confirmation {
                        slot: status.slot,
                        err: status.err,
                    });
                }
                debug!(
                    "{} seen at {:?}, waiting for {}",
                    strategy.signature, status.confirmation_status, self.commitment
                );
            }

            let height = self.block_height().await?;
            if height > strategy.last_valid_block_height {
                warn!(
                    "Blockhash {} expired at height {} before {} confirmed",
                    strategy.blockhash, height, strategy.signature
                );
                return Err(ChainError::BlockHeightExceeded(strategy.signature));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
