mod rpc;
mod transfer;

use async_trait::async_trait;
use reqwest::StatusCode;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

use crate::wallet::ProviderError;

pub use rpc::{Commitment, RpcChainClient};
pub use transfer::{sol_to_lamports, Transfer, TransferExecutor};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("chain RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chain RPC transport error: HTTP status {0}")]
    HttpStatus(StatusCode),
    #[error("chain RPC JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("chain RPC error [{code}]: {message}")]
    Rpc { code: i64, message: String },
    #[error("chain RPC returned an empty response")]
    EmptyResponse,
    #[error("malformed chain value: {0}")]
    Malformed(String),
    #[error("transaction encoding error: {0}")]
    Encoding(String),
    #[error("invalid destination address {0:?}")]
    InvalidAddress(String),
    #[error("invalid transfer amount {0}")]
    InvalidAmount(String),
    #[error("no transfers to submit")]
    EmptyBatch,
    #[error("blockhash expired before {0} was confirmed")]
    BlockHeightExceeded(Signature),
    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },
    #[error("wallet provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Blockhash plus the last block height at which it is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// What `confirm_transaction` waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationStrategy {
    pub signature: Signature,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Final status of a confirmed signature. `err` carries the on-chain
/// failure as reported by the node, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub slot: u64,
    pub err: Option<serde_json::Value>,
}

/// Network connection used to fetch blockhashes, broadcast and confirm.
#[async_trait]
pub trait ChainConnection: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, ChainError>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError>;

    /// Waits until the signature reaches the connection's commitment or
    /// the blockhash expires.
    async fn confirm_transaction(
        &self,
        strategy: &ConfirmationStrategy,
    ) -> Result<Confirmation, ChainError>;
}
