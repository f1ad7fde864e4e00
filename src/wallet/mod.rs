mod allowlist;
mod keypair;
mod session;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use thiserror::Error;
use tokio::sync::broadcast;

pub use allowlist::{AllowList, DEFAULT_ALLOWLIST};
pub use keypair::KeypairProvider;
pub use session::{WalletSession, UNAUTHORIZED_WALLET_MESSAGE};

/// Where an operator without a wallet is sent to set one up.
pub const PROVIDER_INSTALL_URL: &str = "https://docs.solanalabs.com/cli/wallets/file-system";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("connection request was rejected: {0}")]
    Rejected(String),
    #[error("wallet has not trusted this console yet")]
    NotTrusted,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("keypair error: {0}")]
    Keypair(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("broadcast failed: {0}")]
    Broadcast(String),
}

/// Out-of-band state changes reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEvent {
    Connect(Pubkey),
    Disconnect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Succeed only if the provider already trusts the console; never prompt.
    pub only_if_trusted: bool,
}

/// Signing identity supplied by a wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn connect(&self, options: ConnectOptions) -> Result<Pubkey, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Signs with the connected identity and broadcasts; the provider does both.
    async fn sign_and_send_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Signature, ProviderError>;
}

/// `abcd...wxyz` form used in headers and history rows.
pub fn abbreviate(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
