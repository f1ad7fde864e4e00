use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tokio::sync::broadcast;

use super::{ConnectOptions, ProviderError, ProviderEvent, WalletProvider};
use crate::chain::ChainConnection;

/// File-system wallet: a local keypair that signs and broadcasts through
/// the chain connection.
///
/// `trusted` plays the role of a previously approved connection: only a
/// trusted provider answers the silent reconnection at start-up.
pub struct KeypairProvider {
    keypair: Keypair,
    trusted: bool,
    connected: AtomicBool,
    chain: Arc<dyn ChainConnection>,
    events: broadcast::Sender<ProviderEvent>,
}

impl KeypairProvider {
    pub fn new(keypair: Keypair, trusted: bool, chain: Arc<dyn ChainConnection>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            keypair,
            trusted,
            connected: AtomicBool::new(false),
            chain,
            events,
        }
    }

    /// Loads the keypair at `path`, or `None` when no wallet is installed there.
    pub fn detect(
        path: &Path,
        trusted: bool,
        chain: Arc<dyn ChainConnection>,
    ) -> Result<Option<Self>, ProviderError> {
        if !path.exists() {
            debug!("No keypair found at {}", path.display());
            return Ok(None);
        }
        let keypair = read_keypair_file(path)
            .map_err(|err| ProviderError::Keypair(format!("{}: {}", path.display(), err)))?;
        Ok(Some(Self::new(keypair, trusted, chain)))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for KeypairProvider {
    async fn connect(&self, options: ConnectOptions) -> Result<Pubkey, ProviderError> {
        if options.only_if_trusted && !self.trusted {
            return Err(ProviderError::NotTrusted);
        }
        let pubkey = self.pubkey();
        self.connected.store(true, Ordering::SeqCst);
        // No receivers is fine.
        let _ = self.events.send(ProviderEvent::Connect(pubkey));
        info!("Keypair wallet {} connected", pubkey);
        Ok(pubkey)
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        if self.connected.swap(false, Ordering::SeqCst) {
            let _ = self.events.send(ProviderEvent::Disconnect);
            info!("Keypair wallet {} disconnected", self.pubkey());
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn sign_and_send_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Signature, ProviderError> {
        if !self.is_connected() {
            return Err(ProviderError::NotConnected);
        }
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|err| ProviderError::Signing(err.to_string()))?;
        self.chain
            .send_transaction(&transaction)
            .await
            .map_err(|err| ProviderError::Broadcast(err.to_string()))
    }
}
