use std::sync::Arc;

use log::{debug, info, warn};
use solana_sdk::pubkey::Pubkey;
use tokio::sync::broadcast::{self, error::TryRecvError};

use super::{AllowList, ConnectOptions, ProviderEvent, WalletProvider, PROVIDER_INSTALL_URL};
use crate::notify::Notifier;

pub const UNAUTHORIZED_WALLET_MESSAGE: &str =
    "This wallet is not authorized to use the withdrawal console.";

/// Connection to the operator's signing identity.
///
/// Built once at start-up and handed to the console. Nothing else in the
/// console runs until `is_connected` holds.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    events: Option<broadcast::Receiver<ProviderEvent>>,
    allowlist: AllowList,
    notifier: Arc<dyn Notifier>,
    public_key: Option<Pubkey>,
}

impl WalletSession {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        allowlist: AllowList,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let events = provider.as_ref().map(|provider| provider.subscribe());
        Self {
            provider,
            events,
            allowlist,
            notifier,
            public_key: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.public_key.is_some()
    }

    pub fn public_key(&self) -> Option<Pubkey> {
        self.public_key
    }

    pub fn provider(&self) -> Option<&dyn WalletProvider> {
        self.provider.as_deref()
    }

    /// Silent reconnection, succeeding only if the provider already trusts us.
    pub async fn restore(&mut self) {
        let Some(provider) = self.provider.clone() else {
            return;
        };
        let result = provider.connect(ConnectOptions { only_if_trusted: true }).await;
        self.discard_events();
        match result {
            Ok(pubkey) => self.adopt(pubkey).await,
            Err(err) => debug!("Silent reconnection skipped: {}", err),
        }
    }

    /// Interactive connection. Provider-side cancellation is logged, not raised.
    pub async fn connect(&mut self) {
        let Some(provider) = self.provider.clone() else {
            self.notifier.info(&format!(
                "No wallet found. Set one up first: {}",
                PROVIDER_INSTALL_URL
            ));
            return;
        };
        let result = provider.connect(ConnectOptions::default()).await;
        self.discard_events();
        match result {
            Ok(pubkey) => self.adopt(pubkey).await,
            Err(err) => warn!("Error connecting wallet: {}", err),
        }
    }

    pub async fn disconnect(&mut self) {
        if let Some(provider) = self.provider.clone() {
            if let Err(err) = provider.disconnect().await {
                warn!("Error disconnecting wallet: {}", err);
            }
        }
        self.discard_events();
        self.clear();
    }

    /// Applies connect/disconnect events raised by the provider since the last call.
    pub async fn sync_events(&mut self) {
        loop {
            let event = match self.events.as_mut().map(|events| events.try_recv()) {
                Some(Ok(event)) => event,
                Some(Err(TryRecvError::Lagged(skipped))) => {
                    warn!("Missed {} wallet event(s)", skipped);
                    continue;
                }
                Some(Err(TryRecvError::Empty)) | Some(Err(TryRecvError::Closed)) | None => break,
            };
            match event {
                ProviderEvent::Connect(pubkey) => self.adopt(pubkey).await,
                ProviderEvent::Disconnect => self.clear(),
            }
        }
    }

    /// Identity changes pass through the allow-list; anything else is
    /// disconnected on the spot.
    async fn adopt(&mut self, pubkey: Pubkey) {
        if self.public_key == Some(pubkey) {
            return;
        }
        if !self.allowlist.contains(&pubkey) {
            warn!("Wallet {} is not on the allow-list", pubkey);
            if let Some(provider) = self.provider.clone() {
                if let Err(err) = provider.disconnect().await {
                    warn!("Error disconnecting wallet: {}", err);
                }
            }
            self.clear();
            self.notifier.alert(UNAUTHORIZED_WALLET_MESSAGE);
            return;
        }
        info!("Wallet {} connected", pubkey);
        self.public_key = Some(pubkey);
    }

    /// Drops queued events; a direct provider answer supersedes them.
    fn discard_events(&mut self) {
        if let Some(events) = self.events.as_mut() {
            while !matches!(events.try_recv(), Err(TryRecvError::Empty) | Err(TryRecvError::Closed)) {}
        }
    }

    fn clear(&mut self) {
        if let Some(pubkey) = self.public_key.take() {
            info!("Wallet {} disconnected", pubkey);
        }
    }
}
