//! In-process fakes for the backend, chain, wallet and notifier seams.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use tokio::sync::broadcast;

use crate::backend::{
    Backend, BackendError, CompletedTransaction, CompletedWithdrawal, PendingWithdrawal,
    SettlementStatus,
};
use crate::chain::{
    ChainConnection, ChainError, Confirmation, ConfirmationStrategy, LatestBlockhash,
};
use crate::metrics::DashboardMetrics;
use crate::notify::Notifier;
use crate::wallet::{
    AllowList, ConnectOptions, KeypairProvider, ProviderError, ProviderEvent, WalletProvider,
};
use crate::withdrawal::{ActionOrigin, WithdrawalRequest, WithdrawalStatus};

pub fn sol(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

pub fn request(id: &str, wallet: &str, amount: &str, timestamp: DateTime<Utc>) -> WithdrawalRequest {
    WithdrawalRequest {
        id: id.to_string(),
        wallet_address: wallet.to_string(),
        amount: sol(amount),
        timestamp,
        action: ActionOrigin::Withdraw,
        status: WithdrawalStatus::Pending,
    }
}

pub fn pending_row(id: &str, wallet: &str, amount: &str, kind: &str, status: &str) -> PendingWithdrawal {
    PendingWithdrawal {
        id: id.to_string(),
        wallet_address: wallet.to_string(),
        amount: sol(amount),
        created_at: "2024-05-01T10:00:00Z".to_string(),
        transaction_type: kind.to_string(),
        status: status.to_string(),
    }
}

pub fn metrics(house_balance: &str) -> DashboardMetrics {
    DashboardMetrics {
        total_bets: Decimal::from(12),
        total_wagered: sol("40.5"),
        total_lost: sol("22"),
        total_won: sol("18.5"),
        house_balance: sol(house_balance),
        total_withdrawn: sol("3"),
        pending_withdrawals: sol("1.25"),
        pending_withdrawal_count: Some(2),
    }
}

/// Backend double that keeps pending rows in memory and records every
/// completion batch it receives.
pub struct FakeBackend {
    pending: Mutex<Vec<PendingWithdrawal>>,
    completed: Mutex<Vec<CompletedWithdrawal>>,
    posted: Mutex<Vec<Vec<CompletedTransaction>>>,
    metrics: Mutex<DashboardMetrics>,
    fail_pending: AtomicBool,
    fail_complete: AtomicBool,
    pending_calls: AtomicUsize,
    complete_calls: AtomicUsize,
    metrics_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with_pending(rows: Vec<PendingWithdrawal>) -> Self {
        Self {
            pending: Mutex::new(rows),
            completed: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
            metrics: Mutex::new(metrics("100")),
            fail_pending: AtomicBool::new(false),
            fail_complete: AtomicBool::new(false),
            pending_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
            metrics_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_pending(&self, fail: bool) {
        self.fail_pending.store(fail, Ordering::SeqCst);
    }

    pub fn fail_complete(&self, fail: bool) {
        self.fail_complete.store(fail, Ordering::SeqCst);
    }

    pub fn posted(&self) -> Vec<Vec<CompletedTransaction>> {
        self.posted.lock().unwrap().clone()
    }

    pub fn pending_calls(&self) -> usize {
        self.pending_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn metrics_calls(&self) -> usize {
        self.metrics_calls.load(Ordering::SeqCst)
    }

    fn rejected(&self, what: &str) -> BackendError {
        BackendError::Rejected(format!("{what} unavailable"))
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn pending_withdrawals(&self) -> Result<Vec<PendingWithdrawal>, BackendError> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pending.load(Ordering::SeqCst) {
            return Err(self.rejected("pending withdrawals"));
        }
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn complete_transactions(
        &self,
        transactions: &[CompletedTransaction],
    ) -> Result<(), BackendError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.posted.lock().unwrap().push(transactions.to_vec());
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(self.rejected("completion endpoint"));
        }

        let mut pending = self.pending.lock().unwrap();
        let mut completed = self.completed.lock().unwrap();
        for transaction in transactions {
            if let Some(index) = pending.iter().position(|row| row.id == transaction.id) {
                let row = pending.remove(index);
                completed.push(CompletedWithdrawal {
                    id: row.id,
                    wallet_address: row.wallet_address,
                    amount: row.amount,
                    created_at: Some(row.created_at),
                    transaction_type: Some(row.transaction_type),
                    status: match transaction.status {
                        SettlementStatus::Successful => "successful".to_string(),
                        SettlementStatus::Failed => "failed".to_string(),
                    },
                    signature: transaction.signature.clone(),
                    notes: None,
                    error_message: None,
                });
            }
        }
        Ok(())
    }

    async fn completed_withdrawals(&self) -> Result<Vec<CompletedWithdrawal>, BackendError> {
        Ok(self.completed.lock().unwrap().clone())
    }

    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, BackendError> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.metrics.lock().unwrap().clone())
    }

    async fn update_house_balance(&self, new_balance: Decimal) -> Result<Decimal, BackendError> {
        self.metrics.lock().unwrap().house_balance = new_balance;
        Ok(new_balance)
    }
}

/// Chain double: accepts every transaction and confirms it immediately,
/// unless told to report an on-chain error.
pub struct FakeChain {
    sent: Mutex<Vec<Signature>>,
    confirmation_err: Mutex<Option<Value>>,
    blockhash_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            confirmation_err: Mutex::new(None),
            blockhash_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_confirmation(&self, err: Value) {
        *self.confirmation_err.lock().unwrap() = Some(err);
    }

    pub fn sent_signatures(&self) -> Vec<Signature> {
        self.sent.lock().unwrap().clone()
    }

    pub fn blockhash_calls(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    /// Chain calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.blockhash_calls() + self.sent.lock().unwrap().len() + self.confirm_calls()
    }
}

#[async_trait]
impl ChainConnection for FakeChain {
    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash, ChainError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(LatestBlockhash {
            blockhash: Hash::new_unique(),
            last_valid_block_height: 150,
        })
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        let signature = transaction
            .signatures
            .first()
            .copied()
            .ok_or(ChainError::EmptyResponse)?;
        self.sent.lock().unwrap().push(signature);
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        _strategy: &ConfirmationStrategy,
    ) -> Result<Confirmation, ChainError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Confirmation {
            slot: 42,
            err: self.confirmation_err.lock().unwrap().clone(),
        })
    }
}

/// Keypair wallet wired to a fake chain.
pub struct TestWallet {
    pub provider: Arc<KeypairProvider>,
    pub chain: Arc<FakeChain>,
}

impl TestWallet {
    pub fn trusted(chain: Arc<FakeChain>) -> Self {
        Self::build(true, chain)
    }

    pub fn trusted_default() -> Self {
        Self::build(true, Arc::new(FakeChain::new()))
    }

    pub fn untrusted_default() -> Self {
        Self::build(false, Arc::new(FakeChain::new()))
    }

    fn build(trusted: bool, chain: Arc<FakeChain>) -> Self {
        let provider = Arc::new(KeypairProvider::new(Keypair::new(), trusted, chain.clone()));
        Self { provider, chain }
    }

    /// Allow-list holding only this wallet.
    pub fn allowlist(&self) -> AllowList {
        AllowList::new([self.provider.pubkey()])
    }
}

/// Provider whose operator dismisses every connection prompt.
pub struct CancellingProvider {
    events: broadcast::Sender<ProviderEvent>,
}

impl Default for CancellingProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(4);
        Self { events }
    }
}

#[async_trait]
impl WalletProvider for CancellingProvider {
    async fn connect(&self, _options: ConnectOptions) -> Result<Pubkey, ProviderError> {
        Err(ProviderError::Rejected("User rejected the request.".to_string()))
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn sign_and_send_transaction(
        &self,
        _transaction: Transaction,
    ) -> Result<Signature, ProviderError> {
        Err(ProviderError::NotConnected)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
    successes: Mutex<Vec<String>>,
    infos: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }
}
