pub mod render;
pub mod shell;

use std::sync::Arc;

use log::{error, info};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::backend::{Backend, BackendError, CompletedWithdrawal};
use crate::chain::{ChainConnection, TransferExecutor};
use crate::metrics::DashboardMetrics;
use crate::notify::Notifier;
use crate::settlement::{BulkSettlement, HistoryEntry, HistoryLog, SettlementError, SettlementOutcome};
use crate::wallet::WalletSession;
use crate::withdrawal::{
    filter_requests, ActionOrigin, BulkAction, Pagination, RequestStore, SelectionSet, TimeRange,
    WithdrawalFilter, WithdrawalRequest, WithdrawalStatus,
};

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("connect an authorized wallet first")]
    NotConnected,
    #[error("request {0} is not on the current page")]
    NotVisible(String),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// The visible slice of the filtered list plus paging totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub rows: Vec<WithdrawalRequest>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub items_per_page: usize,
}

/// A local history entry together with the requests it covered that
/// are still in the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetails {
    pub entry: HistoryEntry,
    pub requests: Vec<WithdrawalRequest>,
}

/// One operator session: wallet, working set, selection, filters and history.
///
/// Every operation except wallet connection requires a connected,
/// allow-listed wallet.
pub struct AdminConsole {
    session: WalletSession,
    backend: Arc<dyn Backend>,
    store: RequestStore,
    selection: SelectionSet,
    history: HistoryLog,
    settlement: BulkSettlement,
    filter: WithdrawalFilter,
    pagination: Pagination,
}

impl AdminConsole {
    pub fn new(
        session: WalletSession,
        backend: Arc<dyn Backend>,
        chain: Arc<dyn ChainConnection>,
        notifier: Arc<dyn Notifier>,
        page_size: usize,
    ) -> Self {
        let settlement =
            BulkSettlement::new(backend.clone(), TransferExecutor::new(chain), notifier);
        Self {
            session,
            store: RequestStore::new(backend.clone()),
            backend,
            selection: SelectionSet::new(),
            history: HistoryLog::new(),
            settlement,
            filter: WithdrawalFilter {
                status: Some(WithdrawalStatus::Pending),
                ..WithdrawalFilter::default()
            },
            pagination: Pagination::new(1, page_size),
        }
    }

    /// Start-up: silent wallet reconnection, then the first load if it worked.
    pub async fn mount(&mut self) {
        self.session.restore().await;
        if self.session.is_connected() {
            self.store.load().await;
        }
    }

    pub async fn connect(&mut self) {
        self.session.connect().await;
        if self.session.is_connected() && !self.store.is_loaded() {
            self.store.load().await;
        }
    }

    pub async fn disconnect(&mut self) {
        self.session.disconnect().await;
        self.selection.clear();
    }

    /// Picks up provider-side connect/disconnect events.
    pub async fn sync_wallet(&mut self) {
        let was_connected = self.session.is_connected();
        self.session.sync_events().await;
        if was_connected && !self.session.is_connected() {
            self.selection.clear();
        }
        if !was_connected && self.session.is_connected() && !self.store.is_loaded() {
            self.store.load().await;
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn ensure_connected(&self) -> Result<(), ConsoleError> {
        if self.session.is_connected() {
            Ok(())
        } else {
            Err(ConsoleError::NotConnected)
        }
    }

    pub async fn refresh(&mut self) -> Result<bool, ConsoleError> {
        self.ensure_connected()?;
        Ok(self.store.load().await)
    }

    pub fn load_error(&self) -> Option<&str> {
        self.store.error()
    }

    pub fn is_processing(&self) -> bool {
        self.settlement.is_processing()
    }

    pub fn filter(&self) -> &WithdrawalFilter {
        &self.filter
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn set_time_range(&mut self, range: TimeRange) {
        self.filter.time_range = range;
    }

    pub fn set_status_filter(&mut self, status: Option<WithdrawalStatus>) {
        self.filter.status = status;
    }

    pub fn set_action_filter(&mut self, action: Option<ActionOrigin>) {
        self.filter.action = action;
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.search = search.trim().to_string();
    }

    pub fn set_page(&mut self, page: usize) {
        self.pagination = Pagination::new(page, self.pagination.items_per_page);
        self.selection.clear();
    }

    pub fn set_page_size(&mut self, items_per_page: usize) {
        self.pagination = Pagination::new(self.pagination.current_page, items_per_page);
        self.selection.clear();
    }

    pub fn filtered(&self) -> Vec<&WithdrawalRequest> {
        filter_requests(self.store.requests(), &self.filter)
    }

    pub fn page(&self) -> PageView {
        let filtered = self.filtered();
        PageView {
            rows: self
                .pagination
                .slice(&filtered)
                .iter()
                .map(|request| (*request).clone())
                .collect(),
            total_items: filtered.len(),
            total_pages: self.pagination.total_pages(filtered.len()),
            current_page: self.pagination.current_page,
            items_per_page: self.pagination.items_per_page,
        }
    }

    fn visible_ids(&self) -> Vec<String> {
        let filtered = self.filtered();
        self.pagination
            .slice(&filtered)
            .iter()
            .map(|request| request.id.clone())
            .collect()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Flips one visible row; returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> Result<bool, ConsoleError> {
        self.toggle_all(&[id.to_string()])?;
        Ok(self.selection.contains(id))
    }

    /// Flips several visible rows. Nothing changes unless every id is visible.
    pub fn toggle_all(&mut self, ids: &[String]) -> Result<(), ConsoleError> {
        let visible = self.visible_ids();
        if let Some(missing) = ids.iter().find(|id| !visible.contains(id)) {
            return Err(ConsoleError::NotVisible(missing.clone()));
        }
        for id in ids {
            self.selection.toggle(id);
        }
        Ok(())
    }

    pub fn select_all(&mut self, select: bool) {
        let visible = self.visible_ids();
        self.selection
            .select_all(select, visible.iter().map(String::as_str));
    }

    /// Applies `action` to the current selection. The selection is
    /// emptied whatever the outcome.
    pub async fn bulk_action(
        &mut self,
        action: BulkAction,
    ) -> Result<SettlementOutcome, ConsoleError> {
        self.ensure_connected()?;
        let ids = self.selection.ids();
        self.selection.clear();
        self.apply_ids(action, &ids).await
    }

    /// Applies `action` to explicit ids, bypassing the page selection.
    pub async fn apply_to(
        &mut self,
        action: BulkAction,
        ids: &[String],
    ) -> Result<SettlementOutcome, ConsoleError> {
        self.ensure_connected()?;
        self.selection.clear();
        self.apply_ids(action, ids).await
    }

    async fn apply_ids(
        &mut self,
        action: BulkAction,
        ids: &[String],
    ) -> Result<SettlementOutcome, ConsoleError> {
        let outcome = self
            .settlement
            .apply(action, ids, &self.session, &mut self.store, &mut self.history)
            .await?;
        Ok(outcome)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn transaction_details(&self, id: &str) -> Option<TransactionDetails> {
        let entry = self.history.get(id)?.clone();
        let requests = self.store.resolve(&entry.request_ids);
        Some(TransactionDetails { entry, requests })
    }

    /// Settled withdrawals from the backend, optionally narrowed by wallet.
    pub async fn completed_withdrawals(
        &self,
        search: &str,
    ) -> Result<Vec<CompletedWithdrawal>, ConsoleError> {
        self.ensure_connected()?;
        let needle = search.trim().to_lowercase();
        let rows = self.backend.completed_withdrawals().await.map_err(|err| {
            error!("Error fetching completed withdrawals: {}", err);
            err
        })?;
        Ok(rows
            .into_iter()
            .filter(|row| needle.is_empty() || row.wallet_address.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics, ConsoleError> {
        self.ensure_connected()?;
        self.backend.dashboard_metrics().await.map_err(|err| {
            error!("Error fetching metrics: {}", err);
            err.into()
        })
    }

    /// Reloads the working set and the metrics side by side.
    pub async fn refresh_dashboard(&mut self) -> Result<DashboardMetrics, ConsoleError> {
        self.ensure_connected()?;
        let (_, metrics) = futures::join!(self.store.load(), self.backend.dashboard_metrics());
        Ok(metrics?)
    }

    /// Stores a new house balance and returns the re-fetched metrics.
    pub async fn update_house_balance(
        &self,
        new_balance: Decimal,
    ) -> Result<DashboardMetrics, ConsoleError> {
        self.ensure_connected()?;
        let stored = self.backend.update_house_balance(new_balance).await.map_err(|err| {
            error!("Error updating house balance: {}", err);
            err
        })?;
        info!("House balance set to {} SOL", stored);
        self.dashboard_metrics().await
    }
}
