mod client;
pub mod dto;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::metrics::DashboardMetrics;

pub use client::HttpBackend;
pub use dto::{CompletedTransaction, CompletedWithdrawal, PendingWithdrawal, SettlementStatus};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("backend transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend transport error: HTTP status {0}")]
    HttpStatus(StatusCode),
    #[error("backend JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// Admin REST API of the wagering backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/admin/pending-withdrawals`
    async fn pending_withdrawals(&self) -> Result<Vec<PendingWithdrawal>, BackendError>;

    /// `POST /api/admin/completed-transactions`
    async fn complete_transactions(
        &self,
        transactions: &[CompletedTransaction],
    ) -> Result<(), BackendError>;

    /// `GET /api/admin/completed-withdrawals`
    async fn completed_withdrawals(&self) -> Result<Vec<CompletedWithdrawal>, BackendError>;

    /// `GET /api/admin/dashboard-metrics`
    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, BackendError>;

    /// `PUT /api/admin/house-balance`, returns the balance the backend stored.
    async fn update_house_balance(&self, new_balance: Decimal) -> Result<Decimal, BackendError>;
}
