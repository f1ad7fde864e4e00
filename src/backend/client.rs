use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use super::dto::{
    AckResponse, CompletedTransaction, CompletedTransactionsRequest, CompletedWithdrawal,
    CompletedWithdrawalsResponse, DashboardMetricsResponse, HouseBalance, PendingWithdrawal,
    PendingWithdrawalsResponse,
};
use super::{Backend, BackendError};
use crate::metrics::DashboardMetrics;

const PENDING_WITHDRAWALS: &str = "api/admin/pending-withdrawals";
const COMPLETED_TRANSACTIONS: &str = "api/admin/completed-transactions";
const COMPLETED_WITHDRAWALS: &str = "api/admin/completed-withdrawals";
const DASHBOARD_METRICS: &str = "api/admin/dashboard-metrics";
const HOUSE_BALANCE: &str = "api/admin/house-balance";

/// Typed HTTP client for the admin API.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Client,
    base: Url,
}

impl HttpBackend {
    /// Builds a client from a string base URL such as `https://api.example.com`.
    pub fn from_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, BackendError> {
        let url = Url::parse(endpoint)
            .map_err(|err| BackendError::InvalidEndpoint(format!("{endpoint}: {err}")))?;
        Self::from_url(url, timeout)
    }

    pub fn from_url(url: Url, timeout: Duration) -> Result<Self, BackendError> {
        if url.cannot_be_a_base() {
            return Err(BackendError::InvalidEndpoint(url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: client,
            base: Self::normalize_base(url),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    fn normalize_base(mut url: Url) -> Url {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }

    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|err| BackendError::InvalidEndpoint(format!("{path}: {err}")))
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, BackendError> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let response = self.inner.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn read_ack(response: reqwest::Response) -> Result<(), BackendError> {
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let ack: AckResponse = serde_json::from_str(&body).unwrap_or_default();
        match ack.success {
            Some(false) => Err(BackendError::Rejected(
                ack.error.unwrap_or_else(|| "request was not accepted".to_string()),
            )),
            _ => Ok(()),
        }
    }
}

fn ensure_success(success: bool, error: Option<String>, what: &str) -> Result<(), BackendError> {
    if success {
        Ok(())
    } else {
        Err(BackendError::Rejected(
            error.unwrap_or_else(|| format!("Failed to fetch {what}")),
        ))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn pending_withdrawals(&self) -> Result<Vec<PendingWithdrawal>, BackendError> {
        let response: PendingWithdrawalsResponse = self.get_json(PENDING_WITHDRAWALS).await?;
        ensure_success(response.success, response.error, "withdrawals")?;
        Ok(response.withdrawals)
    }

    async fn complete_transactions(
        &self,
        transactions: &[CompletedTransaction],
    ) -> Result<(), BackendError> {
        let url = self.url(COMPLETED_TRANSACTIONS)?;
        debug!("POST {} ({} record(s))", url, transactions.len());
        let response = self
            .inner
            .post(url)
            .json(&CompletedTransactionsRequest { transactions })
            .send()
            .await?;
        Self::read_ack(response).await
    }

    async fn completed_withdrawals(&self) -> Result<Vec<CompletedWithdrawal>, BackendError> {
        let response: CompletedWithdrawalsResponse = self.get_json(COMPLETED_WITHDRAWALS).await?;
        ensure_success(response.success, response.error, "completed withdrawals")?;
        Ok(response.withdrawals)
    }

    async fn dashboard_metrics(&self) -> Result<DashboardMetrics, BackendError> {
        let response: DashboardMetricsResponse = self.get_json(DASHBOARD_METRICS).await?;
        ensure_success(response.success, response.error, "metrics")?;
        response
            .metrics
            .ok_or_else(|| BackendError::Rejected("metrics missing from response".to_string()))
    }

    async fn update_house_balance(&self, new_balance: Decimal) -> Result<Decimal, BackendError> {
        let url = self.url(HOUSE_BALANCE)?;
        debug!("PUT {}", url);
        let response = self
            .inner
            .put(url)
            .json(&HouseBalance { new_balance })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }
        let stored: HouseBalance = response.json().await?;
        Ok(stored.new_balance)
    }
}
