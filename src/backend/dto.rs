use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::metrics::DashboardMetrics;

/// Row of `GET /api/admin/pending-withdrawals`, in backend field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWithdrawal {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub wallet_address: String,
    pub amount: Decimal,
    pub created_at: String,
    pub transaction_type: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PendingWithdrawalsResponse {
    pub success: bool,
    #[serde(default)]
    pub withdrawals: Vec<PendingWithdrawal>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome written back for one settled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Successful,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTransaction {
    pub id: String,
    /// Chain signature, `None` for rejections.
    pub signature: Option<String>,
    pub status: SettlementStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletedTransactionsRequest<'a> {
    pub transactions: &'a [CompletedTransaction],
}

/// Body of an acknowledgement. Any field may be absent.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AckResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Settled withdrawal as listed by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedWithdrawal {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub wallet_address: String,
    pub amount: Decimal,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    pub status: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl CompletedWithdrawal {
    pub fn is_successful(&self) -> bool {
        self.status.eq_ignore_ascii_case("successful")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletedWithdrawalsResponse {
    pub success: bool,
    #[serde(default)]
    pub withdrawals: Vec<CompletedWithdrawal>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardMetricsResponse {
    pub success: bool,
    #[serde(default)]
    pub metrics: Option<DashboardMetrics>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct HouseBalance {
    #[serde(rename = "newBalance", with = "rust_decimal::serde::float")]
    pub new_balance: Decimal,
}

/// Identifiers come back as strings or integers depending on the table.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}
