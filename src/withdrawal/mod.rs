pub mod filter;
pub mod pagination;
pub mod selection;
pub mod store;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use filter::{filter_requests, filter_requests_at, TimeRange, WithdrawalFilter};
pub use pagination::{Pagination, DEFAULT_PAGE_SIZE};
pub use selection::SelectionSet;
pub use store::{RequestStore, LOAD_ERROR_MESSAGE};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseValueError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseValueError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Game event that produced the balance movement behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionOrigin {
    Win,
    Lose,
    Withdraw,
}

impl ActionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOrigin::Win => "win",
            ActionOrigin::Lose => "lose",
            ActionOrigin::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for ActionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionOrigin {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" => Ok(ActionOrigin::Win),
            "lose" => Ok(ActionOrigin::Lose),
            "withdraw" => Ok(ActionOrigin::Withdraw),
            _ => Err(ParseValueError::new("action origin", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    /// Maps the backend status text onto the display status.
    ///
    /// The backend stores lowercase values and calls settled records
    /// `successful`/`failed`; both spellings are accepted.
    pub fn from_backend(raw: &str) -> Option<Self> {
        match capitalize(raw.trim()).as_str() {
            "Pending" => Some(WithdrawalStatus::Pending),
            "Approved" | "Successful" => Some(WithdrawalStatus::Approved),
            "Rejected" | "Failed" => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }

    /// Pending and previously rejected requests may be paid out.
    pub fn is_approvable(&self) -> bool {
        matches!(self, WithdrawalStatus::Pending | WithdrawalStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "Pending",
            WithdrawalStatus::Approved => "Approved",
            WithdrawalStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_backend(s).ok_or_else(|| ParseValueError::new("status", s))
    }
}

/// Operator intent applied to a selection of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Approve,
    Reject,
    Review,
}

impl BulkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Approve => "approve",
            BulkAction::Reject => "reject",
            BulkAction::Review => "review",
        }
    }

    /// Past-tense label used by the history views.
    pub fn past_tense(&self) -> &'static str {
        match self {
            BulkAction::Approve => "Approved",
            BulkAction::Reject => "Rejected",
            BulkAction::Review => "Reviewed",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkAction {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(BulkAction::Approve),
            "reject" => Ok(BulkAction::Reject),
            "review" => Ok(BulkAction::Review),
            _ => Err(ParseValueError::new("bulk action", s)),
        }
    }
}

/// A player's request to move balance out to their wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: String,
    pub wallet_address: String,
    /// Amount in SOL.
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub action: ActionOrigin,
    pub status: WithdrawalStatus,
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
