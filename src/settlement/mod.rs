mod history;
mod workflow;

#[cfg(test)]
mod tests;

use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::backend::BackendError;
use crate::chain::ChainError;

pub use history::{HistoryEntry, HistoryLog, UNKNOWN_OPERATOR};
pub use workflow::{
    BulkSettlement, SettlementOutcome, APPROVE_FAILED_MESSAGE, LOSE_ORIGIN_MESSAGE,
    REJECT_FAILED_MESSAGE,
};

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("no requests selected")]
    NothingSelected,
    #[error("none of the selected requests are still pending")]
    EmptyBatch,
    #[error("cannot approve requests originating from a loss: {}", ids.join(", "))]
    LoseOriginInApproval { ids: Vec<String> },
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    /// Funds moved on chain but the backend never recorded it.
    #[error("transfer {signature} confirmed but the backend was not updated: {source}")]
    Unreconciled {
        signature: Signature,
        source: BackendError,
    },
}
