use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::{debug, error, info, warn};

use super::{ActionOrigin, WithdrawalRequest, WithdrawalStatus};
use crate::backend::{Backend, BackendError, PendingWithdrawal};

/// Banner text shown when the pending list cannot be loaded.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load withdrawal requests";

/// Working set of pending requests fetched from the backend.
pub struct RequestStore {
    backend: Arc<dyn Backend>,
    requests: Vec<WithdrawalRequest>,
    error: Option<String>,
    loaded: bool,
}

impl RequestStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            requests: Vec::new(),
            error: None,
            loaded: false,
        }
    }

    /// Replaces the working set with the backend's pending list.
    ///
    /// Any failure empties the list and sets the error banner. Returns
    /// whether the load succeeded.
    pub async fn load(&mut self) -> bool {
        self.loaded = true;
        match self.fetch().await {
            Ok(requests) => {
                info!("Loaded {} withdrawal request(s)", requests.len());
                self.requests = requests;
                self.error = None;
                true
            }
            Err(err) => {
                error!("Error fetching withdrawals: {}", err);
                self.requests.clear();
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
                false
            }
        }
    }

    /// Rows that cannot be read are logged and left out; the rest stay settleable.
    async fn fetch(&self) -> Result<Vec<WithdrawalRequest>, BackendError> {
        let rows = self.backend.pending_withdrawals().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match WithdrawalRequest::try_from(row) {
                Ok(request) => Some(request),
                Err(err) => {
                    warn!("Skipping pending row: {}", err);
                    None
                }
            })
            .collect())
    }

    pub fn requests(&self) -> &[WithdrawalRequest] {
        &self.requests
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn get(&self, id: &str) -> Option<&WithdrawalRequest> {
        self.requests.iter().find(|request| request.id == id)
    }

    /// Resolves identifiers to requests in the order given, dropping unknown ones.
    pub fn resolve(&self, ids: &[String]) -> Vec<WithdrawalRequest> {
        ids.iter()
            .filter_map(|id| {
                let found = self.get(id).cloned();
                if found.is_none() {
                    debug!("Dropping stale request id {}", id);
                }
                found
            })
            .collect()
    }
}

impl TryFrom<PendingWithdrawal> for WithdrawalRequest {
    type Error = BackendError;

    fn try_from(row: PendingWithdrawal) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&row.created_at).ok_or_else(|| {
            BackendError::Rejected(format!(
                "withdrawal {} has unreadable created_at {:?}",
                row.id, row.created_at
            ))
        })?;
        let action: ActionOrigin = row.transaction_type.parse().map_err(|err| {
            BackendError::Rejected(format!("withdrawal {}: {}", row.id, err))
        })?;
        let status = WithdrawalStatus::from_backend(&row.status).ok_or_else(|| {
            BackendError::Rejected(format!("withdrawal {} has unknown status {:?}", row.id, row.status))
        })?;

        Ok(WithdrawalRequest {
            id: row.id,
            wallet_address: row.wallet_address,
            amount: row.amount,
            timestamp,
            action,
            status,
        })
    }
}

/// RFC 3339, or a zone-less timestamp taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
