use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Signature;

use crate::withdrawal::BulkAction;

/// Shown when an entry was recorded without a connected wallet.
pub const UNKNOWN_OPERATOR: &str = "Unknown";

/// One bulk action as remembered by this console session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub action: BulkAction,
    pub request_ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub performed_by: String,
    pub signature: Option<Signature>,
}

impl HistoryEntry {
    pub fn new(
        action: BulkAction,
        request_ids: Vec<String>,
        performed_by: Option<String>,
        signature: Option<Signature>,
    ) -> Self {
        Self {
            id: new_entry_id(),
            action,
            request_ids,
            timestamp: Utc::now(),
            performed_by: performed_by.unwrap_or_else(|| UNKNOWN_OPERATOR.to_string()),
            signature,
        }
    }
}

fn new_entry_id() -> String {
    let mut bytes = [0u8; 5];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session-local log of bulk actions, newest first. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) -> &HistoryEntry {
        self.entries.insert(0, entry);
        &self.entries[0]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
