//! Plain-text views of the console state.

use std::fmt::Write as _;

use crate::backend::CompletedWithdrawal;
use crate::metrics::DashboardMetrics;
use crate::settlement::HistoryEntry;
use crate::wallet::abbreviate;
use crate::withdrawal::{SelectionSet, WithdrawalFilter};

use super::{PageView, TransactionDetails};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn page(view: &PageView, selection: &SelectionSet, filter: &WithdrawalFilter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Filters: {} | status {} | action {} | search {:?}",
        filter.time_range.label(),
        filter.status.map_or("All", |status| status.as_str()),
        filter.action.map_or("all", |action| action.as_str()),
        filter.search
    );
    let _ = writeln!(
        out,
        "{:<3} {:<12} {:<14} {:>14} {:<20} {:<9} {:<9}",
        "", "ID", "Wallet", "Amount (SOL)", "Requested", "Action", "Status"
    );
    if view.rows.is_empty() {
        let _ = writeln!(out, "    (no withdrawal requests)");
    }
    for row in &view.rows {
        let mark = if selection.contains(&row.id) { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "{:<3} {:<12} {:<14} {:>14} {:<20} {:<9} {:<9}",
            mark,
            row.id,
            abbreviate(&row.wallet_address),
            row.amount,
            row.timestamp.format(TIME_FORMAT),
            row.action,
            row.status
        );
    }
    let _ = write!(
        out,
        "Page {} of {} ({} request(s), {} per page), {} selected",
        view.current_page,
        view.total_pages.max(1),
        view.total_items,
        view.items_per_page,
        selection.len()
    );
    out
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No actions recorded in this session.".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}  {}  {:<8} {} request(s) by {}{}",
            entry.id,
            entry.timestamp.format(TIME_FORMAT),
            entry.action.past_tense(),
            entry.request_ids.len(),
            abbreviate(&entry.performed_by),
            entry
                .signature
                .map(|signature| format!("  tx {}", abbreviate(&signature.to_string())))
                .unwrap_or_default()
        );
    }
    out.trim_end().to_string()
}

pub fn details(details: &TransactionDetails) -> String {
    let entry = &details.entry;
    let mut out = String::new();
    let _ = writeln!(out, "Transaction {}", entry.id);
    let _ = writeln!(out, "  Action:       {}", entry.action.past_tense());
    let _ = writeln!(out, "  Performed by: {}", entry.performed_by);
    let _ = writeln!(out, "  At:           {}", entry.timestamp.format(TIME_FORMAT));
    if let Some(signature) = entry.signature {
        let _ = writeln!(out, "  Signature:    {}", signature);
    }
    let _ = writeln!(out, "  Requests:     {}", entry.request_ids.join(", "));
    for request in &details.requests {
        let _ = writeln!(
            out,
            "    {} {} {} SOL ({})",
            request.id, request.wallet_address, request.amount, request.status
        );
    }
    out.trim_end().to_string()
}

pub fn completed(rows: &[CompletedWithdrawal]) -> String {
    if rows.is_empty() {
        return "No completed withdrawals.".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<14} {:>14} {:<11} {:<14} {}",
        "ID", "Wallet", "Amount (SOL)", "Status", "Signature", "Notes"
    );
    for row in rows {
        let notes = row
            .error_message
            .as_deref()
            .or(row.notes.as_deref())
            .unwrap_or("");
        let _ = writeln!(
            out,
            "{:<12} {:<14} {:>14} {:<11} {:<14} {}",
            row.id,
            abbreviate(&row.wallet_address),
            row.amount,
            if row.is_successful() { "Successful" } else { "Failed" },
            row.signature.as_deref().map(abbreviate).unwrap_or_else(|| "-".to_string()),
            notes
        );
    }
    out.trim_end().to_string()
}

pub fn metrics(metrics: &DashboardMetrics) -> String {
    metrics.summary_lines().join("\n")
}
