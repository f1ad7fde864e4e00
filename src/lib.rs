/*!
Withdrawal Console - operator tooling for settling pending balance withdrawals

This crate implements the admin console used to review pending withdrawal
requests of the wagering backend and to settle them in bulk. Approvals are
paid out with a single batched SOL transfer signed by the operator wallet;
rejections are only recorded on the backend.

# Main Components

- `wallet`: wallet provider abstraction, the keypair-file provider and the allow-list gated session
- `withdrawal`: withdrawal request model, filtering, pagination, selection and the request store
- `chain`: JSON-RPC chain connection and the batched transfer executor
- `backend`: typed HTTP client for the admin REST API
- `settlement`: the bulk approve/reject workflow and the local history log
- `console`: the composition root tying everything into one operator session, plus its text views and interactive shell
- `cli`: command-line entry point and one-shot commands

# Example Usage

```rust,no_run
use std::sync::Arc;
use withdrawal_console::{
    AdminConsole, AllowList, ConsoleNotifier, HttpBackend, RpcChainClient, WalletSession,
};
use withdrawal_console::chain::Commitment;

# async fn run() -> anyhow::Result<()> {
let timeout = std::time::Duration::from_secs(30);
let poll = std::time::Duration::from_millis(500);
let chain = Arc::new(RpcChainClient::from_endpoint(
    "https://api.devnet.solana.com",
    timeout,
    poll,
    Commitment::Confirmed,
)?);
let backend = Arc::new(HttpBackend::from_endpoint("http://localhost:3000", timeout)?);
let notifier = Arc::new(ConsoleNotifier);
let session = WalletSession::new(None, AllowList::default(), notifier.clone());
let mut console = AdminConsole::new(session, backend, chain, notifier, 10);
console.mount().await;
# Ok(())
# }
```
*/

/// Wallet provider abstraction and the allow-list gated operator session.
pub mod wallet;

/// Withdrawal request model and the client-side list operations.
pub mod withdrawal;

/// Chain connectivity and the batched transfer executor.
pub mod chain;

/// Typed client for the admin REST API.
pub mod backend;

/// Bulk settlement workflow and the local history log.
pub mod settlement;

/// Operator session composition root.
pub mod console;

/// Runtime configuration.
pub mod config;

/// Dashboard metrics snapshot.
pub mod metrics;

/// Operator-facing alerts and banners.
pub mod notify;

/// Command-line interface for operating the console.
pub mod cli;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use backend::{Backend, BackendError, HttpBackend};
pub use chain::{ChainConnection, ChainError, RpcChainClient, TransferExecutor};
pub use config::{ConfigArgs, ConsoleConfig};
pub use console::{AdminConsole, ConsoleError};
pub use metrics::DashboardMetrics;
pub use notify::{ConsoleNotifier, Notifier};
pub use settlement::{BulkSettlement, HistoryEntry, HistoryLog, SettlementError, SettlementOutcome};
pub use wallet::{AllowList, KeypairProvider, WalletProvider, WalletSession};
pub use withdrawal::{
    ActionOrigin, BulkAction, RequestStore, SelectionSet, WithdrawalFilter, WithdrawalRequest,
    WithdrawalStatus,
};
