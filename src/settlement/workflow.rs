use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use super::{HistoryEntry, HistoryLog, SettlementError};
use crate::backend::{Backend, CompletedTransaction, SettlementStatus};
use crate::chain::{Transfer, TransferExecutor};
use crate::notify::{Notifier, SETTLED_MESSAGE};
use crate::wallet::{WalletProvider, WalletSession};
use crate::withdrawal::{ActionOrigin, BulkAction, RequestStore, WithdrawalRequest};

pub const LOSE_ORIGIN_MESSAGE: &str =
    "Cannot approve requests with \"lose\" action. Please deselect these items.";
pub const APPROVE_FAILED_MESSAGE: &str = "Failed to process transfers. Please try again.";
pub const REJECT_FAILED_MESSAGE: &str = "Failed to reject transactions. Please try again.";

/// What a bulk action ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Written to the backend (and, for approvals, paid on chain).
    Settled {
        action: BulkAction,
        entry_id: String,
        request_ids: Vec<String>,
        signature: Option<Signature>,
    },
    /// Only added to the local history.
    Recorded { entry_id: String },
    /// Approval attempted without a connected wallet; nothing happened.
    Skipped,
}

/// Runs approve/reject/review over a set of request ids.
///
/// Raises the `processing` flag for the duration of a backend or chain
/// round trip. `apply` takes `&mut self`, so the flag only backs the
/// `is_processing` query; overlapping batches cannot be expressed.
pub struct BulkSettlement {
    backend: Arc<dyn Backend>,
    executor: TransferExecutor,
    notifier: Arc<dyn Notifier>,
    processing: bool,
}

impl BulkSettlement {
    pub fn new(
        backend: Arc<dyn Backend>,
        executor: TransferExecutor,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            executor,
            notifier,
            processing: false,
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub async fn apply(
        &mut self,
        action: BulkAction,
        ids: &[String],
        session: &WalletSession,
        store: &mut RequestStore,
        history: &mut HistoryLog,
    ) -> Result<SettlementOutcome, SettlementError> {
        if ids.is_empty() {
            return Err(self.refuse(SettlementError::NothingSelected));
        }

        match action {
            BulkAction::Approve => self.approve(ids, session, store, history).await,
            BulkAction::Reject => self.reject(ids, session, store, history).await,
            BulkAction::Review => {
                let entry = history.record(HistoryEntry::new(
                    BulkAction::Review,
                    ids.to_vec(),
                    operator(session),
                    None,
                ));
                info!("Recorded review of {} request(s) as {}", ids.len(), entry.id);
                Ok(SettlementOutcome::Recorded {
                    entry_id: entry.id.clone(),
                })
            }
        }
    }

    async fn approve(
        &mut self,
        ids: &[String],
        session: &WalletSession,
        store: &mut RequestStore,
        history: &mut HistoryLog,
    ) -> Result<SettlementOutcome, SettlementError> {
        let (Some(provider), Some(payer)) = (session.provider(), session.public_key()) else {
            warn!("Approval requested without a connected wallet");
            return Ok(SettlementOutcome::Skipped);
        };

        let requests = self.resolve(ids, store)?;
        let lose_ids: Vec<String> = requests
            .iter()
            .filter(|request| request.action == ActionOrigin::Lose)
            .map(|request| request.id.clone())
            .collect();
        if !lose_ids.is_empty() {
            self.notifier.alert(LOSE_ORIGIN_MESSAGE);
            return Err(SettlementError::LoseOriginInApproval { ids: lose_ids });
        }
        // Eligibility is enforced by the backend; here it is only reported.
        for request in requests.iter().filter(|request| !request.status.is_approvable()) {
            warn!(
                "Request {} is {} and may not be eligible for approval",
                request.id, request.status
            );
        }

        self.processing = true;
        let result = self.pay_out(provider, &payer, &requests).await;
        self.processing = false;

        let signature = match result {
            Ok(signature) => signature,
            Err(err) => {
                match &err {
                    SettlementError::Unreconciled { signature, source } => {
                        error!(
                            "Transfer {} confirmed on chain but the backend update failed: {}. Reconcile manually before retrying.",
                            signature, source
                        );
                        self.notifier.alert(&format!(
                            "Transfers were sent (signature {signature}) but could not be recorded. Do not retry; reconcile these requests manually."
                        ));
                    }
                    other => {
                        error!("Error processing transfers: {}", other);
                        self.notifier.alert(APPROVE_FAILED_MESSAGE);
                    }
                }
                return Err(err);
            }
        };

        Ok(self
            .finish(BulkAction::Approve, &requests, Some(signature), session, store, history)
            .await)
    }

    async fn reject(
        &mut self,
        ids: &[String],
        session: &WalletSession,
        store: &mut RequestStore,
        history: &mut HistoryLog,
    ) -> Result<SettlementOutcome, SettlementError> {
        let requests = self.resolve(ids, store)?;
        let records = completion_records(&requests, None, SettlementStatus::Failed);

        self.processing = true;
        let result = self.backend.complete_transactions(&records).await;
        self.processing = false;

        if let Err(err) = result {
            error!("Error rejecting transactions: {}", err);
            self.notifier.alert(REJECT_FAILED_MESSAGE);
            return Err(err.into());
        }

        Ok(self
            .finish(BulkAction::Reject, &requests, None, session, store, history)
            .await)
    }

    async fn pay_out(
        &self,
        provider: &dyn WalletProvider,
        payer: &Pubkey,
        requests: &[WithdrawalRequest],
    ) -> Result<Signature, SettlementError> {
        let transfers: Vec<Transfer> = requests
            .iter()
            .map(|request| Transfer {
                destination: request.wallet_address.clone(),
                amount: request.amount,
            })
            .collect();

        let signature = self.executor.transfer_bulk(provider, payer, &transfers).await?;

        let records =
            completion_records(requests, Some(signature), SettlementStatus::Successful);
        self.backend
            .complete_transactions(&records)
            .await
            .map_err(|source| SettlementError::Unreconciled { signature, source })?;
        Ok(signature)
    }

    /// Backend acknowledged: notify, remember the batch and refresh.
    async fn finish(
        &self,
        action: BulkAction,
        requests: &[WithdrawalRequest],
        signature: Option<Signature>,
        session: &WalletSession,
        store: &mut RequestStore,
        history: &mut HistoryLog,
    ) -> SettlementOutcome {
        let request_ids: Vec<String> = requests.iter().map(|request| request.id.clone()).collect();
        self.notifier.success(SETTLED_MESSAGE);
        let entry_id = history
            .record(HistoryEntry::new(
                action,
                request_ids.clone(),
                operator(session),
                signature,
            ))
            .id
            .clone();
        info!(
            "{} {} request(s), history entry {}",
            action.past_tense(),
            request_ids.len(),
            entry_id
        );

        store.load().await;
        SettlementOutcome::Settled {
            action,
            entry_id,
            request_ids,
            signature,
        }
    }

    fn resolve(
        &self,
        ids: &[String],
        store: &RequestStore,
    ) -> Result<Vec<WithdrawalRequest>, SettlementError> {
        let requests = store.resolve(ids);
        if requests.is_empty() {
            return Err(self.refuse(SettlementError::EmptyBatch));
        }
        Ok(requests)
    }

    fn refuse(&self, err: SettlementError) -> SettlementError {
        warn!("Bulk action refused: {}", err);
        self.notifier.info(&format!("Nothing to do: {err}."));
        err
    }
}

fn operator(session: &WalletSession) -> Option<String> {
    session.public_key().map(|key| key.to_string())
}

/// One record per request, all sharing the batch signature.
fn completion_records(
    requests: &[WithdrawalRequest],
    signature: Option<Signature>,
    status: SettlementStatus,
) -> Vec<CompletedTransaction> {
    let updated_at = Utc::now();
    requests
        .iter()
        .map(|request| CompletedTransaction {
            id: request.id.clone(),
            signature: signature.map(|signature| signature.to_string()),
            status,
            updated_at,
        })
        .collect()
}
