#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use solana_sdk::pubkey::Pubkey;

    use crate::backend::{PendingWithdrawal, SettlementStatus};
    use crate::chain::TransferExecutor;
    use crate::notify::SETTLED_MESSAGE;
    use crate::settlement::{
        BulkSettlement, HistoryLog, SettlementError, SettlementOutcome, APPROVE_FAILED_MESSAGE,
        LOSE_ORIGIN_MESSAGE, REJECT_FAILED_MESSAGE, UNKNOWN_OPERATOR,
    };
    use crate::testing::{pending_row, FakeBackend, FakeChain, RecordingNotifier, TestWallet};
    use crate::wallet::WalletSession;
    use crate::withdrawal::{BulkAction, RequestStore};

    struct Scenario {
        backend: Arc<FakeBackend>,
        chain: Arc<FakeChain>,
        notifier: Arc<RecordingNotifier>,
        session: WalletSession,
        store: RequestStore,
        history: HistoryLog,
        settlement: BulkSettlement,
    }

    impl Scenario {
        async fn new(rows: Vec<PendingWithdrawal>) -> Self {
            let backend = Arc::new(FakeBackend::with_pending(rows));
            let chain = Arc::new(FakeChain::new());
            let notifier = Arc::new(RecordingNotifier::default());
            let wallet = TestWallet::trusted(chain.clone());
            let mut session = WalletSession::new(
                Some(wallet.provider.clone()),
                wallet.allowlist(),
                notifier.clone(),
            );
            session.connect().await;
            assert!(session.is_connected());

            let mut store = RequestStore::new(backend.clone());
            assert!(store.load().await);
            let settlement = BulkSettlement::new(
                backend.clone(),
                TransferExecutor::new(chain.clone()),
                notifier.clone(),
            );

            Self {
                backend,
                chain,
                notifier,
                session,
                store,
                history: HistoryLog::new(),
                settlement,
            }
        }

        async fn apply(
            &mut self,
            action: BulkAction,
            ids: &[&str],
        ) -> Result<SettlementOutcome, SettlementError> {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            self.settlement
                .apply(action, &ids, &self.session, &mut self.store, &mut self.history)
                .await
        }
    }

    fn wallet() -> String {
        Pubkey::new_unique().to_string()
    }

    #[tokio::test]
    async fn test_lose_origin_blocks_the_whole_approval() {
        let mut scenario = Scenario::new(vec![
            pending_row("w-1", &wallet(), "1", "win", "pending"),
            pending_row("w-2", &wallet(), "2", "lose", "pending"),
            pending_row("w-3", &wallet(), "3", "withdraw", "pending"),
        ])
        .await;

        let result = scenario.apply(BulkAction::Approve, &["w-1", "w-2", "w-3"]).await;

        match result {
            Err(SettlementError::LoseOriginInApproval { ids }) => assert_eq!(ids, vec!["w-2"]),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(scenario.notifier.alerts(), vec![LOSE_ORIGIN_MESSAGE.to_string()]);
        assert_eq!(scenario.backend.complete_calls(), 0);
        assert_eq!(scenario.chain.total_calls(), 0);
        assert_eq!(scenario.store.requests().len(), 3);
        assert!(scenario.history.is_empty());
    }

    #[tokio::test]
    async fn test_approval_shares_one_signature_across_the_batch() {
        let mut scenario = Scenario::new(vec![
            pending_row("w-1", &wallet(), "1.5", "win", "pending"),
            pending_row("w-2", &wallet(), "2.25", "withdraw", "pending"),
        ])
        .await;

        let outcome = scenario
            .apply(BulkAction::Approve, &["w-1", "w-2"])
            .await
            .unwrap();

        let sent = scenario.chain.sent_signatures();
        assert_eq!(sent.len(), 1);
        let posted = scenario.backend.posted();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].len(), 2);
        for record in &posted[0] {
            assert_eq!(record.signature, Some(sent[0].to_string()));
            assert_eq!(record.status, SettlementStatus::Successful);
        }

        match outcome {
            SettlementOutcome::Settled { signature, request_ids, .. } => {
                assert_eq!(signature, Some(sent[0]));
                assert_eq!(request_ids, vec!["w-1", "w-2"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(scenario.notifier.successes(), vec![SETTLED_MESSAGE.to_string()]);
        assert_eq!(scenario.history.entries()[0].signature, Some(sent[0]));
        assert!(scenario.store.requests().is_empty());
        assert!(!scenario.settlement.is_processing());
    }

    #[tokio::test]
    async fn test_rejection_posts_failed_records_without_touching_the_chain() {
        let mut scenario = Scenario::new(vec![
            pending_row("w-1", &wallet(), "1", "win", "pending"),
            pending_row("w-2", &wallet(), "2", "lose", "pending"),
            pending_row("w-3", &wallet(), "3", "withdraw", "rejected"),
        ])
        .await;

        scenario
            .apply(BulkAction::Reject, &["w-1", "w-2", "w-3"])
            .await
            .unwrap();

        let posted = scenario.backend.posted();
        assert_eq!(posted[0].len(), 3);
        assert!(posted[0]
            .iter()
            .all(|record| record.signature.is_none() && record.status == SettlementStatus::Failed));
        assert_eq!(scenario.chain.total_calls(), 0);
        assert_eq!(scenario.history.entries()[0].action, BulkAction::Reject);
        assert!(scenario.store.requests().is_empty());
    }

    #[tokio::test]
    async fn test_review_is_local_only() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "pending")]).await;
        let pending_calls = scenario.backend.pending_calls();

        let outcome = scenario.apply(BulkAction::Review, &["w-1"]).await.unwrap();

        assert!(matches!(outcome, SettlementOutcome::Recorded { .. }));
        assert_eq!(scenario.history.len(), 1);
        assert_eq!(scenario.backend.complete_calls(), 0);
        assert_eq!(scenario.backend.pending_calls(), pending_calls);
        assert_eq!(scenario.chain.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_on_chain_failure_alerts_and_leaves_the_store_alone() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "pending")]).await;
        scenario
            .chain
            .fail_confirmation(serde_json::json!({"InstructionError": [0, "InsufficientFunds"]}));

        let result = scenario.apply(BulkAction::Approve, &["w-1"]).await;

        assert!(matches!(result, Err(SettlementError::Chain(_))));
        assert_eq!(scenario.notifier.alerts(), vec![APPROVE_FAILED_MESSAGE.to_string()]);
        assert_eq!(scenario.backend.complete_calls(), 0);
        assert_eq!(scenario.store.requests().len(), 1);
        assert!(scenario.history.is_empty());
        assert!(!scenario.settlement.is_processing());
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_block_the_next_one() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "pending")]).await;
        scenario.backend.fail_complete(true);
        assert!(scenario.apply(BulkAction::Reject, &["w-1"]).await.is_err());
        assert!(!scenario.settlement.is_processing());

        scenario.backend.fail_complete(false);
        let outcome = scenario.apply(BulkAction::Reject, &["w-1"]).await.unwrap();

        assert!(matches!(outcome, SettlementOutcome::Settled { .. }));
        assert!(!scenario.settlement.is_processing());
        assert_eq!(scenario.backend.complete_calls(), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_after_payout_is_reported_as_unreconciled() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "pending")]).await;
        scenario.backend.fail_complete(true);

        let result = scenario.apply(BulkAction::Approve, &["w-1"]).await;

        let sent = scenario.chain.sent_signatures();
        match result {
            Err(SettlementError::Unreconciled { signature, .. }) => assert_eq!(signature, sent[0]),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(scenario.notifier.alerts()[0].contains(&sent[0].to_string()));
        assert_eq!(scenario.store.requests().len(), 1);
        assert!(scenario.history.is_empty());
    }

    #[tokio::test]
    async fn test_rejection_failure_alerts() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "pending")]).await;
        scenario.backend.fail_complete(true);

        let result = scenario.apply(BulkAction::Reject, &["w-1"]).await;

        assert!(matches!(result, Err(SettlementError::Backend(_))));
        assert_eq!(scenario.notifier.alerts(), vec![REJECT_FAILED_MESSAGE.to_string()]);
        assert_eq!(scenario.store.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_ids_are_dropped_and_empty_batches_refused() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "pending")]).await;

        let result = scenario.apply(BulkAction::Reject, &["gone"]).await;
        assert!(matches!(result, Err(SettlementError::EmptyBatch)));
        assert_eq!(scenario.backend.complete_calls(), 0);

        scenario.apply(BulkAction::Reject, &["gone", "w-1"]).await.unwrap();
        assert_eq!(scenario.backend.posted()[0].len(), 1);
        assert_eq!(scenario.backend.posted()[0][0].id, "w-1");
    }

    #[tokio::test]
    async fn test_approval_without_wallet_is_a_no_op() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "pending")]).await;
        scenario.session.disconnect().await;

        let outcome = scenario.apply(BulkAction::Approve, &["w-1"]).await.unwrap();

        assert_eq!(outcome, SettlementOutcome::Skipped);
        assert_eq!(scenario.chain.total_calls(), 0);
        assert_eq!(scenario.backend.complete_calls(), 0);

        scenario.apply(BulkAction::Review, &["w-1"]).await.unwrap();
        assert_eq!(scenario.history.entries()[0].performed_by, UNKNOWN_OPERATOR);
    }

    #[tokio::test]
    async fn test_ineligible_status_is_not_enforced() {
        let mut scenario =
            Scenario::new(vec![pending_row("w-1", &wallet(), "1", "win", "successful")]).await;

        let outcome = scenario.apply(BulkAction::Approve, &["w-1"]).await.unwrap();

        assert!(matches!(outcome, SettlementOutcome::Settled { .. }));
        assert_eq!(scenario.chain.sent_signatures().len(), 1);
    }
}
