//! Lifecycle scenarios against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tradeflow_shared::types::{PageRequest, TransactionId};

use super::types::TransactionStatus;
use crate::actor::Role;
use crate::audit::AuditLogEntry;
use crate::document::types::DocumentType;
use crate::engine::{EngineSettings, TradeEngine};
use crate::error::{EngineError, StoreError};
use crate::fixtures::{actor, engine, po_document, po_input, shipped_transaction, upload};
use crate::storage::StorageService;
use crate::ledger::{LedgerAction, LedgerSubject, replay};
use crate::risk::RiskLevel;
use crate::store::{AuditStore, MemoryStore, StoreTransaction, TradeStore, TransactionFilter};

const SETTLEMENT_DOCS: [DocumentType; 2] = [DocumentType::Invoice, DocumentType::BillOfLading];

async fn status_of(engine: &crate::fixtures::TestEngine, id: TransactionId) -> TransactionStatus {
    let mut tx = engine.store().begin().await.unwrap();
    let status = tx.find_transaction(id).await.unwrap().unwrap().status;
    tx.rollback().await.unwrap();
    status
}

#[tokio::test]
async fn test_create_writes_single_po_created_entry() {
    let engine = engine();
    let buyer = actor(Role::Buyer);

    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::PoCreated);
    assert_eq!(transaction.buyer_id, buyer.id);

    let summary = engine.transaction_summary(buyer, transaction.id).await.unwrap();
    let created: Vec<_> = summary
        .ledger
        .iter()
        .filter(|e| e.action == LedgerAction::PoCreated)
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].actor_id, buyer.id);
    assert_eq!(summary.documents.len(), 1);
    assert_eq!(summary.documents[0].doc_type, DocumentType::Po);
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let engine = engine();
    let buyer = actor(Role::Buyer);

    let err = engine
        .create_transaction(buyer, po_input(dec!(0), None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let mut input = po_input(dec!(10), None);
    input.po_number = "  ".into();
    let err = engine.create_transaction(buyer, input).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_transaction(actor(Role::Bank), po_input(dec!(10), None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { role: Role::Bank, .. }));

    let mut tx = engine.store().begin().await.unwrap();
    assert!(tx.list_transactions(&TransactionFilter::all()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_approve_twice_is_invalid_state() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();

    let approved = engine.approve(bank, transaction.id).await.unwrap();
    assert_eq!(approved.status, TransactionStatus::PoApproved);

    let err = engine.approve(bank, transaction.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidState {
            status: TransactionStatus::PoApproved,
            ..
        }
    ));
}

#[tokio::test]
async fn test_non_bank_approve_is_forbidden() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();

    for role in [Role::Buyer, Role::Seller, Role::Auditor, Role::Admin] {
        let err = engine.approve(actor(role), transaction.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }), "{role}");
        assert_eq!(err.status_code(), 403);
    }
    assert_eq!(status_of(&engine, transaction.id).await, TransactionStatus::PoCreated);
}

#[tokio::test]
async fn test_out_of_order_transitions() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();

    let err = engine.ship(buyer, transaction.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
    let err = engine.complete(bank, transaction.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));

    let err = engine.approve(bank, TransactionId::new()).await.unwrap_err();
    assert!(matches!(err, EngineError::TransactionNotFound(_)));
}

#[tokio::test]
async fn test_complete_scores_very_high_amount() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction =
        shipped_transaction(&engine, buyer, bank, dec!(2000000), &SETTLEMENT_DOCS).await;

    let completion = engine.complete(bank, transaction.id).await.unwrap();
    assert_eq!(completion.transaction.status, TransactionStatus::PoCompleted);
    assert!(completion.risk.score >= 40);
    assert!(
        completion
            .risk
            .rationale
            .iter()
            .any(|r| r.contains("very high amount"))
    );
    let expected = if completion.risk.score >= 71 {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };
    assert_eq!(completion.risk.level, expected);

    let summary = engine.transaction_summary(bank, transaction.id).await.unwrap();
    assert_eq!(summary.latest_risk, Some(completion.risk));
    assert!(
        summary
            .ledger
            .iter()
            .any(|e| e.action == LedgerAction::PoCompleted)
    );
}

#[tokio::test]
async fn test_complete_reports_missing_bill_of_lading() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction =
        shipped_transaction(&engine, buyer, bank, dec!(50000), &[DocumentType::Invoice]).await;

    let err = engine.complete(bank, transaction.id).await.unwrap_err();
    assert!(matches!(
        &err,
        EngineError::MissingDocuments(missing) if missing == &[DocumentType::BillOfLading]
    ));
    assert_eq!(err.to_string(), "Missing verified documents: BILL_OF_LADING");
    assert_eq!(status_of(&engine, transaction.id).await, TransactionStatus::PoShipped);
}

#[tokio::test]
async fn test_unverified_bill_of_lading_blocks_completion() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let seller = actor(Role::Seller);
    let bank = actor(Role::Bank);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), Some(seller.id)))
        .await
        .unwrap();
    let po = po_document(&engine, buyer, transaction.id).await;
    engine.verify_document(bank, po).await.unwrap();
    engine.approve(bank, transaction.id).await.unwrap();

    let invoice = engine
        .upload_document(seller, upload(transaction.id, DocumentType::Invoice, "INV-1"))
        .await
        .unwrap();
    engine
        .upload_document(seller, upload(transaction.id, DocumentType::BillOfLading, "BOL-1"))
        .await
        .unwrap();
    engine.verify_document(bank, invoice.id).await.unwrap();
    engine.ship(buyer, transaction.id).await.unwrap();

    let err = engine.complete(bank, transaction.id).await.unwrap_err();
    assert!(matches!(
        &err,
        EngineError::MissingDocuments(missing) if missing == &[DocumentType::BillOfLading]
    ));
    assert_eq!(status_of(&engine, transaction.id).await, TransactionStatus::PoShipped);
}

#[tokio::test]
async fn test_complete_lists_missing_in_required_order() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction = shipped_transaction(&engine, buyer, bank, dec!(50000), &[]).await;

    let err = engine.complete(bank, transaction.id).await.unwrap_err();
    assert!(matches!(
        &err,
        EngineError::MissingDocuments(missing)
            if missing == &[DocumentType::Invoice, DocumentType::BillOfLading]
    ));
}

#[tokio::test]
async fn test_concurrent_double_approve() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        engine.approve(bank, transaction.id),
        engine.approve(actor(Role::Bank), transaction.id)
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(EngineError::InvalidState { .. })))
    );

    let summary = engine.transaction_summary(bank, transaction.id).await.unwrap();
    let approvals = summary
        .ledger
        .iter()
        .filter(|e| e.action == LedgerAction::PoApproved)
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn test_timeout_is_transient_and_leaves_no_trace() {
    let engine = engine().with_settings(
        EngineSettings::default().with_operation_timeout(Duration::from_millis(50)),
    );
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();

    let held = engine.store().begin().await.unwrap();
    let err = engine.approve(bank, transaction.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Transient(_)));
    assert!(err.is_retryable());
    drop(held);

    assert_eq!(status_of(&engine, transaction.id).await, TransactionStatus::PoCreated);
}

#[tokio::test]
async fn test_failed_risk_write_rolls_back_completion() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction =
        shipped_transaction(&engine, buyer, bank, dec!(50000), &SETTLEMENT_DOCS).await;

    engine.store().faults().fail_risk_score_writes(true);
    let err = engine.complete(bank, transaction.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Transient(_)));
    engine.store().faults().fail_risk_score_writes(false);

    assert_eq!(status_of(&engine, transaction.id).await, TransactionStatus::PoShipped);
    let summary = engine.transaction_summary(bank, transaction.id).await.unwrap();
    assert!(summary.latest_risk.is_none());
    assert!(
        !summary
            .ledger
            .iter()
            .any(|e| e.action == LedgerAction::PoCompleted)
    );

    let completion = engine.complete(bank, transaction.id).await.unwrap();
    assert_eq!(completion.transaction.status, TransactionStatus::PoCompleted);
}

#[tokio::test]
async fn test_store_outage_is_transient() {
    let engine = engine();
    engine.store().faults().set_unavailable(true);

    let err = engine
        .create_transaction(actor(Role::Buyer), po_input(dec!(100), None))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Transient(_)));
    assert_eq!(err.status_code(), 503);
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_operation() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();

    engine.store().faults().fail_audit_writes(true);
    let approved = engine.approve(bank, transaction.id).await.unwrap();
    assert_eq!(approved.status, TransactionStatus::PoApproved);
    engine.store().faults().fail_audit_writes(false);

    let (entries, total) = AuditStore::list(engine.store(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(entries[0].actor_id, buyer.id);
}

/// Audit store whose writes never finish.
struct StalledAudit;

impl AuditStore for StalledAudit {
    async fn record(&self, _entry: &AuditLogEntry) -> Result<(), StoreError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn list(&self, _page: PageRequest) -> Result<(Vec<AuditLogEntry>, u64), StoreError> {
        Ok((Vec::new(), 0))
    }
}

#[tokio::test]
async fn test_stalled_audit_does_not_fail_committed_operation() {
    let store = Arc::new(MemoryStore::new());
    let engine = TradeEngine::new(
        Arc::clone(&store),
        Arc::new(StalledAudit),
        Arc::new(StorageService::memory().unwrap()),
        &tradeflow_shared::EngineConfig::default(),
    )
    .with_settings(
        EngineSettings::default()
            .with_operation_timeout(Duration::from_millis(100))
            .with_audit_timeout(Duration::from_millis(20)),
    );

    // Commit lands late in the window; a 1h audit write must not push it over.
    let held = store.begin().await.unwrap();
    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(held);
    });

    let transaction = engine
        .create_transaction(actor(Role::Buyer), po_input(dec!(50000), None))
        .await
        .unwrap();
    release.await.unwrap();
    assert_eq!(transaction.status, TransactionStatus::PoCreated);

    let mut tx = store.begin().await.unwrap();
    let all = tx.list_transactions(&TransactionFilter::all()).await.unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, transaction.id);
}

#[tokio::test]
async fn test_ledger_replay_matches_state() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let bank = actor(Role::Bank);
    let transaction =
        shipped_transaction(&engine, buyer, bank, dec!(50000), &SETTLEMENT_DOCS).await;
    engine.complete(bank, transaction.id).await.unwrap();

    let mut tx = engine.store().begin().await.unwrap();
    let ledger = tx
        .list_ledger(LedgerSubject::Transaction(transaction.id))
        .await
        .unwrap();
    let documents = tx.list_documents(transaction.id).await.unwrap();
    tx.rollback().await.unwrap();

    let state = replay(&ledger).unwrap();
    assert_eq!(state.status, Some(TransactionStatus::PoCompleted));
    for document in &documents {
        assert_eq!(
            state.verified.get(&document.id).copied(),
            document.verified_by()
        );
        assert_eq!(state.doc_types.get(&document.id), Some(&document.doc_type));
    }
    assert!(
        DocumentType::REQUIRED_FOR_SETTLEMENT
            .iter()
            .all(|t| state.verified_types().contains(t))
    );
}

#[tokio::test]
async fn test_assess_risk_does_not_change_status() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(150000), None))
        .await
        .unwrap();

    let err = engine.assess_risk(buyer, transaction.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));

    let score = engine
        .assess_risk(actor(Role::Auditor), transaction.id)
        .await
        .unwrap();
    assert!(score.rationale.iter().any(|r| r.contains("high amount")));
    assert_eq!(status_of(&engine, transaction.id).await, TransactionStatus::PoCreated);
}

#[tokio::test]
async fn test_delete_cascades_for_admin_only() {
    let engine = engine();
    let buyer = actor(Role::Buyer);
    let transaction = engine
        .create_transaction(buyer, po_input(dec!(50000), None))
        .await
        .unwrap();

    let err = engine
        .delete_transaction(actor(Role::Bank), transaction.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));

    engine
        .delete_transaction(actor(Role::Admin), transaction.id)
        .await
        .unwrap();

    let mut tx = engine.store().begin().await.unwrap();
    assert!(tx.find_transaction(transaction.id).await.unwrap().is_none());
    assert!(tx.list_documents(transaction.id).await.unwrap().is_empty());
    assert!(
        tx.list_ledger(LedgerSubject::Transaction(transaction.id))
            .await
            .unwrap()
            .is_empty()
    );
    tx.rollback().await.unwrap();

    let err = engine
        .delete_transaction(actor(Role::Admin), transaction.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TransactionNotFound(_)));
}
