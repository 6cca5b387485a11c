//! Shared builders for engine tests.

use std::sync::Arc;

use rust_decimal::Decimal;
use tradeflow_shared::EngineConfig;
use tradeflow_shared::types::{ActorId, CurrencyCode, DocumentId, TransactionId};

use crate::actor::{Actor, Role};
use crate::document::types::{DocumentType, UploadDocumentInput};
use crate::engine::TradeEngine;
use crate::storage::StorageService;
use crate::store::MemoryStore;
use crate::workflow::types::{CreateTransactionInput, TradeTransaction};

pub(crate) type TestEngine = TradeEngine<MemoryStore, MemoryStore>;

/// Engine over one in-memory store serving both trade and audit data.
pub(crate) fn engine() -> TestEngine {
    engine_with(&EngineConfig::default())
}

pub(crate) fn engine_with(config: &EngineConfig) -> TestEngine {
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(StorageService::memory().unwrap());
    TradeEngine::new(Arc::clone(&store), store, storage, config)
}

pub(crate) fn actor(role: Role) -> Actor {
    Actor::new(ActorId::new(), role)
}

pub(crate) fn po_input(amount: Decimal, seller_id: Option<ActorId>) -> CreateTransactionInput {
    CreateTransactionInput {
        amount,
        currency: CurrencyCode::USD,
        seller_id,
        buyer_country: Some("US".into()),
        po_number: "PO-1001".into(),
        po_content: b"purchase order".to_vec(),
    }
}

pub(crate) fn upload(
    transaction_id: TransactionId,
    doc_type: DocumentType,
    doc_number: &str,
) -> UploadDocumentInput {
    UploadDocumentInput {
        transaction_id,
        doc_type,
        doc_number: doc_number.into(),
        content: format!("{doc_type} {doc_number}").into_bytes(),
    }
}

/// The id of the PO attached at creation.
pub(crate) async fn po_document(engine: &TestEngine, buyer: Actor, id: TransactionId) -> DocumentId {
    let summary = engine.transaction_summary(buyer, id).await.unwrap();
    summary
        .documents
        .iter()
        .find(|d| d.doc_type == DocumentType::Po)
        .map(|d| d.id)
        .unwrap()
}

/// Drives a fresh transaction to `PO_SHIPPED`. The assigned seller uploads
/// `with_documents` and the bank verifies each of them.
pub(crate) async fn shipped_transaction(
    engine: &TestEngine,
    buyer: Actor,
    bank: Actor,
    amount: Decimal,
    with_documents: &[DocumentType],
) -> TradeTransaction {
    let seller = actor(Role::Seller);
    let transaction = engine
        .create_transaction(buyer, po_input(amount, Some(seller.id)))
        .await
        .unwrap();
    let po = po_document(engine, buyer, transaction.id).await;
    engine.verify_document(bank, po).await.unwrap();
    engine.approve(bank, transaction.id).await.unwrap();

    for (n, doc_type) in with_documents.iter().enumerate() {
        let document = engine
            .upload_document(seller, upload(transaction.id, *doc_type, &format!("D-{n}")))
            .await
            .unwrap();
        engine.verify_document(bank, document.id).await.unwrap();
    }

    engine.ship(buyer, transaction.id).await.unwrap()
}
