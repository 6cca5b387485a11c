//! Persistence contract.
//!
//! The engine talks to durable state only through these traits. A
//! [`TradeStore`] hands out request-scoped [`StoreTransaction`]s: everything
//! written through one is committed or discarded as a unit, and dropping an
//! uncommitted transaction discards it. The audit trail has its own
//! [`AuditStore`] so its failures never touch the business transaction.
//!
//! Implementations:
//! - [`MemoryStore`] (this crate) for tests and demos
//! - `SeaOrmStore` (`tradeflow-db`) for PostgreSQL

mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};
use tradeflow_shared::types::{ActorId, DocumentId, PageRequest, TransactionId};

use crate::audit::types::AuditLogEntry;
use crate::document::types::{Document, DocumentType};
use crate::error::StoreError;
use crate::ledger::types::{LedgerEntry, LedgerSubject};
use crate::risk::types::RiskScore;
use crate::workflow::types::{TradeTransaction, TransactionStatus};

pub use memory::{FaultSwitches, MemoryStore, MemoryTransaction};

/// Filter for transaction listings. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only this buyer's transactions.
    pub buyer_id: Option<ActorId>,
    /// Only transactions with this seller.
    pub seller_id: Option<ActorId>,
    /// Only these statuses.
    pub statuses: Vec<TransactionStatus>,
}

impl TransactionFilter {
    /// Everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// One buyer's transactions.
    #[must_use]
    pub fn buyer(buyer_id: ActorId) -> Self {
        Self {
            buyer_id: Some(buyer_id),
            ..Self::default()
        }
    }

    /// Transactions in any of `statuses`.
    #[must_use]
    pub fn statuses(statuses: &[TransactionStatus]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            ..Self::default()
        }
    }

    /// Returns true if `transaction` passes the filter.
    #[must_use]
    pub fn matches(&self, transaction: &TradeTransaction) -> bool {
        self.buyer_id.is_none_or(|id| transaction.buyer_id == id)
            && self
                .seller_id
                .is_none_or(|id| transaction.seller_id == Some(id))
            && (self.statuses.is_empty() || self.statuses.contains(&transaction.status))
    }
}

/// Source of request-scoped store transactions.
pub trait TradeStore: Send + Sync + 'static {
    /// Transaction handle type.
    type Tx: StoreTransaction;

    /// Opens a unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;
}

/// One unit of work against the durable store.
///
/// Reads observe the transaction's own writes. Conditional updates return
/// `false` when the expected current value did not match, which the engine
/// reports as a lost race.
pub trait StoreTransaction: Send + Sized {
    /// Insert a new trade transaction.
    fn insert_transaction(
        &mut self,
        transaction: &TradeTransaction,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Find a trade transaction by ID.
    fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = Result<Option<TradeTransaction>, StoreError>> + Send;

    /// Move `id` from `expected` to `next`. Returns false if it was not in `expected`.
    fn compare_and_set_status(
        &mut self,
        id: TransactionId,
        expected: TransactionStatus,
        next: TransactionStatus,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// List transactions, newest first.
    fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> impl Future<Output = Result<Vec<TradeTransaction>, StoreError>> + Send;

    /// Count a buyer's transactions created at or after `since`.
    fn count_buyer_transactions_since(
        &mut self,
        buyer_id: ActorId,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Delete a transaction with its documents, ledger entries and risk scores.
    fn delete_transaction(
        &mut self,
        id: TransactionId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Insert a new document.
    fn insert_document(
        &mut self,
        document: &Document,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Find a document by ID.
    fn find_document(
        &mut self,
        id: DocumentId,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Find a document by its natural key.
    fn find_document_by_number(
        &mut self,
        transaction_id: TransactionId,
        doc_type: DocumentType,
        doc_number: &str,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// List a transaction's documents, oldest first.
    fn list_documents(
        &mut self,
        transaction_id: TransactionId,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Stamp a document as verified. Returns false if it already was.
    fn mark_verified(
        &mut self,
        id: DocumentId,
        verified_by: ActorId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Change a document's type from `expected` to `next`. Returns false on mismatch.
    fn compare_and_set_document_type(
        &mut self,
        id: DocumentId,
        expected: DocumentType,
        next: DocumentType,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Append a ledger entry.
    fn append_ledger(
        &mut self,
        entry: &LedgerEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Ledger entries for a subject, in append order.
    fn list_ledger(
        &mut self,
        subject: LedgerSubject,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, StoreError>> + Send;

    /// Insert a risk snapshot.
    fn insert_risk_score(
        &mut self,
        score: &RiskScore,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Most recent snapshot for a transaction.
    fn latest_risk_score(
        &mut self,
        transaction_id: TransactionId,
    ) -> impl Future<Output = Result<Option<RiskScore>, StoreError>> + Send;

    /// Every snapshot, highest score first.
    fn list_risk_scores(&mut self)
    -> impl Future<Output = Result<Vec<RiskScore>, StoreError>> + Send;

    /// Make every write visible atomically.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Discard every write.
    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Append-only audit storage, independent of [`TradeStore`] transactions.
pub trait AuditStore: Send + Sync + 'static {
    /// Persist one entry.
    fn record(&self, entry: &AuditLogEntry) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// One page of entries, newest first, with the total count.
    fn list(
        &self,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<AuditLogEntry>, u64), StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tradeflow_shared::types::CurrencyCode;

    fn transaction(status: TransactionStatus) -> TradeTransaction {
        TradeTransaction {
            id: TransactionId::new(),
            buyer_id: ActorId::new(),
            seller_id: None,
            amount: dec!(10),
            currency: CurrencyCode::USD,
            buyer_country: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_matches() {
        let tx = transaction(TransactionStatus::PoShipped);
        assert!(TransactionFilter::all().matches(&tx));
        assert!(TransactionFilter::buyer(tx.buyer_id).matches(&tx));
        assert!(!TransactionFilter::buyer(ActorId::new()).matches(&tx));
        assert!(
            TransactionFilter::statuses(&[TransactionStatus::PoCreated, TransactionStatus::PoShipped])
                .matches(&tx)
        );
        assert!(!TransactionFilter::statuses(&[TransactionStatus::PoCreated]).matches(&tx));

        let by_seller = TransactionFilter {
            seller_id: Some(ActorId::new()),
            ..TransactionFilter::default()
        };
        assert!(!by_seller.matches(&tx));
    }
}
