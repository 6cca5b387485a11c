//! In-process store.
//!
//! Serializable by construction: a store transaction holds the single state
//! mutex for its whole lifetime and works on a private copy that replaces the
//! shared state on commit. Dropping the transaction releases the lock and
//! discards the copy.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tradeflow_shared::types::{ActorId, DocumentId, PageRequest, TransactionId};

use super::{AuditStore, StoreTransaction, TradeStore, TransactionFilter};
use crate::audit::types::AuditLogEntry;
use crate::document::types::{Document, DocumentType, Verification};
use crate::error::StoreError;
use crate::ledger::types::{LedgerEntry, LedgerSubject};
use crate::risk::types::RiskScore;
use crate::workflow::types::{TradeTransaction, TransactionStatus};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    transactions: BTreeMap<TransactionId, TradeTransaction>,
    documents: BTreeMap<DocumentId, Document>,
    ledger: Vec<LedgerEntry>,
    risk_scores: Vec<RiskScore>,
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_audit_writes: AtomicBool,
    fail_risk_score_writes: AtomicBool,
    stale_document_lookups: AtomicBool,
}

/// Failure switches for exercising error paths in tests and demos.
#[derive(Debug, Clone, Default)]
pub struct FaultSwitches {
    inner: Arc<Faults>,
}

impl FaultSwitches {
    /// Make `begin` and `commit` fail as if the backend were down.
    pub fn set_unavailable(&self, on: bool) {
        self.inner.unavailable.store(on, Ordering::SeqCst);
    }

    /// Make audit writes fail.
    pub fn fail_audit_writes(&self, on: bool) {
        self.inner.fail_audit_writes.store(on, Ordering::SeqCst);
    }

    /// Make risk score inserts fail.
    pub fn fail_risk_score_writes(&self, on: bool) {
        self.inner.fail_risk_score_writes.store(on, Ordering::SeqCst);
    }

    /// Make lookups by document number miss, the way a concurrent
    /// uncommitted upload is invisible under READ COMMITTED.
    pub fn stale_document_lookups(&self, on: bool) {
        self.inner.stale_document_lookups.store(on, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

/// Store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    audit: Mutex<Vec<AuditLogEntry>>,
    faults: FaultSwitches,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Failure switches for this store.
    #[must_use]
    pub fn faults(&self) -> &FaultSwitches {
        &self.faults
    }
}

impl TradeStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        self.faults.check_available()?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTransaction {
            guard,
            working,
            faults: self.faults.clone(),
        })
    }
}

/// Unit of work over a [`MemoryStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: FaultSwitches,
}

impl StoreTransaction for MemoryTransaction {
    async fn insert_transaction(&mut self, transaction: &TradeTransaction) -> Result<(), StoreError> {
        if self.working.transactions.contains_key(&transaction.id) {
            return Err(StoreError::Conflict(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        self.working
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<TradeTransaction>, StoreError> {
        Ok(self.working.transactions.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &mut self,
        id: TransactionId,
        expected: TransactionStatus,
        next: TransactionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.working.transactions.get_mut(&id) {
            Some(tx) if tx.status == expected => {
                tx.status = next;
                tx.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> Result<Vec<TradeTransaction>, StoreError> {
        let mut list: Vec<TradeTransaction> = self
            .working
            .transactions
            .values()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn count_buyer_transactions_since(
        &mut self,
        buyer_id: ActorId,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count = self
            .working
            .transactions
            .values()
            .filter(|tx| tx.buyer_id == buyer_id && tx.created_at >= since)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn delete_transaction(&mut self, id: TransactionId) -> Result<bool, StoreError> {
        if self.working.transactions.remove(&id).is_none() {
            return Ok(false);
        }
        self.working
            .documents
            .retain(|_, doc| doc.transaction_id != Some(id));
        self.working
            .ledger
            .retain(|entry| entry.transaction_id != Some(id));
        self.working
            .risk_scores
            .retain(|score| score.transaction_id != Some(id));
        Ok(true)
    }

    async fn insert_document(&mut self, document: &Document) -> Result<(), StoreError> {
        let clash = self.working.documents.values().any(|existing| {
            existing.transaction_id == document.transaction_id
                && existing.doc_type == document.doc_type
                && existing.doc_number == document.doc_number
        });
        if clash || self.working.documents.contains_key(&document.id) {
            return Err(StoreError::Conflict(format!(
                "document {} {} already exists",
                document.doc_type, document.doc_number
            )));
        }
        self.working.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn find_document(&mut self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.working.documents.get(&id).cloned())
    }

    async fn find_document_by_number(
        &mut self,
        transaction_id: TransactionId,
        doc_type: DocumentType,
        doc_number: &str,
    ) -> Result<Option<Document>, StoreError> {
        if self.faults.inner.stale_document_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .working
            .documents
            .values()
            .find(|doc| {
                doc.transaction_id == Some(transaction_id)
                    && doc.doc_type == doc_type
                    && doc.doc_number == doc_number
            })
            .cloned())
    }

    async fn list_documents(
        &mut self,
        transaction_id: TransactionId,
    ) -> Result<Vec<Document>, StoreError> {
        let mut list: Vec<Document> = self
            .working
            .documents
            .values()
            .filter(|doc| doc.transaction_id == Some(transaction_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn mark_verified(
        &mut self,
        id: DocumentId,
        verified_by: ActorId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.working.documents.get_mut(&id) {
            Some(doc) if doc.verification.is_none() => {
                doc.verification = Some(Verification {
                    verified_by,
                    verified_at: at,
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn compare_and_set_document_type(
        &mut self,
        id: DocumentId,
        expected: DocumentType,
        next: DocumentType,
    ) -> Result<bool, StoreError> {
        match self.working.documents.get_mut(&id) {
            Some(doc) if doc.doc_type == expected => {
                doc.doc_type = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_ledger(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.working.ledger.push(entry.clone());
        Ok(())
    }

    async fn list_ledger(&mut self, subject: LedgerSubject) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .working
            .ledger
            .iter()
            .filter(|entry| match subject {
                LedgerSubject::Transaction(id) => entry.transaction_id == Some(id),
                LedgerSubject::Document(id) => entry.document_id == Some(id),
            })
            .cloned()
            .collect())
    }

    async fn insert_risk_score(&mut self, score: &RiskScore) -> Result<(), StoreError> {
        if self.faults.inner.fail_risk_score_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("risk score write rejected".into()));
        }
        self.working.risk_scores.push(score.clone());
        Ok(())
    }

    async fn latest_risk_score(
        &mut self,
        transaction_id: TransactionId,
    ) -> Result<Option<RiskScore>, StoreError> {
        Ok(self
            .working
            .risk_scores
            .iter()
            .filter(|score| score.transaction_id == Some(transaction_id))
            .max_by_key(|score| score.computed_at)
            .cloned())
    }

    async fn list_risk_scores(&mut self) -> Result<Vec<RiskScore>, StoreError> {
        let mut list = self.working.risk_scores.clone();
        list.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.computed_at.cmp(&a.computed_at))
        });
        Ok(list)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.faults.check_available()?;
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl AuditStore for MemoryStore {
    async fn record(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        if self.faults.inner.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit write rejected".into()));
        }
        self.audit.lock().await.push(entry.clone());
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<AuditLogEntry>, u64), StoreError> {
        let audit = self.audit.lock().await;
        let total = u64::try_from(audit.len()).unwrap_or(u64::MAX);
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);

        let mut entries: Vec<AuditLogEntry> = audit.iter().rev().cloned().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((entries.into_iter().skip(skip).take(take).collect(), total))
    }
}
