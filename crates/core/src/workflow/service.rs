//! Transaction lifecycle operations.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, warn};
use tradeflow_shared::types::TransactionId;

use super::types::{CreateTransactionInput, TradeTransaction, TransactionAction, TransactionStatus};
use crate::actor::Actor;
use crate::audit::{AuditAction, EntityType};
use crate::document::types::{DocumentType, UploadDocumentInput};
use crate::engine::TradeEngine;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{LedgerAction, LedgerEntry};
use crate::policy::{Denial, Operation, Standing, TRANSACTION_TABLE, access};
use crate::risk::RiskScore;
use crate::store::{AuditStore, StoreTransaction, TradeStore};

/// Result of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The settled transaction.
    pub transaction: TradeTransaction,
    /// The risk snapshot persisted with it.
    pub risk: RiskScore,
}

/// Maps a lifecycle table denial to the engine error for `transaction_id`.
pub(crate) fn lifecycle_denial(
    denial: Denial<TransactionStatus, TransactionAction>,
    transaction_id: TransactionId,
) -> EngineError {
    match denial {
        Denial::Forbidden { role, action } => EngineError::forbidden(role, action.as_str()),
        Denial::InvalidState {
            action,
            current: Some(status),
            ..
        } => EngineError::InvalidState {
            transaction_id,
            status,
            action,
        },
        Denial::InvalidState { current: None, .. } => {
            EngineError::TransactionNotFound(transaction_id)
        }
    }
}

impl<S: TradeStore, A: AuditStore> TradeEngine<S, A> {
    /// Raises a purchase order: creates the transaction in `PO_CREATED` and
    /// attaches the PO document.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a buyer
    /// - `Validation` for a non-positive amount or empty PO number
    /// - `Storage` if the PO cannot be stored
    /// - `Transient` on store failure or timeout
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role))]
    pub async fn create_transaction(
        &self,
        actor: Actor,
        input: CreateTransactionInput,
    ) -> EngineResult<TradeTransaction> {
        let transaction = self.run("create", self.create_inner(actor, input)).await?;
        self.audit
            .log(actor.id, AuditAction::PoCreated, EntityType::Transaction, transaction.id)
            .await;
        Ok(transaction)
    }

    async fn create_inner(
        &self,
        actor: Actor,
        input: CreateTransactionInput,
    ) -> EngineResult<TradeTransaction> {
        let transaction_id = TransactionId::new();
        let status = TRANSACTION_TABLE
            .resolve(None, actor.role, TransactionAction::Create)
            .map_err(|d| lifecycle_denial(d, transaction_id))
            .inspect_err(|e| warn!(error = %e, "create denied"))?;

        if input.amount <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "amount must be positive, got {}",
                input.amount
            )));
        }
        if input.po_number.trim().is_empty() {
            return Err(EngineError::Validation("PO number is required".into()));
        }
        self.storage.validate_size(input.po_content.len())?;

        let now = Utc::now();
        let transaction = TradeTransaction {
            id: transaction_id,
            buyer_id: actor.id,
            seller_id: input.seller_id,
            amount: input.amount,
            currency: input.currency,
            buyer_country: input
                .buyer_country
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            status,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_transaction(&transaction).await?;
        tx.append_ledger(&LedgerEntry::for_transaction(
            transaction.id,
            actor.id,
            LedgerAction::PoCreated,
            json!({
                "amount": transaction.amount.to_string(),
                "currency": transaction.currency.as_str(),
            }),
            now,
        ))
        .await?;

        let po = self
            .attach_document(
                &mut tx,
                actor,
                &transaction,
                UploadDocumentInput {
                    transaction_id: transaction.id,
                    doc_type: DocumentType::Po,
                    doc_number: input.po_number,
                    content: input.po_content,
                },
            )
            .await?;
        tx.commit().await?;

        info!(
            transaction_id = %transaction.id,
            document_id = %po.id,
            amount = %transaction.amount,
            status = %transaction.status,
            "Purchase order created"
        );
        Ok(transaction)
    }

    /// Bank approval: `PO_CREATED → PO_APPROVED`.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a bank
    /// - `TransactionNotFound`
    /// - `InvalidState` unless the transaction is `PO_CREATED`
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %id))]
    pub async fn approve(&self, actor: Actor, id: TransactionId) -> EngineResult<TradeTransaction> {
        let transaction = self
            .run("approve", self.advance(actor, id, TransactionAction::Approve))
            .await?;
        self.audit
            .log(actor.id, AuditAction::PoApproved, EntityType::Transaction, id)
            .await;
        Ok(transaction)
    }

    /// Shipment: `PO_APPROVED → PO_SHIPPED`.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a buyer
    /// - `TransactionNotFound`
    /// - `InvalidState` unless the transaction is `PO_APPROVED`
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %id))]
    pub async fn ship(&self, actor: Actor, id: TransactionId) -> EngineResult<TradeTransaction> {
        let transaction = self
            .run("ship", self.advance(actor, id, TransactionAction::Ship))
            .await?;
        self.audit
            .log(actor.id, AuditAction::PoShipped, EntityType::Transaction, id)
            .await;
        Ok(transaction)
    }

    async fn advance(
        &self,
        actor: Actor,
        id: TransactionId,
        action: TransactionAction,
    ) -> EngineResult<TradeTransaction> {
        TRANSACTION_TABLE
            .authorize(actor.role, action)
            .map_err(|d| lifecycle_denial(d, id))
            .inspect_err(|e| warn!(error = %e, "transition denied"))?;

        let mut tx = self.store.begin().await?;
        let transaction = self.transition(&mut tx, actor, id, action).await?;
        tx.commit().await?;

        info!(status = %transaction.status, "Transaction advanced");
        Ok(transaction)
    }

    /// Loads, checks and flips the status, appending the matching ledger entry.
    async fn transition(
        &self,
        tx: &mut S::Tx,
        actor: Actor,
        id: TransactionId,
        action: TransactionAction,
    ) -> EngineResult<TradeTransaction> {
        let mut transaction = tx
            .find_transaction(id)
            .await?
            .ok_or(EngineError::TransactionNotFound(id))?;

        let current = transaction.status;
        let next = TRANSACTION_TABLE
            .resolve(Some(current), actor.role, action)
            .map_err(|d| lifecycle_denial(d, id))
            .inspect_err(|e| warn!(error = %e, "transition denied"))?;

        let now = Utc::now();
        if !tx.compare_and_set_status(id, current, next, now).await? {
            let status = tx
                .find_transaction(id)
                .await?
                .map_or(current, |t| t.status);
            warn!(expected = %current, found = %status, "lost status race");
            return Err(EngineError::InvalidState {
                transaction_id: id,
                status,
                action,
            });
        }

        tx.append_ledger(&LedgerEntry::for_transaction(
            id,
            actor.id,
            LedgerAction::for_status(next),
            json!({ "from": current.as_str(), "to": next.as_str() }),
            now,
        ))
        .await?;

        transaction.status = next;
        transaction.updated_at = now;
        Ok(transaction)
    }

    /// Settlement: `PO_SHIPPED → PO_COMPLETED`, then scores and persists risk.
    ///
    /// The status flip, its ledger entry and the risk snapshot commit together
    /// or not at all.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a bank
    /// - `TransactionNotFound`
    /// - `InvalidState` unless the transaction is `PO_SHIPPED`
    /// - `MissingDocuments` naming every required type without a verified document
    /// - `Transient` if any write fails, with nothing applied
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %id))]
    pub async fn complete(&self, actor: Actor, id: TransactionId) -> EngineResult<Completion> {
        let completion = self.run("complete", self.complete_inner(actor, id)).await?;
        self.audit
            .log(actor.id, AuditAction::PoCompleted, EntityType::Transaction, id)
            .await;
        Ok(completion)
    }

    async fn complete_inner(&self, actor: Actor, id: TransactionId) -> EngineResult<Completion> {
        TRANSACTION_TABLE
            .authorize(actor.role, TransactionAction::Complete)
            .map_err(|d| lifecycle_denial(d, id))
            .inspect_err(|e| warn!(error = %e, "completion denied"))?;

        let mut tx = self.store.begin().await?;
        let transaction = tx
            .find_transaction(id)
            .await?
            .ok_or(EngineError::TransactionNotFound(id))?;
        if transaction.status != TransactionStatus::PoShipped {
            let err = EngineError::InvalidState {
                transaction_id: id,
                status: transaction.status,
                action: TransactionAction::Complete,
            };
            warn!(error = %err, "completion denied");
            return Err(err);
        }

        let documents = tx.list_documents(id).await?;
        let missing: Vec<DocumentType> = DocumentType::REQUIRED_FOR_SETTLEMENT
            .into_iter()
            .filter(|required| {
                !documents
                    .iter()
                    .any(|d| d.doc_type == *required && d.is_verified())
            })
            .collect();
        if !missing.is_empty() {
            let err = EngineError::MissingDocuments(missing);
            warn!(error = %err, "completion blocked");
            return Err(err);
        }

        let transaction = self
            .transition(&mut tx, actor, id, TransactionAction::Complete)
            .await?;
        let risk = self.score_in(&mut tx, &transaction).await?;
        tx.commit().await?;

        info!(
            status = %transaction.status,
            risk_score = risk.score,
            risk_level = %risk.level,
            "Transaction completed"
        );
        Ok(Completion { transaction, risk })
    }

    /// Scores `transaction` inside `tx` and stores the snapshot there.
    ///
    /// The velocity count is read through the same store transaction.
    async fn score_in(
        &self,
        tx: &mut S::Tx,
        transaction: &TradeTransaction,
    ) -> EngineResult<RiskScore> {
        let documents = tx.list_documents(transaction.id).await?;
        let now = Utc::now();
        let recent = tx
            .count_buyer_transactions_since(transaction.buyer_id, now - self.risk.velocity_window())
            .await?;

        let assessment = self.risk.score(transaction, &documents, recent);
        let score = RiskScore::from_assessment(transaction.id, transaction.buyer_id, assessment, now);
        tx.insert_risk_score(&score).await?;
        Ok(score)
    }

    /// Computes and stores a fresh risk snapshot without changing state.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a bank, auditor or admin
    /// - `TransactionNotFound`
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %id))]
    pub async fn assess_risk(&self, actor: Actor, id: TransactionId) -> EngineResult<RiskScore> {
        let score = self
            .run("assess_risk", async {
                access::require(&actor, Operation::AssessRisk, Standing::Portfolio, false)?;

                let mut tx = self.store.begin().await?;
                let transaction = tx
                    .find_transaction(id)
                    .await?
                    .ok_or(EngineError::TransactionNotFound(id))?;
                let score = self.score_in(&mut tx, &transaction).await?;
                tx.commit().await?;

                info!(risk_score = score.score, risk_level = %score.level, "Risk assessed");
                Ok(score)
            })
            .await?;
        self.audit
            .log(actor.id, AuditAction::RiskAssessed, EntityType::Transaction, id)
            .await;
        Ok(score)
    }

    /// Deletes a transaction with its documents, ledger entries and risk
    /// snapshots. Administrative tooling only.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is an admin
    /// - `TransactionNotFound`
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %id))]
    pub async fn delete_transaction(&self, actor: Actor, id: TransactionId) -> EngineResult<()> {
        let documents = self
            .run("delete", async {
                access::require(&actor, Operation::Delete, Standing::Portfolio, false)?;

                let mut tx = self.store.begin().await?;
                let documents = tx.list_documents(id).await?;
                if !tx.delete_transaction(id).await? {
                    return Err(EngineError::TransactionNotFound(id));
                }
                tx.commit().await?;
                Ok(documents)
            })
            .await?;

        for document in &documents {
            if let Err(e) = self.storage.delete(&document.storage_ref).await {
                warn!(document_id = %document.id, error = %e, "failed to delete document content");
            }
        }
        info!(documents = documents.len(), "Transaction deleted");
        self.audit
            .log(actor.id, AuditAction::TransactionDeleted, EntityType::Transaction, id)
            .await;
        Ok(())
    }
}
