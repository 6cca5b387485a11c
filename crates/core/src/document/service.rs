//! Document lifecycle operations.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};
use tradeflow_shared::types::DocumentId;

use super::types::{Document, DocumentAction, UploadDocumentInput, Verification};
use crate::actor::Actor;
use crate::audit::{AuditAction, EntityType};
use crate::engine::TradeEngine;
use crate::error::{EngineError, EngineResult, StoreError};
use crate::ledger::{LedgerAction, LedgerEntry, LedgerSubject, action_details, upload_details};
use crate::policy::{DOCUMENT_MATRIX, Operation, Standing, access, document_policy};
use crate::storage::{StorageService, content_hash};
use crate::store::{AuditStore, StoreTransaction, TradeStore};
use crate::workflow::types::TradeTransaction;

/// A document with its ledger history.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHistory {
    /// The document.
    pub document: Document,
    /// Its ledger entries, oldest first.
    pub ledger: Vec<LedgerEntry>,
}

impl<S: TradeStore, A: AuditStore> TradeEngine<S, A> {
    /// Stores content and records a new document inside `tx`.
    ///
    /// Fails if the transaction is completed or the natural key is taken.
    pub(crate) async fn attach_document(
        &self,
        tx: &mut S::Tx,
        actor: Actor,
        transaction: &TradeTransaction,
        input: UploadDocumentInput,
    ) -> EngineResult<Document> {
        if transaction.status.is_terminal() {
            return Err(EngineError::TransactionClosed(transaction.id));
        }
        let doc_number = input.doc_number.trim().to_string();
        if doc_number.is_empty() {
            return Err(EngineError::Validation("document number is required".into()));
        }
        if tx
            .find_document_by_number(transaction.id, input.doc_type, &doc_number)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateDocument {
                transaction_id: transaction.id,
                doc_type: input.doc_type,
                doc_number,
            });
        }

        let id = DocumentId::new();
        let key = StorageService::document_key(transaction.id, id, &doc_number);
        let storage_ref = self.storage.put(&key, &input.content).await?;

        let now = Utc::now();
        let document = Document {
            id,
            transaction_id: Some(transaction.id),
            owner_id: actor.id,
            doc_type: input.doc_type,
            doc_number,
            storage_ref,
            content_hash: content_hash(&input.content),
            verification: None,
            created_at: now,
        };
        tx.insert_document(&document).await.map_err(|e| match e {
            StoreError::Conflict(detail) => {
                warn!(detail = %detail, "document number taken by a concurrent upload");
                EngineError::DuplicateDocument {
                    transaction_id: transaction.id,
                    doc_type: document.doc_type,
                    doc_number: document.doc_number.clone(),
                }
            }
            other => other.into(),
        })?;
        tx.append_ledger(&LedgerEntry::for_document(
            &document,
            actor.id,
            LedgerAction::DocumentUploaded,
            upload_details(&document),
            now,
        ))
        .await?;

        Ok(document)
    }

    /// Uploads a document to an open transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound`
    /// - `Forbidden` if the actor may not upload to this transaction
    /// - `TransactionClosed` if the transaction is completed
    /// - `DuplicateDocument` if `(transaction, type, number)` exists
    /// - `Storage` if the content cannot be stored
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, transaction_id = %input.transaction_id))]
    pub async fn upload_document(
        &self,
        actor: Actor,
        input: UploadDocumentInput,
    ) -> EngineResult<Document> {
        let document = self
            .run("upload", async {
                let mut tx = self.store.begin().await?;
                let transaction = tx
                    .find_transaction(input.transaction_id)
                    .await?
                    .ok_or(EngineError::TransactionNotFound(input.transaction_id))?;
                access::require(&actor, Operation::Upload, Standing::of(&actor, &transaction), false)?;

                let document = self
                    .attach_document(&mut tx, actor, &transaction, input)
                    .await
                    .inspect_err(|e| warn!(error = %e, "upload rejected"))?;
                tx.commit().await?;

                info!(
                    document_id = %document.id,
                    doc_type = %document.doc_type,
                    "Document uploaded"
                );
                Ok(document)
            })
            .await?;
        self.audit
            .log(actor.id, AuditAction::DocumentUploaded, EntityType::Document, document.id)
            .await;
        Ok(document)
    }

    /// Verifies a document. A document is verified at most once.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the role never verifies
    /// - `DocumentNotFound`
    /// - `ActionNotAllowed` if the role may not verify this document type
    /// - `AlreadyVerified` naming the original verifier
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, document_id = %id))]
    pub async fn verify_document(&self, actor: Actor, id: DocumentId) -> EngineResult<Document> {
        let document = self.run("verify", self.verify_inner(actor, id)).await?;
        self.audit
            .log(actor.id, AuditAction::Verified, EntityType::Document, id)
            .await;
        Ok(document)
    }

    async fn verify_inner(&self, actor: Actor, id: DocumentId) -> EngineResult<Document> {
        if !DOCUMENT_MATRIX.permits(actor.role, DocumentAction::Verify) {
            let err = EngineError::forbidden(actor.role, DocumentAction::Verify.as_str());
            warn!(error = %err, "verification denied");
            return Err(err);
        }

        let mut tx = self.store.begin().await?;
        let mut document = tx
            .find_document(id)
            .await?
            .ok_or(EngineError::DocumentNotFound(id))?;

        if document_policy(actor.role, document.doc_type, DocumentAction::Verify).is_none() {
            let err = EngineError::ActionNotAllowed {
                role: actor.role,
                doc_type: document.doc_type,
                action: DocumentAction::Verify,
            };
            warn!(error = %err, "verification denied");
            return Err(err);
        }
        if let Some(verified_by) = document.verified_by() {
            return Err(EngineError::AlreadyVerified {
                document_id: id,
                verified_by,
            });
        }

        let now = Utc::now();
        if !tx.mark_verified(id, actor.id, now).await? {
            let verified_by = tx
                .find_document(id)
                .await?
                .and_then(|d| d.verified_by())
                .ok_or(EngineError::DocumentNotFound(id))?;
            return Err(EngineError::AlreadyVerified {
                document_id: id,
                verified_by,
            });
        }
        tx.append_ledger(&LedgerEntry::for_document(
            &document,
            actor.id,
            LedgerAction::Verified,
            json!({ "doc_type": document.doc_type.as_str() }),
            now,
        ))
        .await?;
        tx.commit().await?;

        document.verification = Some(Verification {
            verified_by: actor.id,
            verified_at: now,
        });
        info!(doc_type = %document.doc_type, "Document verified");
        Ok(document)
    }

    /// Applies a policy-matrix action to a document.
    ///
    /// The ledger entry and any type change commit together. `VERIFY` goes
    /// through [`Self::verify_document`].
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound`
    /// - `ActionNotAllowed` naming the denied `(role, type, action)`
    #[tracing::instrument(skip_all, fields(actor_id = %actor.id, role = %actor.role, document_id = %id, action = %action))]
    pub async fn perform_action(
        &self,
        actor: Actor,
        id: DocumentId,
        action: DocumentAction,
        metadata: Value,
    ) -> EngineResult<Document> {
        if action == DocumentAction::Verify {
            return self.verify_document(actor, id).await;
        }

        let document = self
            .run("document_action", async {
                let mut tx = self.store.begin().await?;
                let mut document = self.readable_document(&mut tx, actor, id).await?;

                let current = document.doc_type;
                let Some(next) = document_policy(actor.role, current, action) else {
                    let err = EngineError::ActionNotAllowed {
                        role: actor.role,
                        doc_type: current,
                        action,
                    };
                    warn!(error = %err, "document action denied");
                    return Err(err);
                };

                if next != current && !tx.compare_and_set_document_type(id, current, next).await? {
                    return Err(StoreError::Conflict(format!("document {id} changed concurrently")).into());
                }
                tx.append_ledger(&LedgerEntry::for_document(
                    &document,
                    actor.id,
                    LedgerAction::for_document_action(action),
                    action_details(current, next, metadata),
                    Utc::now(),
                ))
                .await?;
                tx.commit().await?;

                document.doc_type = next;
                info!(from = %current, to = %next, "Document action applied");
                Ok(document)
            })
            .await?;
        self.audit
            .log(actor.id, AuditAction::DocumentAction, EntityType::Document, id)
            .await;
        Ok(document)
    }

    /// A document and its ledger history.
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound`
    /// - `Forbidden` if the actor may not read the owning transaction
    pub async fn document_with_ledger(
        &self,
        actor: Actor,
        id: DocumentId,
    ) -> EngineResult<DocumentHistory> {
        self.run("document_with_ledger", async {
            let mut tx = self.store.begin().await?;
            let document = self.readable_document(&mut tx, actor, id).await?;
            let ledger = tx.list_ledger(LedgerSubject::Document(id)).await?;
            tx.rollback().await?;
            Ok(DocumentHistory { document, ledger })
        })
        .await
    }

    /// The stored bytes of a document, checked against its recorded hash.
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound`
    /// - `Forbidden` if the actor may not read the owning transaction
    /// - `ContentMismatch` if the bytes no longer hash to the recorded digest
    pub async fn document_content(&self, actor: Actor, id: DocumentId) -> EngineResult<Vec<u8>> {
        self.run("document_content", async {
            let mut tx = self.store.begin().await?;
            let document = self.readable_document(&mut tx, actor, id).await?;
            tx.rollback().await?;

            let content = self.storage.get(&document.storage_ref).await?;
            if content_hash(&content) != document.content_hash {
                tracing::error!(document_id = %id, "stored content does not match its hash");
                return Err(EngineError::ContentMismatch(id));
            }
            Ok(content)
        })
        .await
    }

    async fn readable_document(
        &self,
        tx: &mut S::Tx,
        actor: Actor,
        id: DocumentId,
    ) -> EngineResult<Document> {
        let document = tx
            .find_document(id)
            .await?
            .ok_or(EngineError::DocumentNotFound(id))?;

        let standing = match document.transaction_id {
            Some(transaction_id) => tx
                .find_transaction(transaction_id)
                .await?
                .map_or(Standing::Portfolio, |t| Standing::of(&actor, &t)),
            None => Standing::Portfolio,
        };
        access::require(&actor, Operation::Read, standing, false)?;
        Ok(document)
    }
}
