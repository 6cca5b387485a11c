//! Engine error types.
//!
//! Every failure of a workflow operation is one of these variants and carries
//! the ids, role and types needed to render a precise message. Only audit
//! trail failures are swallowed; everything else reaches the caller.

use thiserror::Error;
use tradeflow_shared::AppError;
use tradeflow_shared::types::{ActorId, DocumentId, TransactionId};

use crate::actor::Role;
use crate::document::types::{DocumentAction, DocumentType};
use crate::storage::StorageError;
use crate::workflow::types::{TransactionAction, TransactionStatus};

/// Result type alias using `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transaction not found.
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),

    /// Document not found.
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentId),

    /// Role is not authorized for the operation.
    #[error("Role {role} is not allowed to {action}")]
    Forbidden {
        /// Requesting role.
        role: Role,
        /// Operation name.
        action: &'static str,
    },

    /// Operation is not valid from the transaction's current status.
    #[error("Cannot {action} transaction {transaction_id} in status {status}")]
    InvalidState {
        /// The transaction.
        transaction_id: TransactionId,
        /// Its current status.
        status: TransactionStatus,
        /// The attempted action.
        action: TransactionAction,
    },

    /// Policy matrix denial for a document action.
    #[error("Action {action} on {doc_type} is not allowed for role {role}")]
    ActionNotAllowed {
        /// Requesting role.
        role: Role,
        /// Current document type.
        doc_type: DocumentType,
        /// The attempted action.
        action: DocumentAction,
    },

    /// A document with the same number and type already exists on the transaction.
    #[error("Document {doc_type} {doc_number} already exists on transaction {transaction_id}")]
    DuplicateDocument {
        /// The transaction.
        transaction_id: TransactionId,
        /// Document type.
        doc_type: DocumentType,
        /// Business reference number.
        doc_number: String,
    },

    /// The transaction is completed and accepts no more documents.
    #[error("Transaction {0} is completed")]
    TransactionClosed(TransactionId),

    /// Completion blocked by missing or unverified documents.
    #[error("Missing verified documents: {}", join_types(.0))]
    MissingDocuments(Vec<DocumentType>),

    /// Document was verified before.
    #[error("Document {document_id} is already verified by {verified_by}")]
    AlreadyVerified {
        /// The document.
        document_id: DocumentId,
        /// Who verified it.
        verified_by: ActorId,
    },

    /// Stored content no longer matches its recorded digest.
    #[error("Content of document {0} does not match its hash")]
    ContentMismatch(DocumentId),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document storage failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Store unavailable or timed out; retry with backoff.
    #[error("Temporarily unavailable: {0}")]
    Transient(String),
}

fn join_types(types: &[DocumentType]) -> String {
    types
        .iter()
        .map(DocumentType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl EngineError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Forbidden { .. } | Self::ActionNotAllowed { .. } => 403,
            Self::TransactionNotFound(_) | Self::DocumentNotFound(_) => 404,
            Self::InvalidState { .. }
            | Self::DuplicateDocument { .. }
            | Self::TransactionClosed(_)
            | Self::AlreadyVerified { .. } => 409,
            Self::MissingDocuments(_) => 422,
            Self::Storage(StorageError::FileTooLarge { .. }) => 413,
            Self::ContentMismatch(_) | Self::Storage(_) => 500,
            Self::Transient(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::ActionNotAllowed { .. } => "ACTION_NOT_ALLOWED",
            Self::DuplicateDocument { .. } => "DUPLICATE_DOCUMENT",
            Self::TransactionClosed(_) => "TRANSACTION_CLOSED",
            Self::MissingDocuments(_) => "MISSING_DOCUMENTS",
            Self::AlreadyVerified { .. } => "ALREADY_VERIFIED",
            Self::ContentMismatch(_) => "CONTENT_MISMATCH",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Transient(_) => "TRANSIENT",
        }
    }

    /// Returns true if the caller may retry the same operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub(crate) fn forbidden(role: Role, action: &'static str) -> Self {
        Self::Forbidden { role, action }
    }
}

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend call exceeded its deadline.
    #[error("store timed out: {0}")]
    Timeout(String),

    /// Serialization failure or constraint race; safe to retry.
    #[error("store conflict: {0}")]
    Conflict(String),

    /// A row could not be mapped back into the domain.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        if let StoreError::Corrupt(detail) = &err {
            tracing::error!(detail = %detail, "store returned a corrupt row");
        }
        Self::Transient(err.to_string())
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::TransactionNotFound(_) | EngineError::DocumentNotFound(_) => {
                Self::NotFound(message)
            }
            EngineError::Forbidden { .. } | EngineError::ActionNotAllowed { .. } => {
                Self::Forbidden(message)
            }
            EngineError::InvalidState { .. }
            | EngineError::DuplicateDocument { .. }
            | EngineError::TransactionClosed(_)
            | EngineError::AlreadyVerified { .. } => Self::Conflict(message),
            EngineError::MissingDocuments(_) => Self::Unprocessable(message),
            EngineError::Validation(_) | EngineError::Storage(StorageError::FileTooLarge { .. }) => {
                Self::Validation(message)
            }
            EngineError::Storage(_) => Self::Storage(message),
            EngineError::ContentMismatch(_) => Self::Integrity(message),
            EngineError::Transient(_) => Self::Unavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_documents_message_names_types() {
        let err = EngineError::MissingDocuments(vec![DocumentType::Invoice, DocumentType::BillOfLading]);
        assert_eq!(
            err.to_string(),
            "Missing verified documents: INVOICE, BILL_OF_LADING"
        );
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "MISSING_DOCUMENTS");
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(EngineError::Transient("timeout".into()).is_retryable());
        assert!(!EngineError::forbidden(Role::Buyer, "approve").is_retryable());
        assert!(!EngineError::Validation("amount".into()).is_retryable());
    }

    #[test]
    fn test_store_errors_become_transient() {
        for err in [
            StoreError::Unavailable("down".into()),
            StoreError::Timeout("slow".into()),
            StoreError::Conflict("serialization".into()),
            StoreError::Corrupt("bad enum".into()),
        ] {
            assert!(EngineError::from(err).is_retryable());
        }
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = EngineError::forbidden(Role::Seller, "approve").into();
        assert_eq!(app.status_code(), 403);

        let app: AppError = EngineError::Transient("down".into()).into();
        assert!(app.is_retryable());

        let app: AppError = EngineError::InvalidState {
            transaction_id: TransactionId::new(),
            status: TransactionStatus::PoApproved,
            action: TransactionAction::Approve,
        }
        .into();
        assert_eq!(app.error_code(), "CONFLICT");
    }
}
