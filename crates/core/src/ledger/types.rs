//! Ledger domain types.
//!
//! A ledger entry is an immutable fact: it is appended once and never updated
//! or deleted except by the cascade of an administrative transaction delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tradeflow_shared::types::{ActorId, DocumentId, LedgerEntryId, TransactionId};

use crate::document::types::{Document, DocumentAction, DocumentType};
use crate::workflow::types::TransactionStatus;

/// Domain events recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerAction {
    /// Transaction created in `PO_CREATED`.
    PoCreated,
    /// Transaction approved by the bank.
    PoApproved,
    /// Goods shipped.
    PoShipped,
    /// Transaction settled.
    PoCompleted,
    /// A document was attached.
    DocumentUploaded,
    /// A document was verified.
    Verified,
    /// A purchase order was amended.
    Amended,
    /// Receipt confirmed against a bill of lading.
    Received,
    /// Shipment confirmed against a bill of lading.
    Shipped,
    /// Bill of lading issued.
    IssueBol,
    /// Invoice issued.
    IssueInvoice,
    /// Invoice paid.
    Paid,
    /// Letter of credit issued.
    IssueLoc,
}

impl LedgerAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoCreated => "PO_CREATED",
            Self::PoApproved => "PO_APPROVED",
            Self::PoShipped => "PO_SHIPPED",
            Self::PoCompleted => "PO_COMPLETED",
            Self::DocumentUploaded => "DOCUMENT_UPLOADED",
            Self::Verified => "VERIFIED",
            Self::Amended => "AMENDED",
            Self::Received => "RECEIVED",
            Self::Shipped => "SHIPPED",
            Self::IssueBol => "ISSUE_BOL",
            Self::IssueInvoice => "ISSUE_INVOICE",
            Self::Paid => "PAID",
            Self::IssueLoc => "ISSUE_LOC",
        }
    }

    /// Parses an action from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == s)
    }

    /// Every ledger action.
    pub const ALL: [Self; 13] = [
        Self::PoCreated,
        Self::PoApproved,
        Self::PoShipped,
        Self::PoCompleted,
        Self::DocumentUploaded,
        Self::Verified,
        Self::Amended,
        Self::Received,
        Self::Shipped,
        Self::IssueBol,
        Self::IssueInvoice,
        Self::Paid,
        Self::IssueLoc,
    ];

    /// The status a transaction-level action moves to, if it is one.
    #[must_use]
    pub fn transaction_status(&self) -> Option<TransactionStatus> {
        match self {
            Self::PoCreated => Some(TransactionStatus::PoCreated),
            Self::PoApproved => Some(TransactionStatus::PoApproved),
            Self::PoShipped => Some(TransactionStatus::PoShipped),
            Self::PoCompleted => Some(TransactionStatus::PoCompleted),
            _ => None,
        }
    }

    /// The ledger action recorded for a status transition.
    #[must_use]
    pub fn for_status(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::PoCreated => Self::PoCreated,
            TransactionStatus::PoApproved => Self::PoApproved,
            TransactionStatus::PoShipped => Self::PoShipped,
            TransactionStatus::PoCompleted => Self::PoCompleted,
        }
    }

    /// The ledger action recorded for a document action.
    #[must_use]
    pub fn for_document_action(action: DocumentAction) -> Self {
        match action {
            DocumentAction::Amend => Self::Amended,
            DocumentAction::Received => Self::Received,
            DocumentAction::Shipped => Self::Shipped,
            DocumentAction::IssueBol => Self::IssueBol,
            DocumentAction::IssueInvoice => Self::IssueInvoice,
            DocumentAction::Verify => Self::Verified,
            DocumentAction::Paid => Self::Paid,
            DocumentAction::IssueLoc => Self::IssueLoc,
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a ledger listing is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSubject {
    /// Every entry carrying this transaction id, document entries included.
    Transaction(TransactionId),
    /// Entries for one document.
    Document(DocumentId),
}

/// One immutable ledger fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// Transaction the fact belongs to, if any.
    pub transaction_id: Option<TransactionId>,
    /// Document the fact is about, if any.
    pub document_id: Option<DocumentId>,
    /// Who caused it.
    pub actor_id: ActorId,
    /// What happened.
    pub action: LedgerAction,
    /// Structured payload; opaque except to replay.
    pub details: Value,
    /// Append time.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Entry for a transaction-level event.
    #[must_use]
    pub fn for_transaction(
        transaction_id: TransactionId,
        actor_id: ActorId,
        action: LedgerAction,
        details: Value,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            transaction_id: Some(transaction_id),
            document_id: None,
            actor_id,
            action,
            details,
            created_at: at,
        }
    }

    /// Entry for a document-level event, linked to the document's transaction.
    #[must_use]
    pub fn for_document(
        document: &Document,
        actor_id: ActorId,
        action: LedgerAction,
        details: Value,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            transaction_id: document.transaction_id,
            document_id: Some(document.id),
            actor_id,
            action,
            details,
            created_at: at,
        }
    }

    /// Document type named in the details, if present and recognised.
    #[must_use]
    pub fn detail_doc_type(&self, key: &str) -> Option<DocumentType> {
        self.details
            .get(key)
            .and_then(Value::as_str)
            .and_then(DocumentType::parse)
    }
}

/// Details payload for `DOCUMENT_UPLOADED`.
#[must_use]
pub fn upload_details(document: &Document) -> Value {
    json!({
        "doc_type": document.doc_type.as_str(),
        "doc_number": document.doc_number,
        "content_hash": document.content_hash,
    })
}

/// Details payload for a policy-matrix action.
#[must_use]
pub fn action_details(from: DocumentType, to: DocumentType, metadata: Value) -> Value {
    json!({
        "doc_type": from.as_str(),
        "next_doc_type": to.as_str(),
        "metadata": metadata,
    })
}
