//! Trade document domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tradeflow_shared::types::{ActorId, DocumentId, TransactionId};

/// Kind of trade artifact.
///
/// The set is closed: an unrecognised type is a parse error, never a silent
/// no-op in the policy matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Purchase order.
    Po,
    /// Commercial invoice.
    Invoice,
    /// Bill of lading (shipment proof).
    #[serde(alias = "BOL")]
    BillOfLading,
    /// Letter of credit.
    Loc,
    /// Certificate of origin.
    Coo,
    /// Insurance certificate.
    InsuranceCert,
}

impl DocumentType {
    /// Every document type.
    pub const ALL: [Self; 6] = [
        Self::Po,
        Self::Invoice,
        Self::BillOfLading,
        Self::Loc,
        Self::Coo,
        Self::InsuranceCert,
    ];

    /// Documents that must be verified before a trade can settle, in report order.
    pub const REQUIRED_FOR_SETTLEMENT: [Self; 3] = [Self::Po, Self::Invoice, Self::BillOfLading];

    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Po => "PO",
            Self::Invoice => "INVOICE",
            Self::BillOfLading => "BILL_OF_LADING",
            Self::Loc => "LOC",
            Self::Coo => "COO",
            Self::InsuranceCert => "INSURANCE_CERT",
        }
    }

    /// Parses a document type. `BOL` is accepted for the bill of lading.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PO" => Some(Self::Po),
            "INVOICE" => Some(Self::Invoice),
            "BILL_OF_LADING" | "BOL" => Some(Self::BillOfLading),
            "LOC" => Some(Self::Loc),
            "COO" => Some(Self::Coo),
            "INSURANCE_CERT" => Some(Self::InsuranceCert),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document-level actions gated by the policy matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentAction {
    /// Buyer amends a purchase order.
    Amend,
    /// Buyer confirms receipt against a bill of lading.
    Received,
    /// Seller confirms shipment against a bill of lading.
    Shipped,
    /// Seller turns a PO or LOC into a bill of lading.
    IssueBol,
    /// Seller turns a bill of lading into an invoice.
    IssueInvoice,
    /// Verification by an authorised reviewer.
    Verify,
    /// Bank records payment of an invoice.
    Paid,
    /// Bank turns a PO into a letter of credit.
    IssueLoc,
}

impl DocumentAction {
    /// Every document action.
    pub const ALL: [Self; 8] = [
        Self::Amend,
        Self::Received,
        Self::Shipped,
        Self::IssueBol,
        Self::IssueInvoice,
        Self::Verify,
        Self::Paid,
        Self::IssueLoc,
    ];

    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amend => "AMEND",
            Self::Received => "RECEIVED",
            Self::Shipped => "SHIPPED",
            Self::IssueBol => "ISSUE_BOL",
            Self::IssueInvoice => "ISSUE_INVOICE",
            Self::Verify => "VERIFY",
            Self::Paid => "PAID",
            Self::IssueLoc => "ISSUE_LOC",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for DocumentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who verified a document and when. Set exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// The verifier.
    pub verified_by: ActorId,
    /// When the document was verified.
    pub verified_at: DateTime<Utc>,
}

/// One trade artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier.
    pub id: DocumentId,
    /// Owning transaction, if any.
    pub transaction_id: Option<TransactionId>,
    /// Uploader.
    pub owner_id: ActorId,
    /// Current type; advanced only by policy-approved actions.
    pub doc_type: DocumentType,
    /// Business reference number, unique per transaction and type.
    pub doc_number: String,
    /// Opaque reference returned by the storage collaborator.
    pub storage_ref: String,
    /// Lowercase hex SHA-256 of the uploaded bytes.
    pub content_hash: String,
    /// Verification stamp; `None` until verified, never cleared.
    pub verification: Option<Verification>,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Returns true once the document has been verified.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verification.is_some()
    }

    /// The verifier, if verified.
    #[must_use]
    pub fn verified_by(&self) -> Option<ActorId> {
        self.verification.map(|v| v.verified_by)
    }

    /// Verification time, if verified.
    #[must_use]
    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verification.map(|v| v.verified_at)
    }
}

/// Input for uploading a document against a transaction.
#[derive(Debug, Clone)]
pub struct UploadDocumentInput {
    /// Target transaction.
    pub transaction_id: TransactionId,
    /// Document type.
    pub doc_type: DocumentType,
    /// Business reference number.
    pub doc_number: String,
    /// File contents.
    pub content: Vec<u8>,
}
