//! Audit trail domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tradeflow_shared::types::{ActorId, AuditLogId};
use uuid::Uuid;

/// Administrative actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Purchase order raised.
    PoCreated,
    /// Purchase order approved.
    PoApproved,
    /// Goods shipped.
    PoShipped,
    /// Trade settled.
    PoCompleted,
    /// Document attached.
    DocumentUploaded,
    /// Document verified.
    Verified,
    /// Policy-matrix action performed on a document.
    DocumentAction,
    /// Risk score computed on demand.
    RiskAssessed,
    /// Transaction report exported.
    Export,
    /// Transaction deleted by an administrator.
    TransactionDeleted,
}

impl AuditAction {
    /// Every audit action.
    pub const ALL: [Self; 10] = [
        Self::PoCreated,
        Self::PoApproved,
        Self::PoShipped,
        Self::PoCompleted,
        Self::DocumentUploaded,
        Self::Verified,
        Self::DocumentAction,
        Self::RiskAssessed,
        Self::Export,
        Self::TransactionDeleted,
    ];

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
            Self::DocumentAction => "DOCUMENT_ACTION",
            Self::RiskAssessed => "RISK_ASSESSED",
            Self::Export => "EXPORT",
            Self::TransactionDeleted => "TRANSACTION_DELETED",
        }
    }

    /// Parses an action from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == s)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of entity an audit entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// A trade transaction.
    Transaction,
    /// A trade document.
    Document,
}

impl EntityType {
    /// Returns the string representation of the entity type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "TRANSACTION",
            Self::Document => "DOCUMENT",
        }
    }

    /// Parses an entity type from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TRANSACTION" => Some(Self::Transaction),
            "DOCUMENT" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Who did what to which entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Entry identifier.
    pub id: AuditLogId,
    /// Acting identity.
    pub actor_id: ActorId,
    /// What was done.
    pub action: AuditAction,
    /// Kind of entity.
    pub entity_type: EntityType,
    /// Entity identifier.
    pub entity_id: Uuid,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}
