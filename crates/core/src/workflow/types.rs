//! Trade transaction domain types.
//!
//! A trade transaction moves through a strictly linear lifecycle:
//! `PO_CREATED → PO_APPROVED → PO_SHIPPED → PO_COMPLETED`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tradeflow_shared::types::{ActorId, CurrencyCode, Money, TransactionId};

/// Lifecycle status of a trade transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Purchase order raised by the buyer.
    PoCreated,
    /// Purchase order approved by the bank.
    PoApproved,
    /// Goods shipped.
    PoShipped,
    /// Settled. Terminal.
    PoCompleted,
}

impl TransactionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::PoCreated,
        Self::PoApproved,
        Self::PoShipped,
        Self::PoCompleted,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoCreated => "PO_CREATED",
            Self::PoApproved => "PO_APPROVED",
            Self::PoShipped => "PO_SHIPPED",
            Self::PoCompleted => "PO_COMPLETED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PO_CREATED" => Some(Self::PoCreated),
            "PO_APPROVED" => Some(Self::PoApproved),
            "PO_SHIPPED" => Some(Self::PoShipped),
            "PO_COMPLETED" => Some(Self::PoCompleted),
            _ => None,
        }
    }

    /// Returns true once the transaction is settled.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PoCompleted)
    }

    /// The only status this one may advance to.
    #[must_use]
    pub fn successor(&self) -> Option<Self> {
        match self {
            Self::PoCreated => Some(Self::PoApproved),
            Self::PoApproved => Some(Self::PoShipped),
            Self::PoShipped => Some(Self::PoCompleted),
            Self::PoCompleted => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse lifecycle actions on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionAction {
    /// Raise a purchase order.
    Create,
    /// Approve the purchase order.
    Approve,
    /// Mark goods as shipped.
    Ship,
    /// Settle the trade.
    Complete,
}

impl TransactionAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Approve => "APPROVE",
            Self::Ship => "SHIP",
            Self::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for TransactionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The unit of trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTransaction {
    /// Transaction identifier.
    pub id: TransactionId,
    /// Buyer who raised the purchase order.
    pub buyer_id: ActorId,
    /// Seller, once assigned.
    pub seller_id: Option<ActorId>,
    /// Trade amount, always positive.
    pub amount: Decimal,
    /// ISO 4217 currency.
    pub currency: CurrencyCode,
    /// Buyer jurisdiction used for country risk.
    pub buyer_country: Option<String>,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl TradeTransaction {
    /// Amount and currency together.
    #[must_use]
    pub fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }
}

/// Input for raising a purchase order.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Trade amount; must be positive.
    pub amount: Decimal,
    /// ISO 4217 currency.
    pub currency: CurrencyCode,
    /// Seller, if already known.
    pub seller_id: Option<ActorId>,
    /// Buyer jurisdiction.
    pub buyer_country: Option<String>,
    /// Purchase order number.
    pub po_number: String,
    /// Purchase order file contents.
    pub po_content: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str_round_trip() {
        for status in TransactionStatus::ALL {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            TransactionStatus::parse("po_shipped"),
            Some(TransactionStatus::PoShipped)
        );
        assert_eq!(TransactionStatus::parse("DRAFT"), None);
    }

    #[test]
    fn test_status_successors_are_linear() {
        assert_eq!(
            TransactionStatus::PoCreated.successor(),
            Some(TransactionStatus::PoApproved)
        );
        assert_eq!(
            TransactionStatus::PoApproved.successor(),
            Some(TransactionStatus::PoShipped)
        );
        assert_eq!(
            TransactionStatus::PoShipped.successor(),
            Some(TransactionStatus::PoCompleted)
        );
        assert_eq!(TransactionStatus::PoCompleted.successor(), None);
        assert!(TransactionStatus::PoCompleted.is_terminal());
        assert!(!TransactionStatus::PoShipped.is_terminal());
    }

    #[test]
    fn test_status_serde_uses_wire_names() {
        let json = serde_json::to_string(&TransactionStatus::PoCreated).unwrap();
        assert_eq!(json, "\"PO_CREATED\"");
    }
}
