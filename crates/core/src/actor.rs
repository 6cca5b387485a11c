//! Authenticated actors as supplied by the identity collaborator.
//!
//! The engine performs no credential checks; it trusts the `(id, role)` pair
//! it is handed and gates every operation on the role.

use serde::{Deserialize, Serialize};
use std::fmt;
use tradeflow_shared::types::ActorId;

/// Role of an actor in the trade workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Corporate buyer; creates purchase orders and ships.
    #[serde(alias = "corporate")]
    Buyer,
    /// Seller; issues bills of lading and invoices.
    Seller,
    /// Bank; approves, verifies, issues letters of credit and settles.
    Bank,
    /// Auditor; verifies POs and letters of credit, reads everything.
    Auditor,
    /// Administrator; reads everything and runs destructive tooling.
    Admin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Buyer,
        Self::Seller,
        Self::Bank,
        Self::Auditor,
        Self::Admin,
    ];

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Bank => "bank",
            Self::Auditor => "auditor",
            Self::Admin => "admin",
        }
    }

    /// Parses a role from a string. `corporate` is accepted for the buyer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buyer" | "corporate" => Some(Self::Buyer),
            "seller" => Some(Self::Seller),
            "bank" => Some(Self::Bank),
            "auditor" => Some(Self::Auditor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated identity with exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Actor identifier.
    pub id: ActorId,
    /// The actor's role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(id: ActorId, role: Role) -> Self {
        Self { id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("buyer"), Some(Role::Buyer));
        assert_eq!(Role::parse("CORPORATE"), Some(Role::Buyer));
        assert_eq!(Role::parse("Bank"), Some(Role::Bank));
        assert_eq!(Role::parse("seller"), Some(Role::Seller));
        assert_eq!(Role::parse("auditor"), Some(Role::Auditor));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("viewer"), None);
    }

    #[test]
    fn test_role_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_role_serde_accepts_corporate_alias() {
        let role: Role = serde_json::from_str("\"corporate\"").unwrap();
        assert_eq!(role, Role::Buyer);
        assert_eq!(serde_json::to_string(&Role::Buyer).unwrap(), "\"buyer\"");
    }
}
