//! Postgres enum types and their mapping onto the core domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tradeflow_core::audit::{AuditAction, EntityType};
use tradeflow_core::document::DocumentType;
use tradeflow_core::ledger::LedgerAction;
use tradeflow_core::risk::RiskLevel;
use tradeflow_core::workflow::TransactionStatus;

/// Defines a database enum that mirrors a core enum variant for variant,
/// with conversions in both directions.
macro_rules! mirror_enum {
    (
        $(#[$meta:meta])*
        $name:ident = $db_name:literal <=> $core:ident {
            $($variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
        #[sea_orm(rs_type = "String", db_type = "Enum", enum_name = $db_name)]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                #[sea_orm(string_value = $value)]
                $variant,
            )+
        }

        impl From<$core> for $name {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$name> for $core {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => $core::$variant,)+
                }
            }
        }
    };
}

mirror_enum! {
    /// `trade_status`
    TradeStatus = "trade_status" <=> TransactionStatus {
        PoCreated = "PO_CREATED",
        PoApproved = "PO_APPROVED",
        PoShipped = "PO_SHIPPED",
        PoCompleted = "PO_COMPLETED",
    }
}

mirror_enum! {
    /// `document_type`
    DocType = "document_type" <=> DocumentType {
        Po = "PO",
        Invoice = "INVOICE",
        BillOfLading = "BILL_OF_LADING",
        Loc = "LOC",
        Coo = "COO",
        InsuranceCert = "INSURANCE_CERT",
    }
}

mirror_enum! {
    /// `ledger_action`
    LedgerActionKind = "ledger_action" <=> LedgerAction {
        PoCreated = "PO_CREATED",
        PoApproved = "PO_APPROVED",
        PoShipped = "PO_SHIPPED",
        PoCompleted = "PO_COMPLETED",
        DocumentUploaded = "DOCUMENT_UPLOADED",
        Verified = "VERIFIED",
        Amended = "AMENDED",
        Received = "RECEIVED",
        Shipped = "SHIPPED",
        IssueBol = "ISSUE_BOL",
        IssueInvoice = "ISSUE_INVOICE",
        Paid = "PAID",
        IssueLoc = "ISSUE_LOC",
    }
}

mirror_enum! {
    /// `risk_level`
    RiskLevelKind = "risk_level" <=> RiskLevel {
        Low = "LOW",
        Medium = "MEDIUM",
        High = "HIGH",
    }
}

mirror_enum! {
    /// `audit_action`
    AuditActionKind = "audit_action" <=> AuditAction {
        PoCreated = "PO_CREATED",
        PoApproved = "PO_APPROVED",
        PoShipped = "PO_SHIPPED",
        PoCompleted = "PO_COMPLETED",
        DocumentUploaded = "DOCUMENT_UPLOADED",
        Verified = "VERIFIED",
        DocumentAction = "DOCUMENT_ACTION",
        RiskAssessed = "RISK_ASSESSED",
        Export = "EXPORT",
        TransactionDeleted = "TRANSACTION_DELETED",
    }
}

mirror_enum! {
    /// `audit_entity_type`
    AuditEntityType = "audit_entity_type" <=> EntityType {
        Transaction = "TRANSACTION",
        Document = "DOCUMENT",
    }
}
