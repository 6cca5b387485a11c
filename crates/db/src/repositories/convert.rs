//! Row ↔ domain conversions.
//!
//! Reading a row that violates a domain invariant yields
//! [`StoreError::Corrupt`]; the engine never sees a half-valid value.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::ActiveValue::Set;
use tradeflow_core::audit::AuditLogEntry;
use tradeflow_core::document::{Document, Verification};
use tradeflow_core::ledger::LedgerEntry;
use tradeflow_core::risk::RiskScore;
use tradeflow_core::workflow::TradeTransaction;
use tradeflow_core::StoreError;
use tradeflow_shared::types::{
    ActorId, AuditLogId, DocumentId, LedgerEntryId, RiskScoreId, TransactionId,
};

use crate::entities::{audit_logs, documents, ledger_entries, risk_scores, trade_transactions};

pub(crate) fn utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn corrupt(table: &str, id: uuid::Uuid, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{table} {id}: {detail}"))
}

pub(crate) fn transaction_from_model(
    model: trade_transactions::Model,
) -> Result<TradeTransaction, StoreError> {
    let currency = model
        .currency
        .trim()
        .parse()
        .map_err(|e| corrupt("trade_transactions", model.id, e))?;
    Ok(TradeTransaction {
        id: TransactionId::from_uuid(model.id),
        buyer_id: ActorId::from_uuid(model.buyer_id),
        seller_id: model.seller_id.map(ActorId::from_uuid),
        amount: model.amount,
        currency,
        buyer_country: model.buyer_country,
        status: model.status.into(),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

pub(crate) fn transaction_to_active(transaction: &TradeTransaction) -> trade_transactions::ActiveModel {
    trade_transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        buyer_id: Set(transaction.buyer_id.into_inner()),
        seller_id: Set(transaction.seller_id.map(ActorId::into_inner)),
        amount: Set(transaction.amount),
        currency: Set(transaction.currency.as_str().to_string()),
        buyer_country: Set(transaction.buyer_country.clone()),
        status: Set(transaction.status.into()),
        created_at: Set(transaction.created_at.into()),
        updated_at: Set(transaction.updated_at.into()),
    }
}

pub(crate) fn document_from_model(model: documents::Model) -> Result<Document, StoreError> {
    let verification = match (model.is_verified, model.verified_by, model.verified_at) {
        (true, Some(by), Some(at)) => Some(Verification {
            verified_by: ActorId::from_uuid(by),
            verified_at: utc(at),
        }),
        (false, None, None) => None,
        _ => return Err(corrupt("documents", model.id, "inconsistent verification columns")),
    };
    Ok(Document {
        id: DocumentId::from_uuid(model.id),
        transaction_id: model.transaction_id.map(TransactionId::from_uuid),
        owner_id: ActorId::from_uuid(model.owner_id),
        doc_type: model.doc_type.into(),
        doc_number: model.doc_number,
        storage_ref: model.storage_ref,
        content_hash: model.content_hash,
        verification,
        created_at: utc(model.created_at),
    })
}

pub(crate) fn document_to_active(document: &Document) -> documents::ActiveModel {
    documents::ActiveModel {
        id: Set(document.id.into_inner()),
        transaction_id: Set(document.transaction_id.map(TransactionId::into_inner)),
        owner_id: Set(document.owner_id.into_inner()),
        doc_type: Set(document.doc_type.into()),
        doc_number: Set(document.doc_number.clone()),
        storage_ref: Set(document.storage_ref.clone()),
        content_hash: Set(document.content_hash.clone()),
        is_verified: Set(document.is_verified()),
        verified_by: Set(document.verified_by().map(ActorId::into_inner)),
        verified_at: Set(document.verified_at().map(Into::into)),
        created_at: Set(document.created_at.into()),
    }
}

pub(crate) fn ledger_from_model(model: ledger_entries::Model) -> LedgerEntry {
    LedgerEntry {
        id: LedgerEntryId::from_uuid(model.id),
        transaction_id: model.transaction_id.map(TransactionId::from_uuid),
        document_id: model.document_id.map(DocumentId::from_uuid),
        actor_id: ActorId::from_uuid(model.actor_id),
        action: model.action.into(),
        details: model.details,
        created_at: utc(model.created_at),
    }
}

pub(crate) fn ledger_to_active(entry: &LedgerEntry) -> ledger_entries::ActiveModel {
    ledger_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        transaction_id: Set(entry.transaction_id.map(TransactionId::into_inner)),
        document_id: Set(entry.document_id.map(DocumentId::into_inner)),
        actor_id: Set(entry.actor_id.into_inner()),
        action: Set(entry.action.into()),
        details: Set(entry.details.clone()),
        created_at: Set(entry.created_at.into()),
    }
}

pub(crate) fn risk_from_model(model: risk_scores::Model) -> Result<RiskScore, StoreError> {
    let score = u8::try_from(model.score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| corrupt("risk_scores", model.id, format!("score {} out of range", model.score)))?;
    let rationale: Vec<String> = serde_json::from_value(model.rationale)
        .map_err(|e| corrupt("risk_scores", model.id, e))?;
    Ok(RiskScore {
        id: RiskScoreId::from_uuid(model.id),
        transaction_id: model.transaction_id.map(TransactionId::from_uuid),
        buyer_id: ActorId::from_uuid(model.buyer_id),
        score,
        level: model.level.into(),
        rationale,
        computed_at: utc(model.computed_at),
    })
}

pub(crate) fn risk_to_active(score: &RiskScore) -> risk_scores::ActiveModel {
    risk_scores::ActiveModel {
        id: Set(score.id.into_inner()),
        transaction_id: Set(score.transaction_id.map(TransactionId::into_inner)),
        buyer_id: Set(score.buyer_id.into_inner()),
        score: Set(i16::from(score.score)),
        level: Set(score.level.into()),
        rationale: Set(serde_json::Value::from(score.rationale.clone())),
        computed_at: Set(score.computed_at.into()),
    }
}

pub(crate) fn audit_from_model(model: audit_logs::Model) -> AuditLogEntry {
    AuditLogEntry {
        id: AuditLogId::from_uuid(model.id),
        actor_id: ActorId::from_uuid(model.actor_id),
        action: model.action.into(),
        entity_type: model.entity_type.into(),
        entity_id: model.entity_id,
        created_at: utc(model.created_at),
    }
}

pub(crate) fn audit_to_active(entry: &AuditLogEntry) -> audit_logs::ActiveModel {
    audit_logs::ActiveModel {
        id: Set(entry.id.into_inner()),
        actor_id: Set(entry.actor_id.into_inner()),
        action: Set(entry.action.into()),
        entity_type: Set(entry.entity_type.into()),
        entity_id: Set(entry.entity_id),
        created_at: Set(entry.created_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::{DocType, RiskLevelKind, TradeStatus};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use tradeflow_core::document::DocumentType;
    use tradeflow_core::risk::RiskLevel;
    use tradeflow_core::workflow::TransactionStatus;
    use uuid::Uuid;

    fn now() -> DateTime<FixedOffset> {
        Utc::now().into()
    }

    fn transaction_model(currency: &str) -> trade_transactions::Model {
        trade_transactions::Model {
            id: Uuid::now_v7(),
            buyer_id: Uuid::now_v7(),
            seller_id: None,
            amount: dec!(2500.5000),
            currency: currency.to_string(),
            buyer_country: Some("US".into()),
            status: TradeStatus::PoShipped,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn document_model(is_verified: bool, verified_by: Option<Uuid>) -> documents::Model {
        documents::Model {
            id: Uuid::now_v7(),
            transaction_id: Some(Uuid::now_v7()),
            owner_id: Uuid::now_v7(),
            doc_type: DocType::BillOfLading,
            doc_number: "BOL-1".into(),
            storage_ref: "t/d/BOL-1".into(),
            content_hash: "ab".repeat(32),
            is_verified,
            verified_by,
            verified_at: verified_by.map(|_| now()),
            created_at: now(),
        }
    }

    #[test]
    fn test_transaction_model_maps_to_domain() {
        let model = transaction_model("usd");
        let transaction = transaction_from_model(model.clone()).unwrap();
        assert_eq!(transaction.id.into_inner(), model.id);
        assert_eq!(transaction.currency.as_str(), "USD");
        assert_eq!(transaction.status, TransactionStatus::PoShipped);
        assert_eq!(transaction.amount, dec!(2500.5));
    }

    #[test]
    fn test_bad_currency_is_corrupt() {
        let err = transaction_from_model(transaction_model("US")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_document_verification_columns() {
        let by = Uuid::now_v7();
        let document = document_from_model(document_model(true, Some(by))).unwrap();
        assert_eq!(document.doc_type, DocumentType::BillOfLading);
        assert_eq!(document.verified_by().map(ActorId::into_inner), Some(by));

        let document = document_from_model(document_model(false, None)).unwrap();
        assert!(!document.is_verified());

        let err = document_from_model(document_model(true, None)).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn test_risk_rationale_and_range() {
        let mut model = risk_scores::Model {
            id: Uuid::now_v7(),
            transaction_id: None,
            buyer_id: Uuid::now_v7(),
            score: 60,
            level: RiskLevelKind::Medium,
            rationale: json!(["very high amount (> 1,000,000)", "high-risk jurisdiction: NG"]),
            computed_at: now(),
        };
        let score = risk_from_model(model.clone()).unwrap();
        assert_eq!(score.score, 60);
        assert_eq!(score.level, RiskLevel::Medium);
        assert_eq!(score.rationale.len(), 2);

        model.score = 140;
        assert!(matches!(risk_from_model(model.clone()), Err(StoreError::Corrupt(_))));
        model.score = 10;
        model.rationale = json!({ "not": "a list" });
        assert!(matches!(risk_from_model(model), Err(StoreError::Corrupt(_))));
    }
}
