//! Property-based tests for the risk engine.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tradeflow_shared::config::RiskSettings;
use tradeflow_shared::types::{ActorId, CurrencyCode, DocumentId, TransactionId};
use uuid::Uuid;

use crate::document::types::{Document, DocumentType, Verification};
use crate::risk::engine::RiskEngine;
use crate::risk::types::RiskLevel;
use crate::workflow::types::{TradeTransaction, TransactionStatus};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 .. 10,000,000.00
    (1i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_country() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop_oneof![
        Just("US".to_string()),
        Just("UK".to_string()),
        Just("SG".to_string()),
        "[A-Z]{2,3}",
    ])
}

fn arb_document() -> impl Strategy<Value = Document> {
    (
        proptest::sample::select(DocumentType::ALL.to_vec()),
        any::<bool>(),
        any::<u128>(),
    )
        .prop_map(|(doc_type, verified, seed)| {
            let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
            Document {
                id: DocumentId::from_uuid(Uuid::from_u128(seed)),
                transaction_id: None,
                owner_id: ActorId::from_uuid(Uuid::from_u128(seed ^ 1)),
                doc_type,
                doc_number: format!("{doc_type}-{seed}"),
                storage_ref: String::new(),
                content_hash: String::new(),
                verification: verified.then(|| Verification {
                    verified_by: ActorId::from_uuid(Uuid::from_u128(seed ^ 2)),
                    verified_at: at,
                }),
                created_at: at,
            }
        })
}

fn arb_transaction() -> impl Strategy<Value = TradeTransaction> {
    (arb_amount(), arb_country(), any::<u128>()).prop_map(|(amount, buyer_country, seed)| {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        TradeTransaction {
            id: TransactionId::from_uuid(Uuid::from_u128(seed)),
            buyer_id: ActorId::from_uuid(Uuid::from_u128(seed ^ 3)),
            seller_id: None,
            amount,
            currency: CurrencyCode::USD,
            buyer_country,
            status: TransactionStatus::PoShipped,
            created_at: at,
            updated_at: at,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Identical inputs give identical outputs.
    #[test]
    fn prop_score_is_deterministic(
        tx in arb_transaction(),
        docs in proptest::collection::vec(arb_document(), 0..8),
        recent in 0u64..20,
    ) {
        let engine = RiskEngine::from_settings(&RiskSettings::default());
        let first = engine.score(&tx, &docs, recent);
        let second = engine.score(&tx, &docs, recent);
        prop_assert_eq!(first, second);
    }

    /// Score stays in range and the level always matches the score.
    #[test]
    fn prop_score_bounded_and_classified(
        tx in arb_transaction(),
        docs in proptest::collection::vec(arb_document(), 0..8),
        recent in 0u64..50,
    ) {
        let engine = RiskEngine::from_settings(&RiskSettings::default());
        let result = engine.score(&tx, &docs, recent);
        prop_assert!(result.score <= 100);
        prop_assert_eq!(result.level, RiskLevel::from_score(result.score));
        prop_assert!(result.reasons.len() <= 5);
    }

    /// Every rule that fires adds points; no reasons means a zero score.
    #[test]
    fn prop_reasons_account_for_score(
        tx in arb_transaction(),
        docs in proptest::collection::vec(arb_document(), 0..8),
        recent in 0u64..20,
    ) {
        let engine = RiskEngine::from_settings(&RiskSettings::default());
        let result = engine.score(&tx, &docs, recent);
        prop_assert_eq!(result.reasons.is_empty(), result.score == 0);
    }

    /// More recent activity never lowers the score.
    #[test]
    fn prop_velocity_is_monotonic(
        tx in arb_transaction(),
        docs in proptest::collection::vec(arb_document(), 0..8),
        recent in 0u64..20,
        extra in 0u64..20,
    ) {
        let engine = RiskEngine::from_settings(&RiskSettings::default());
        let lower = engine.score(&tx, &docs, recent);
        let higher = engine.score(&tx, &docs, recent + extra);
        prop_assert!(higher.score >= lower.score);
    }
}
