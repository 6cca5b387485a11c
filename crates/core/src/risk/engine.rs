//! Additive risk scoring.
//!
//! Scoring is a pure function of its inputs. The two external signals, the
//! jurisdiction lookup and the buyer's recent transaction count, are passed
//! in explicitly so identical inputs always produce identical output.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tradeflow_shared::config::RiskSettings;

use super::types::{RiskAssessment, RiskLevel};
use crate::document::types::{Document, DocumentType};
use crate::workflow::types::TradeTransaction;

const VERY_HIGH_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const HIGH_AMOUNT: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

const VERY_HIGH_AMOUNT_POINTS: u32 = 40;
const HIGH_AMOUNT_POINTS: u32 = 20;
const MISSING_DOCUMENTS_POINTS: u32 = 30;
const UNVERIFIED_POINTS: u32 = 20;
const COUNTRY_POINTS: u32 = 20;
const VELOCITY_POINTS: u32 = 25;
const MAX_SCORE: u32 = 100;

/// Jurisdiction used when the transaction carries none.
pub const UNKNOWN_COUNTRY: &str = "UNKNOWN";

/// Country-risk signal.
pub trait CountryRiskLookup: Send + Sync {
    /// Returns true if `country` adds no jurisdiction risk.
    fn is_low_risk(&self, country: &str) -> bool;
}

/// Allow-list of low-risk jurisdictions, compared case-insensitively.
#[derive(Debug, Clone)]
pub struct AllowListLookup {
    countries: BTreeSet<String>,
}

impl AllowListLookup {
    /// Builds a lookup from country codes or names.
    pub fn new<I, S>(countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            countries: countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .collect(),
        }
    }
}

impl CountryRiskLookup for AllowListLookup {
    fn is_low_risk(&self, country: &str) -> bool {
        self.countries.contains(&country.trim().to_uppercase())
    }
}

/// Additive, capped risk model.
#[derive(Debug, Clone)]
pub struct RiskEngine<C = AllowListLookup> {
    lookup: C,
    velocity_threshold: u64,
    velocity_window_hours: u32,
}

impl RiskEngine<AllowListLookup> {
    /// Engine configured from settings.
    #[must_use]
    pub fn from_settings(settings: &RiskSettings) -> Self {
        Self::new(
            AllowListLookup::new(&settings.low_risk_countries),
            settings.velocity_threshold,
        )
        .with_velocity_window_hours(settings.velocity_window_hours)
    }
}

impl<C: CountryRiskLookup> RiskEngine<C> {
    /// Creates an engine. More than `velocity_threshold` transactions in the
    /// last 24 hours trips the velocity rule.
    #[must_use]
    pub fn new(lookup: C, velocity_threshold: u64) -> Self {
        Self {
            lookup,
            velocity_threshold,
            velocity_window_hours: 24,
        }
    }

    /// Override the velocity window.
    #[must_use]
    pub fn with_velocity_window_hours(mut self, hours: u32) -> Self {
        self.velocity_window_hours = hours;
        self
    }

    /// Trailing window the caller counts `recent_count` over.
    #[must_use]
    pub fn velocity_window(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.velocity_window_hours))
    }

    /// Scores a transaction.
    ///
    /// `documents` are the transaction's documents; `recent_count` is the
    /// number of transactions the buyer created in the velocity window.
    #[must_use]
    pub fn score(
        &self,
        transaction: &TradeTransaction,
        documents: &[Document],
        recent_count: u64,
    ) -> RiskAssessment {
        let mut points: u32 = 0;
        let mut reasons = Vec::new();

        if transaction.amount > VERY_HIGH_AMOUNT {
            points += VERY_HIGH_AMOUNT_POINTS;
            reasons.push("very high amount (> 1,000,000)".to_string());
        } else if transaction.amount > HIGH_AMOUNT {
            points += HIGH_AMOUNT_POINTS;
            reasons.push("high amount (> 100,000)".to_string());
        }

        let present: BTreeSet<DocumentType> = documents.iter().map(|d| d.doc_type).collect();
        let missing: Vec<&str> = DocumentType::REQUIRED_FOR_SETTLEMENT
            .iter()
            .filter(|t| !present.contains(t))
            .map(DocumentType::as_str)
            .collect();
        if !missing.is_empty() {
            points += MISSING_DOCUMENTS_POINTS;
            reasons.push(format!("missing required documents: {}", missing.join(", ")));
        }

        let unverified = documents.iter().filter(|d| !d.is_verified()).count();
        if unverified > 0 {
            points += UNVERIFIED_POINTS;
            reasons.push(format!("{unverified} unverified documents"));
        }

        let country = transaction
            .buyer_country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_COUNTRY);
        if !self.lookup.is_low_risk(country) {
            points += COUNTRY_POINTS;
            reasons.push(format!("high-risk jurisdiction: {country}"));
        }

        if recent_count > self.velocity_threshold {
            points += VELOCITY_POINTS;
            reasons.push(format!(
                "high velocity: {recent_count} transactions in {}h",
                self.velocity_window_hours
            ));
        }

        let score = u8::try_from(points.min(MAX_SCORE)).unwrap_or(u8::MAX);
        RiskAssessment {
            score,
            level: RiskLevel::from_score(score),
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::Verification;
    use crate::workflow::types::TransactionStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tradeflow_shared::types::{ActorId, CurrencyCode, DocumentId, TransactionId};

    fn transaction(amount: Decimal, country: Option<&str>) -> TradeTransaction {
        let now = Utc::now();
        TradeTransaction {
            id: TransactionId::new(),
            buyer_id: ActorId::new(),
            seller_id: None,
            amount,
            currency: CurrencyCode::USD,
            buyer_country: country.map(String::from),
            status: TransactionStatus::PoShipped,
            created_at: now,
            updated_at: now,
        }
    }

    fn document(doc_type: DocumentType, verified: bool) -> Document {
        Document {
            id: DocumentId::new(),
            transaction_id: None,
            owner_id: ActorId::new(),
            doc_type,
            doc_number: format!("{doc_type}-1"),
            storage_ref: String::new(),
            content_hash: String::new(),
            verification: verified.then(|| Verification {
                verified_by: ActorId::new(),
                verified_at: Utc::now(),
            }),
            created_at: Utc::now(),
        }
    }

    fn engine() -> RiskEngine {
        RiskEngine::from_settings(&RiskSettings::default())
    }

    fn complete_set() -> Vec<Document> {
        DocumentType::REQUIRED_FOR_SETTLEMENT
            .iter()
            .map(|t| document(*t, true))
            .collect()
    }

    #[test]
    fn test_clean_transaction_scores_zero() {
        let result = engine().score(&transaction(dec!(50000), Some("USA")), &complete_set(), 0);
        assert_eq!(result.score, 0);
        assert_eq!(result.level, RiskLevel::Low);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_very_high_amount() {
        let result = engine().score(&transaction(dec!(2000000), Some("US")), &complete_set(), 0);
        assert_eq!(result.score, 40);
        assert_eq!(result.level, RiskLevel::Medium);
        assert!(result.reasons[0].contains("very high amount"));
    }

    #[test]
    fn test_amount_boundaries_are_strict() {
        let at_high = engine().score(&transaction(dec!(100000), Some("US")), &complete_set(), 0);
        assert_eq!(at_high.score, 0);
        let above_high = engine().score(&transaction(dec!(100000.01), Some("US")), &complete_set(), 0);
        assert_eq!(above_high.score, 20);
        let at_very_high = engine().score(&transaction(dec!(1000000), Some("US")), &complete_set(), 0);
        assert_eq!(at_very_high.score, 20);
    }

    #[test]
    fn test_missing_documents_listed_in_order() {
        let docs = vec![document(DocumentType::Invoice, true)];
        let result = engine().score(&transaction(dec!(10), Some("UK")), &docs, 0);
        assert_eq!(result.score, 30);
        assert_eq!(
            result.reasons,
            vec!["missing required documents: PO, BILL_OF_LADING".to_string()]
        );
    }

    #[test]
    fn test_unverified_count() {
        let mut docs = complete_set();
        docs.push(document(DocumentType::Coo, false));
        docs.push(document(DocumentType::Loc, false));
        let result = engine().score(&transaction(dec!(10), Some("GB")), &docs, 0);
        assert_eq!(result.score, 20);
        assert_eq!(result.reasons, vec!["2 unverified documents".to_string()]);
    }

    #[test]
    fn test_missing_country_is_unknown() {
        let result = engine().score(&transaction(dec!(10), None), &complete_set(), 0);
        assert_eq!(result.score, 20);
        assert_eq!(result.reasons, vec!["high-risk jurisdiction: UNKNOWN".to_string()]);
    }

    #[test]
    fn test_country_lookup_is_case_insensitive() {
        let result = engine().score(&transaction(dec!(10), Some(" usa ")), &complete_set(), 0);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_velocity_threshold_is_exclusive() {
        let tx = transaction(dec!(10), Some("US"));
        assert_eq!(engine().score(&tx, &complete_set(), 5).score, 0);
        let result = engine().score(&tx, &complete_set(), 6);
        assert_eq!(result.score, 25);
        assert_eq!(result.reasons, vec!["high velocity: 6 transactions in 24h".to_string()]);
    }

    #[test]
    fn test_velocity_reason_names_configured_window() {
        let settings = RiskSettings {
            velocity_window_hours: 6,
            ..RiskSettings::default()
        };
        let engine = RiskEngine::from_settings(&settings);
        assert_eq!(engine.velocity_window(), chrono::Duration::hours(6));

        let result = engine.score(&transaction(dec!(10), Some("US")), &complete_set(), 6);
        assert_eq!(result.reasons, vec!["high velocity: 6 transactions in 6h".to_string()]);
    }

    #[test]
    fn test_score_is_capped() {
        let docs = vec![document(DocumentType::Coo, false)];
        let result = engine().score(&transaction(dec!(5000000), Some("XX")), &docs, 50);
        // 40 + 30 + 20 + 20 + 25 = 135
        assert_eq!(result.score, 100);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.reasons.len(), 5);
    }
}
