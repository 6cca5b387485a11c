//! Risk domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tradeflow_shared::types::{ActorId, RiskScoreId, TransactionId};

/// Coarse risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Score 0..=30.
    Low,
    /// Score 31..=70.
    Medium,
    /// Score 71..=100.
    High,
}

impl RiskLevel {
    /// Every level, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Classifies a score. Boundaries are inclusive on the lower bucket.
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => Self::Low,
            31..=70 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Returns the string representation of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parses a level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one scoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Score in `0..=100`.
    pub score: u8,
    /// Bucket derived from the score.
    pub level: RiskLevel,
    /// Human-readable reasons, in rule order.
    pub reasons: Vec<String>,
}

/// Persisted risk snapshot. Never updated; newer snapshots supersede older ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Snapshot identifier.
    pub id: RiskScoreId,
    /// Scored transaction, if the snapshot is transaction-scoped.
    pub transaction_id: Option<TransactionId>,
    /// Buyer the score applies to.
    pub buyer_id: ActorId,
    /// Score in `0..=100`.
    pub score: u8,
    /// Bucket derived from the score.
    pub level: RiskLevel,
    /// Reasons, in rule order.
    pub rationale: Vec<String>,
    /// When the score was computed.
    pub computed_at: DateTime<Utc>,
}

impl RiskScore {
    /// Snapshot of an assessment for a transaction.
    #[must_use]
    pub fn from_assessment(
        transaction_id: TransactionId,
        buyer_id: ActorId,
        assessment: RiskAssessment,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RiskScoreId::new(),
            transaction_id: Some(transaction_id),
            buyer_id,
            score: assessment.score,
            level: assessment.level,
            rationale: assessment.reasons,
            computed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries_are_exact() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(31), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(71), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(RiskLevel::parse("high"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::parse("CRITICAL"), None);
    }
}
