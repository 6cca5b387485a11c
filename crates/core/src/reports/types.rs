//! Read-model types handed to reporting consumers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeflow_shared::types::ActorId;

use crate::document::types::Document;
use crate::ledger::types::LedgerEntry;
use crate::risk::types::RiskScore;
use crate::workflow::types::TradeTransaction;

/// Everything known about one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// The transaction.
    pub transaction: TradeTransaction,
    /// Its documents, oldest first.
    pub documents: Vec<Document>,
    /// Its ledger, oldest first.
    pub ledger: Vec<LedgerEntry>,
    /// Most recent risk snapshot.
    pub latest_risk: Option<RiskScore>,
}

/// Exported transaction report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReport {
    /// The transaction with its documents, ledger and latest risk.
    #[serde(flatten)]
    pub summary: TransactionSummary,
    /// Who exported it.
    pub exported_by: ActorId,
    /// When.
    pub exported_at: DateTime<Utc>,
}

/// Portfolio totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    /// Every transaction.
    pub total_transactions: u64,
    /// Settled transactions.
    pub completed_transactions: u64,
    /// Not yet settled.
    pub pending_transactions: u64,
    /// Risk snapshots at level HIGH.
    pub high_risk_count: u64,
    /// Mean snapshot score, one decimal place.
    pub average_risk_score: Decimal,
}

/// Snapshot counts per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    /// LOW snapshots.
    pub low: u64,
    /// MEDIUM snapshots.
    pub medium: u64,
    /// HIGH snapshots.
    pub high: u64,
}
