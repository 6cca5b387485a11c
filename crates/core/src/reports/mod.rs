//! Read models for reporting consumers.
//!
//! Nothing here mutates transactions, documents, ledger entries or risk
//! snapshots.

pub mod service;
pub mod types;

pub use service::ReportService;
pub use types::{AnalyticsOverview, RiskDistribution, TransactionReport, TransactionSummary};
