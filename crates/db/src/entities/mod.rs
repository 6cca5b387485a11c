//! `SeaORM` entity definitions.

pub mod audit_logs;
pub mod documents;
pub mod ledger_entries;
pub mod risk_scores;
pub mod sea_orm_active_enums;
pub mod trade_transactions;
