//! Store implementations backed by PostgreSQL.
//!
//! The engine talks to these only through the `TradeStore` and `AuditStore`
//! traits in `tradeflow-core`.

mod audit;
mod convert;
mod trade_store;

pub use audit::SeaOrmAuditStore;
pub use trade_store::{SeaOrmStore, SeaOrmTransaction};
