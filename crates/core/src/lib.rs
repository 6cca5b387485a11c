//! Core business logic for Tradeflow.
//!
//! This crate owns the trade-finance workflow: the policy matrix, the
//! transaction lifecycle, document handling, risk scoring, the append-only
//! ledger and the audit trail. Persistence sits behind the traits in
//! [`store`]; the database crate provides the Postgres implementation and
//! [`store::MemoryStore`] serves tests and demos.
//!
//! # Modules
//!
//! - `policy` - Lifecycle table and document policy matrix
//! - `workflow` - Transaction lifecycle operations
//! - `document` - Upload, verification and document actions
//! - `ledger` - Append-only event ledger and replay
//! - `risk` - Additive risk scoring
//! - `audit` - Best-effort administrative audit trail
//! - `reports` - Summaries, exports and analytics
//! - `storage` - Document blob storage
//! - `store` - Persistence traits and the in-memory store

pub mod actor;
pub mod audit;
pub mod document;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod reports;
pub mod risk;
pub mod storage;
pub mod store;
pub mod workflow;

pub use actor::{Actor, Role};
pub use engine::{EngineSettings, TradeEngine};
pub use error::{EngineError, EngineResult, StoreError};

#[cfg(test)]
mod fixtures;
