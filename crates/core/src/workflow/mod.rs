//! Transaction lifecycle.
//!
//! `PO_CREATED → PO_APPROVED → PO_SHIPPED → PO_COMPLETED`, driven by the
//! lifecycle table in `policy`.
//!
//! # Modules
//!
//! - `types` - Transaction, status and action types
//! - `service` - Create, approve, ship, complete, risk and delete operations

pub mod service;
pub mod types;

pub use service::Completion;
pub use types::{CreateTransactionInput, TradeTransaction, TransactionAction, TransactionStatus};

#[cfg(test)]
mod tests;
