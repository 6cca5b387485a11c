//! Policy: the single place where role and state checks live.
//!
//! # Modules
//!
//! - `table` - Generic `(state, role, action) → next state` lookup
//! - `matrix` - Transaction lifecycle table and document policy matrix
//! - `access` - Who may read, upload, export and run administrative operations

pub mod access;
pub mod matrix;
pub mod table;

#[cfg(test)]
mod matrix_props;

pub use access::{ACCESS_TABLE, Operation, Standing, can_view, check_access};
pub use matrix::{DOCUMENT_MATRIX, TRANSACTION_TABLE, document_policy};
pub use table::{Denial, Transition, TransitionTable};
