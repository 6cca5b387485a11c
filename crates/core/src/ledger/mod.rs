//! Append-only ledger of domain events.
//!
//! # Modules
//!
//! - `types` - Ledger entries and actions
//! - `replay` - Reconstructs transaction state from entries

pub mod replay;
pub mod types;

pub use replay::{ReplayError, ReplayedState, replay};
pub use types::{LedgerAction, LedgerEntry, LedgerSubject, action_details, upload_details};
