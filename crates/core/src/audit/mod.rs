//! Administrative audit trail.
//!
//! Separate from the ledger: entries are written best-effort after the
//! business operation commits and never roll it back.

pub mod service;
pub mod types;

pub use service::AuditTrail;
pub use types::{AuditAction, AuditLogEntry, EntityType};
