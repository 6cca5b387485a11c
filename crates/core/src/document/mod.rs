//! Trade documents.
//!
//! # Modules
//!
//! - `types` - Document, type and action definitions
//! - `service` - Upload, verify, policy actions and reads

pub mod service;
pub mod types;

pub use service::DocumentHistory;
pub use types::{Document, DocumentAction, DocumentType, UploadDocumentInput, Verification};
