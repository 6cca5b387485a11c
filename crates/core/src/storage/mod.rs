//! Document storage collaborator backed by Apache OpenDAL.
//!
//! The engine hands bytes to storage and keeps only the returned reference
//! and a content digest. Providers:
//! - In-process memory (tests, demos)
//! - Local filesystem
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               Apache OpenDAL                  │
//! ├──────────────────────────────────────────────┤
//! │ op.write("key", data)   │ op.read("key")      │
//! │ op.delete("key")        │ op.stat("key")      │
//! └──────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{StorageService, content_hash};
