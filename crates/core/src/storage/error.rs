//! Errors raised by the document blob store.

use thiserror::Error;

/// Failure talking to the blob store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload is over `storage.max_file_size`.
    #[error("document is {size} bytes, limit is {max} bytes")]
    FileTooLarge {
        /// Upload size in bytes.
        size: u64,
        /// Configured limit in bytes.
        max: u64,
    },

    /// Nothing stored under the reference.
    #[error("no stored content for reference {storage_ref}")]
    MissingContent {
        /// The opaque reference kept on the document row.
        storage_ref: String,
    },

    /// The backend could not be built from configuration.
    #[error("storage backend misconfigured: {0}")]
    Configuration(String),

    /// Any other backend failure.
    #[error("storage backend failed: {0}")]
    Backend(String),

    /// Reference is empty or names a directory.
    #[error("unusable storage reference: {0:?}")]
    InvalidReference(String),
}

impl StorageError {
    /// Shorthand for [`StorageError::FileTooLarge`].
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Shorthand for [`StorageError::Configuration`].
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        if err.kind() == opendal::ErrorKind::ConfigInvalid {
            Self::Configuration(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}
