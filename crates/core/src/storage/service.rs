//! Storage service implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use sha2::{Digest, Sha256};
use tradeflow_shared::types::{DocumentId, TransactionId};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Storage service for document contents.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// In-memory storage with default limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend cannot be initialized.
    pub fn memory() -> Result<Self, StorageError> {
        Self::from_config(StorageConfig::memory())
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()),
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Check a payload against the configured size limit.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileTooLarge`] if the payload is over the limit.
    pub fn validate_size(&self, size: usize) -> Result<(), StorageError> {
        let size = u64::try_from(size).unwrap_or(u64::MAX);
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(size, self.config.max_file_size));
        }
        Ok(())
    }

    /// Storage key for a document.
    ///
    /// Format: `{transaction_id}/{document_id}/{sanitized_doc_number}`
    #[must_use]
    pub fn document_key(
        transaction_id: TransactionId,
        document_id: DocumentId,
        doc_number: &str,
    ) -> String {
        format!(
            "{transaction_id}/{document_id}/{}",
            sanitize_key_segment(doc_number)
        )
    }

    /// Stores bytes under `key` and returns the storage reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is too large, the key is invalid or the
    /// write fails.
    pub async fn put(&self, key: &str, content: &[u8]) -> Result<String, StorageError> {
        if key.is_empty() || key.ends_with('/') {
            return Err(StorageError::InvalidReference(key.to_string()));
        }
        self.validate_size(content.len())?;

        self.operator
            .write(key, content.to_vec())
            .await
            .map_err(StorageError::from)?;

        tracing::debug!(
            key,
            size = content.len(),
            provider = self.provider_name(),
            "stored document content"
        );
        Ok(key.to_string())
    }

    /// Reads the bytes behind a storage reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is unknown or the read fails.
    pub async fn get(&self, storage_ref: &str) -> Result<Vec<u8>, StorageError> {
        let buffer = self
            .operator
            .read(storage_ref)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::MissingContent {
                    storage_ref: storage_ref.to_string(),
                },
                _ => StorageError::from(e),
            })?;
        Ok(buffer.to_vec())
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, storage_ref: &str) -> Result<(), StorageError> {
        self.operator
            .delete(storage_ref)
            .await
            .map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, storage_ref: &str) -> bool {
        self.operator.stat(storage_ref).await.is_ok()
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Lowercase hex SHA-256 of `content`.
#[must_use]
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Only ASCII alphanumerics, dots, hyphens and underscores survive.
fn sanitize_key_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
