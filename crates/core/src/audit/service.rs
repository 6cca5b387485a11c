//! Best-effort audit trail.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tradeflow_shared::types::{ActorId, AuditLogId};
use uuid::Uuid;

use super::types::{AuditAction, AuditLogEntry, EntityType};
use crate::store::AuditStore;

/// Writes audit entries without ever failing the caller.
///
/// A failed or slow write is logged at `warn` and dropped. The ledger is the
/// transactional record; this trail is administrative.
pub struct AuditTrail<A> {
    store: Arc<A>,
    timeout: Duration,
}

impl<A> Clone for AuditTrail<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<A: AuditStore> AuditTrail<A> {
    /// Creates a trail writing to `store`, giving each write `timeout`.
    #[must_use]
    pub fn new(store: Arc<A>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Replaces the per-write deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The underlying store, for read paths.
    #[must_use]
    pub fn store(&self) -> &A {
        &self.store
    }

    /// Records an entry. Never fails.
    pub async fn log(
        &self,
        actor_id: ActorId,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: impl Into<Uuid>,
    ) {
        let entry = AuditLogEntry {
            id: AuditLogId::new(),
            actor_id,
            action,
            entity_type,
            entity_id: entity_id.into(),
            created_at: Utc::now(),
        };

        match tokio::time::timeout(self.timeout, self.store.record(&entry)).await {
            Ok(Ok(())) => {
                tracing::debug!(
                    actor_id = %entry.actor_id,
                    action = %entry.action,
                    entity_id = %entry.entity_id,
                    "audit entry recorded"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    actor_id = %entry.actor_id,
                    action = %entry.action,
                    entity_id = %entry.entity_id,
                    "failed to record audit entry"
                );
            }
            Err(_) => {
                tracing::warn!(
                    actor_id = %entry.actor_id,
                    action = %entry.action,
                    entity_id = %entry.entity_id,
                    "audit write timed out"
                );
            }
        }
    }
}
