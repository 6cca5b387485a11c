//! Postgres audit log.

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use tradeflow_core::StoreError;
use tradeflow_core::audit::AuditLogEntry;
use tradeflow_core::store::AuditStore;
use tradeflow_shared::types::PageRequest;

use super::convert::{audit_from_model, audit_to_active};
use super::trade_store::store_err;
use crate::entities::audit_logs;

/// Audit log written outside the business transaction.
#[derive(Debug, Clone)]
pub struct SeaOrmAuditStore {
    db: DatabaseConnection,
}

impl SeaOrmAuditStore {
    /// Creates a new audit store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl AuditStore for SeaOrmAuditStore {
    async fn record(&self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        audit_logs::Entity::insert(audit_to_active(entry))
            .exec_without_returning(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list(&self, page: PageRequest) -> Result<(Vec<AuditLogEntry>, u64), StoreError> {
        let total = audit_logs::Entity::find()
            .count(&self.db)
            .await
            .map_err(store_err)?;

        let rows = audit_logs::Entity::find()
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_err)?;

        Ok((rows.into_iter().map(audit_from_model).collect(), total))
    }
}
