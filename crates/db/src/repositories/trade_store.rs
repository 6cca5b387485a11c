//! Postgres implementation of the trade store.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tradeflow_core::StoreError;
use tradeflow_core::document::{Document, DocumentType};
use tradeflow_core::ledger::{LedgerEntry, LedgerSubject};
use tradeflow_core::risk::RiskScore;
use tradeflow_core::store::{StoreTransaction, TradeStore, TransactionFilter};
use tradeflow_core::workflow::{TradeTransaction, TransactionStatus};
use tradeflow_shared::types::{ActorId, DocumentId, TransactionId};

use super::convert::{
    document_from_model, document_to_active, ledger_from_model, ledger_to_active,
    risk_from_model, risk_to_active, transaction_from_model, transaction_to_active,
};
use crate::entities::sea_orm_active_enums::{DocType, TradeStatus};
use crate::entities::{documents, ledger_entries, risk_scores, trade_transactions};

/// Maps a database error onto the store error taxonomy.
pub(crate) fn store_err(err: DbErr) -> StoreError {
    if let Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return StoreError::Conflict(detail);
    }
    match err {
        DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout) => {
            StoreError::Timeout("connection pool exhausted".into())
        }
        DbErr::Type(detail) | DbErr::Json(detail) => StoreError::Corrupt(detail),
        other => StoreError::Unavailable(other.to_string()),
    }
}

/// Trade store backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Creates a new store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl TradeStore for SeaOrmStore {
    type Tx = SeaOrmTransaction;

    async fn begin(&self) -> Result<SeaOrmTransaction, StoreError> {
        let txn = self.db.begin().await.map_err(store_err)?;
        Ok(SeaOrmTransaction { txn })
    }
}

/// One database transaction. Dropping it without `commit` rolls back.
pub struct SeaOrmTransaction {
    txn: DatabaseTransaction,
}

impl StoreTransaction for SeaOrmTransaction {
    async fn insert_transaction(&mut self, transaction: &TradeTransaction) -> Result<(), StoreError> {
        trade_transactions::Entity::insert(transaction_to_active(transaction))
            .exec_without_returning(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<TradeTransaction>, StoreError> {
        trade_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_err)?
            .map(transaction_from_model)
            .transpose()
    }

    async fn compare_and_set_status(
        &mut self,
        id: TransactionId,
        expected: TransactionStatus,
        next: TransactionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = trade_transactions::Entity::update_many()
            .col_expr(trade_transactions::Column::Status, TradeStatus::from(next).as_enum())
            .col_expr(trade_transactions::Column::UpdatedAt, Expr::value(at))
            .filter(trade_transactions::Column::Id.eq(id.into_inner()))
            .filter(trade_transactions::Column::Status.eq(TradeStatus::from(expected)))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn list_transactions(
        &mut self,
        filter: &TransactionFilter,
    ) -> Result<Vec<TradeTransaction>, StoreError> {
        let mut query = trade_transactions::Entity::find();
        if let Some(buyer_id) = filter.buyer_id {
            query = query.filter(trade_transactions::Column::BuyerId.eq(buyer_id.into_inner()));
        }
        if let Some(seller_id) = filter.seller_id {
            query = query.filter(trade_transactions::Column::SellerId.eq(seller_id.into_inner()));
        }
        if !filter.statuses.is_empty() {
            query = query.filter(
                trade_transactions::Column::Status
                    .is_in(filter.statuses.iter().copied().map(TradeStatus::from)),
            );
        }

        query
            .order_by_desc(trade_transactions::Column::CreatedAt)
            .order_by_desc(trade_transactions::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(transaction_from_model)
            .collect()
    }

    async fn count_buyer_transactions_since(
        &mut self,
        buyer_id: ActorId,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        trade_transactions::Entity::find()
            .filter(trade_transactions::Column::BuyerId.eq(buyer_id.into_inner()))
            .filter(trade_transactions::Column::CreatedAt.gte(since))
            .count(&self.txn)
            .await
            .map_err(store_err)
    }

    async fn delete_transaction(&mut self, id: TransactionId) -> Result<bool, StoreError> {
        let result = trade_transactions::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn insert_document(&mut self, document: &Document) -> Result<(), StoreError> {
        documents::Entity::insert(document_to_active(document))
            .exec_without_returning(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn find_document(&mut self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        documents::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(store_err)?
            .map(document_from_model)
            .transpose()
    }

    async fn find_document_by_number(
        &mut self,
        transaction_id: TransactionId,
        doc_type: DocumentType,
        doc_number: &str,
    ) -> Result<Option<Document>, StoreError> {
        documents::Entity::find()
            .filter(documents::Column::TransactionId.eq(transaction_id.into_inner()))
            .filter(documents::Column::DocType.eq(DocType::from(doc_type)))
            .filter(documents::Column::DocNumber.eq(doc_number))
            .one(&self.txn)
            .await
            .map_err(store_err)?
            .map(document_from_model)
            .transpose()
    }

    async fn list_documents(&mut self, transaction_id: TransactionId) -> Result<Vec<Document>, StoreError> {
        documents::Entity::find()
            .filter(documents::Column::TransactionId.eq(transaction_id.into_inner()))
            .order_by_asc(documents::Column::CreatedAt)
            .order_by_asc(documents::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(document_from_model)
            .collect()
    }

    async fn mark_verified(
        &mut self,
        id: DocumentId,
        verified_by: ActorId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = documents::Entity::update_many()
            .col_expr(documents::Column::IsVerified, Expr::value(true))
            .col_expr(documents::Column::VerifiedBy, Expr::value(verified_by.into_inner()))
            .col_expr(documents::Column::VerifiedAt, Expr::value(at))
            .filter(documents::Column::Id.eq(id.into_inner()))
            .filter(documents::Column::IsVerified.eq(false))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn compare_and_set_document_type(
        &mut self,
        id: DocumentId,
        expected: DocumentType,
        next: DocumentType,
    ) -> Result<bool, StoreError> {
        let result = documents::Entity::update_many()
            .col_expr(documents::Column::DocType, DocType::from(next).as_enum())
            .filter(documents::Column::Id.eq(id.into_inner()))
            .filter(documents::Column::DocType.eq(DocType::from(expected)))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn append_ledger(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        ledger_entries::Entity::insert(ledger_to_active(entry))
            .exec_without_returning(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_ledger(&mut self, subject: LedgerSubject) -> Result<Vec<LedgerEntry>, StoreError> {
        let query = match subject {
            LedgerSubject::Transaction(id) => ledger_entries::Entity::find()
                .filter(ledger_entries::Column::TransactionId.eq(id.into_inner())),
            LedgerSubject::Document(id) => ledger_entries::Entity::find()
                .filter(ledger_entries::Column::DocumentId.eq(id.into_inner())),
        };

        // v7 ids break ties between entries written in the same instant.
        let rows = query
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(ledger_from_model).collect())
    }

    async fn insert_risk_score(&mut self, score: &RiskScore) -> Result<(), StoreError> {
        risk_scores::Entity::insert(risk_to_active(score))
            .exec_without_returning(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn latest_risk_score(
        &mut self,
        transaction_id: TransactionId,
    ) -> Result<Option<RiskScore>, StoreError> {
        risk_scores::Entity::find()
            .filter(risk_scores::Column::TransactionId.eq(transaction_id.into_inner()))
            .order_by_desc(risk_scores::Column::ComputedAt)
            .order_by_desc(risk_scores::Column::Id)
            .one(&self.txn)
            .await
            .map_err(store_err)?
            .map(risk_from_model)
            .transpose()
    }

    async fn list_risk_scores(&mut self) -> Result<Vec<RiskScore>, StoreError> {
        risk_scores::Entity::find()
            .order_by_desc(risk_scores::Column::Score)
            .order_by_desc(risk_scores::Column::ComputedAt)
            .all(&self.txn)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(risk_from_model)
            .collect()
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_err)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(store_err)
    }
}
