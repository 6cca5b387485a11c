//! `SeaORM` Entity for risk_scores table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::RiskLevelKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "risk_scores")]
#[allow(missing_docs)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub buyer_id: Uuid,
    pub score: i16,
    pub level: RiskLevelKind,
    #[sea_orm(column_type = "JsonBinary")]
    pub rationale: Json,
    pub computed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
#[allow(missing_docs)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trade_transactions::Entity",
        from = "Column::TransactionId",
        to = "super::trade_transactions::Column::Id",
        on_delete = "Cascade"
    )]
    TradeTransactions,
}

impl Related<super::trade_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TradeTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
