//! `SeaORM` Entity for budget_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Derived figures (`budget_current`, `variance`) are not stored; the ledger
/// recomputes them on load.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub division_code: String,
    pub description: String,
    /// Set for adjustment lines carrying an approved change order.
    pub change_order_id: Option<Uuid>,
    pub budget_original: Decimal,
    pub budget_approved: Decimal,
    pub budget_changes: Decimal,
    pub committed: Decimal,
    pub actual: Decimal,
    pub forecast: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::change_orders::Entity",
        from = "Column::ChangeOrderId",
        to = "super::change_orders::Column::Id"
    )]
    ChangeOrders,
}

impl Related<super::change_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChangeOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
