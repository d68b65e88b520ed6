//! `SeaORM` Entity for change_orders table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "change_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub sequence: i32,
    pub number: String,
    pub title: String,
    pub description: String,
    /// `addition`, `deduction` or `no_cost`.
    pub change_type: String,
    pub amount: Decimal,
    /// `draft`, `submitted`, `approved`, `rejected` or `void`.
    pub status: String,
    pub division_code: Option<String>,
    pub reason: Option<String>,
    pub date_requested: Date,
    pub date_approved: Option<Date>,
    pub date_required: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_lines::Entity")]
    BudgetLines,
}

impl Related<super::budget_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
