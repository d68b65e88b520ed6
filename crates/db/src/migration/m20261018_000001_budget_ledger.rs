//! Budget ledger migration.
//!
//! Creates the change-order, numbering and budget-line tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CHANGE_ORDERS_SQL).await?;
        db.execute_unprepared(CHANGE_ORDER_SEQUENCES_SQL).await?;
        db.execute_unprepared(BUDGET_LINES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS budget_lines CASCADE;
             DROP TABLE IF EXISTS change_order_sequences CASCADE;
             DROP TABLE IF EXISTS change_orders CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const CHANGE_ORDERS_SQL: &str = r"
CREATE TABLE change_orders (
    id UUID PRIMARY KEY,
    project_id UUID NOT NULL,
    sequence INTEGER NOT NULL CHECK (sequence > 0),
    number VARCHAR(32) NOT NULL,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    change_type VARCHAR(16) NOT NULL
        CHECK (change_type IN ('addition', 'deduction', 'no_cost')),
    amount NUMERIC(19, 4) NOT NULL CHECK (amount >= 0),
    status VARCHAR(16) NOT NULL DEFAULT 'draft'
        CHECK (status IN ('draft', 'submitted', 'approved', 'rejected', 'void')),
    division_code VARCHAR(32),
    reason TEXT,
    date_requested DATE NOT NULL DEFAULT CURRENT_DATE,
    date_approved DATE,
    date_required DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_change_orders_sequence UNIQUE (project_id, sequence),
    CONSTRAINT uq_change_orders_number UNIQUE (project_id, number),
    CONSTRAINT chk_date_approved CHECK ((status = 'approved') = (date_approved IS NOT NULL))
);

-- Register listing and pending/approved rollups
CREATE INDEX idx_change_orders_project_status ON change_orders(project_id, status);
";

const CHANGE_ORDER_SEQUENCES_SQL: &str = r"
-- High-water mark so deleted change-order numbers are never reissued
CREATE TABLE change_order_sequences (
    project_id UUID PRIMARY KEY,
    last_sequence INTEGER NOT NULL CHECK (last_sequence >= 0)
);
";

const BUDGET_LINES_SQL: &str = r"
CREATE TABLE budget_lines (
    id UUID PRIMARY KEY,
    project_id UUID NOT NULL,
    division_code VARCHAR(32) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    change_order_id UUID REFERENCES change_orders(id) ON DELETE RESTRICT,
    budget_original NUMERIC(19, 4) NOT NULL CHECK (budget_original >= 0),
    budget_approved NUMERIC(19, 4) NOT NULL,
    budget_changes NUMERIC(19, 4) NOT NULL DEFAULT 0,
    committed NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (committed >= 0),
    actual NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (actual >= 0),
    forecast NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    -- One adjustment line per approved change order
    CONSTRAINT uq_budget_lines_change_order UNIQUE (change_order_id)
);

-- Division rollups
CREATE INDEX idx_budget_lines_project_division ON budget_lines(project_id, division_code);
";
