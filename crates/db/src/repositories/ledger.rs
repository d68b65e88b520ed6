//! PostgreSQL implementation of the budget-line and change-order
//! repositories.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, SqlErr, Statement, TransactionTrait,
};

use chantier_core::budget::{BudgetLine, BudgetLineSource};
use chantier_core::change_order::{ChangeOrder, ChangeOrderStatus, ChangeOrderType};
use chantier_core::repository::{BudgetLineRepository, ChangeOrderRepository, RepositoryError};
use chantier_shared::types::{BudgetLineId, ChangeOrderId, ProjectId};

use crate::entities::{budget_lines, change_order_sequences, change_orders};

const RAISE_SEQUENCE_SQL: &str = r"
INSERT INTO change_order_sequences (project_id, last_sequence)
VALUES ($1, $2)
ON CONFLICT (project_id)
DO UPDATE SET last_sequence = GREATEST(change_order_sequences.last_sequence, EXCLUDED.last_sequence)
";

/// Repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRepository {
    db: DatabaseConnection,
}

impl PgRepository {
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn db_error(err: DbErr) -> RepositoryError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return RepositoryError::Conflict(detail);
    }
    match err {
        DbErr::RecordNotFound(detail) => RepositoryError::NotFound(detail),
        DbErr::RecordNotUpdated => RepositoryError::NotFound("record not updated".to_string()),
        other => RepositoryError::Database(other.to_string()),
    }
}

fn sequence_to_db(sequence: u32) -> Result<i32, RepositoryError> {
    i32::try_from(sequence)
        .map_err(|_| RepositoryError::Database(format!("sequence {sequence} out of range")))
}

fn sequence_from_db(sequence: i32) -> Result<u32, RepositoryError> {
    u32::try_from(sequence)
        .map_err(|_| RepositoryError::Database(format!("negative sequence {sequence}")))
}

fn line_to_active(line: &BudgetLine) -> budget_lines::ActiveModel {
    let change_order_id = match line.source {
        BudgetLineSource::Manual => None,
        BudgetLineSource::ChangeOrder { change_order_id } => Some(change_order_id.into_inner()),
    };
    budget_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        project_id: Set(line.project_id.into_inner()),
        division_code: Set(line.division_code.clone()),
        description: Set(line.description.clone()),
        change_order_id: Set(change_order_id),
        budget_original: Set(line.budget_original),
        budget_approved: Set(line.budget_approved),
        budget_changes: Set(line.budget_changes),
        committed: Set(line.committed),
        actual: Set(line.actual),
        forecast: Set(line.forecast),
        created_at: Set(line.created_at.into()),
        updated_at: Set(line.updated_at.into()),
    }
}

fn line_from_model(model: budget_lines::Model) -> BudgetLine {
    let source = match model.change_order_id {
        Some(id) => BudgetLineSource::ChangeOrder {
            change_order_id: ChangeOrderId::from_uuid(id),
        },
        None => BudgetLineSource::Manual,
    };
    let mut line = BudgetLine {
        id: BudgetLineId::from_uuid(model.id),
        project_id: ProjectId::from_uuid(model.project_id),
        division_code: model.division_code,
        description: model.description,
        source,
        budget_original: model.budget_original,
        budget_approved: model.budget_approved,
        budget_changes: model.budget_changes,
        budget_current: Decimal::ZERO,
        committed: model.committed,
        actual: model.actual,
        forecast: model.forecast,
        variance: Decimal::ZERO,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    };
    line.recompute();
    line
}

fn order_to_active(order: &ChangeOrder) -> Result<change_orders::ActiveModel, RepositoryError> {
    Ok(change_orders::ActiveModel {
        id: Set(order.id.into_inner()),
        project_id: Set(order.project_id.into_inner()),
        sequence: Set(sequence_to_db(order.sequence)?),
        number: Set(order.number.clone()),
        title: Set(order.title.clone()),
        description: Set(order.description.clone()),
        change_type: Set(order.change_type.as_str().to_string()),
        amount: Set(order.amount),
        status: Set(order.status.as_str().to_string()),
        division_code: Set(order.division_code.clone()),
        reason: Set(order.reason.clone()),
        date_requested: Set(order.date_requested),
        date_approved: Set(order.date_approved),
        date_required: Set(order.date_required),
        created_at: Set(order.created_at.into()),
        updated_at: Set(order.updated_at.into()),
    })
}

fn order_from_model(model: change_orders::Model) -> Result<ChangeOrder, RepositoryError> {
    let change_type = ChangeOrderType::parse(&model.change_type).ok_or_else(|| {
        RepositoryError::Database(format!("unknown change-order type {}", model.change_type))
    })?;
    let status = ChangeOrderStatus::parse(&model.status).ok_or_else(|| {
        RepositoryError::Database(format!("unknown change-order status {}", model.status))
    })?;

    Ok(ChangeOrder {
        id: ChangeOrderId::from_uuid(model.id),
        project_id: ProjectId::from_uuid(model.project_id),
        sequence: sequence_from_db(model.sequence)?,
        number: model.number,
        title: model.title,
        description: model.description,
        change_type,
        amount: model.amount,
        status,
        division_code: model.division_code,
        reason: model.reason,
        date_requested: model.date_requested,
        date_approved: model.date_approved,
        date_required: model.date_required,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

impl BudgetLineRepository for PgRepository {
    async fn create_line(&self, line: &BudgetLine) -> Result<(), RepositoryError> {
        line_to_active(line).insert(&self.db).await.map_err(db_error)?;
        Ok(())
    }

    async fn update_line(&self, line: &BudgetLine) -> Result<(), RepositoryError> {
        line_to_active(line).update(&self.db).await.map_err(db_error)?;
        Ok(())
    }

    async fn delete_line(&self, id: BudgetLineId) -> Result<(), RepositoryError> {
        let result = budget_lines::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_error)?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_lines(&self, project_id: ProjectId) -> Result<Vec<BudgetLine>, RepositoryError> {
        let models = budget_lines::Entity::find()
            .filter(budget_lines::Column::ProjectId.eq(project_id.into_inner()))
            .order_by_asc(budget_lines::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(models.into_iter().map(line_from_model).collect())
    }
}

impl ChangeOrderRepository for PgRepository {
    async fn create_change_order(&self, order: &ChangeOrder) -> Result<(), RepositoryError> {
        let active = order_to_active(order)?;
        let sequence = sequence_to_db(order.sequence)?;

        let txn = self.db.begin().await.map_err(db_error)?;
        active.insert(&txn).await.map_err(db_error)?;
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            RAISE_SEQUENCE_SQL,
            [order.project_id.into_inner().into(), sequence.into()],
        ))
        .await
        .map_err(db_error)?;
        txn.commit().await.map_err(db_error)
    }

    async fn update_change_order(&self, order: &ChangeOrder) -> Result<(), RepositoryError> {
        order_to_active(order)?
            .update(&self.db)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn delete_change_order(&self, id: ChangeOrderId) -> Result<(), RepositoryError> {
        let result = change_orders::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_error)?;
        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list_change_orders(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ChangeOrder>, RepositoryError> {
        change_orders::Entity::find()
            .filter(change_orders::Column::ProjectId.eq(project_id.into_inner()))
            .order_by_asc(change_orders::Column::Sequence)
            .all(&self.db)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(order_from_model)
            .collect()
    }

    async fn last_sequence(&self, project_id: ProjectId) -> Result<u32, RepositoryError> {
        let row = change_order_sequences::Entity::find_by_id(project_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?;
        row.map_or(Ok(0), |r| sequence_from_db(r.last_sequence))
    }

    async fn persist_approval(
        &self,
        order: &ChangeOrder,
        adjustment: Option<&BudgetLine>,
    ) -> Result<(), RepositoryError> {
        let active = order_to_active(order)?;

        let txn = self.db.begin().await.map_err(db_error)?;
        active.update(&txn).await.map_err(db_error)?;
        if let Some(line) = adjustment {
            line_to_active(line).insert(&txn).await.map_err(db_error)?;
        }
        txn.commit().await.map_err(db_error)
    }
}
