//! Conversions from module errors into [`AppError`].

use chantier_shared::AppError;

use crate::budget::BudgetError;
use crate::change_order::ChangeOrderError;
use crate::division::DivisionError;
use crate::project::ProjectError;
use crate::repository::RepositoryError;

impl From<DivisionError> for AppError {
    fn from(err: DivisionError) -> Self {
        AppError::validation("division_code", err.to_string())
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::LineNotFound(_) => AppError::NotFound(err.to_string()),
            BudgetError::ChangeAlreadyApplied(_) | BudgetError::AdjustmentLineLocked(_) => {
                AppError::Conflict(err.to_string())
            }
            BudgetError::Validation { field, message } => AppError::validation(field, message),
            BudgetError::Division(_) | BudgetError::Money(_) | BudgetError::ProjectMismatch { .. } => {
                let field = err.field().unwrap_or("project_id").to_string();
                AppError::validation(field, err.to_string())
            }
        }
    }
}

impl From<ChangeOrderError> for AppError {
    fn from(err: ChangeOrderError) -> Self {
        match err {
            ChangeOrderError::Validation { field, message } => AppError::validation(field, message),
            ChangeOrderError::Division(e) => e.into(),
            ChangeOrderError::Money(e) => AppError::validation(e.field(), e.to_string()),
            ChangeOrderError::ProjectMismatch { .. } => {
                AppError::validation("project_id", err.to_string())
            }
            ChangeOrderError::NotFound(_) => AppError::NotFound(err.to_string()),
            ChangeOrderError::InvalidTransition { from, to } => AppError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            ChangeOrderError::NotEditable(status) => AppError::InvalidTransition {
                from: status.to_string(),
                to: "edit".to_string(),
            },
            ChangeOrderError::CannotDeleteApproved(_) | ChangeOrderError::NumberingExhausted => {
                AppError::Conflict(err.to_string())
            }
            ChangeOrderError::Budget(e) => e.into(),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::Budget(e) => e.into(),
            ProjectError::ChangeOrder(e) => e.into(),
            ProjectError::Repository(e) => e.into(),
        }
    }
}
