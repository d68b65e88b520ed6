//! Budget error types.

use thiserror::Error;

use chantier_shared::types::{BudgetLineId, ChangeOrderId, MoneyError, ProjectId};

use crate::division::DivisionError;

/// Budget-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    /// A field failed validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Field name.
        field: &'static str,
        /// Explanation.
        message: String,
    },

    /// Division code could not be classified.
    #[error(transparent)]
    Division(#[from] DivisionError),

    /// Amount could not be converted from external input.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Budget line not found.
    #[error("Budget line not found: {0}")]
    LineNotFound(BudgetLineId),

    /// Line belongs to another project.
    #[error("Budget line {line_id} belongs to project {found}, not {expected}")]
    ProjectMismatch {
        /// The offending line.
        line_id: BudgetLineId,
        /// Project the ledger manages.
        expected: ProjectId,
        /// Project the line belongs to.
        found: ProjectId,
    },

    /// Change order already has its adjustment line.
    #[error("Change order {0} has already been applied to the budget")]
    ChangeAlreadyApplied(ChangeOrderId),

    /// Adjustment lines carry approved change orders and cannot be removed.
    #[error("Budget line {0} carries an approved change order and cannot be removed")]
    AdjustmentLineLocked(BudgetLineId),
}

impl BudgetError {
    /// Shorthand for a validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. }
            | Self::Division(_)
            | Self::Money(_)
            | Self::ProjectMismatch { .. } => 400,
            Self::LineNotFound(_) => 404,
            Self::ChangeAlreadyApplied(_) | Self::AdjustmentLineLocked(_) => 409,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::Money(_) => "VALIDATION_ERROR",
            Self::Division(_) => "UNKNOWN_DIVISION",
            Self::LineNotFound(_) => "BUDGET_LINE_NOT_FOUND",
            Self::ProjectMismatch { .. } => "PROJECT_MISMATCH",
            Self::ChangeAlreadyApplied(_) => "CHANGE_ALREADY_APPLIED",
            Self::AdjustmentLineLocked(_) => "ADJUSTMENT_LINE_LOCKED",
        }
    }

    /// Field the error refers to, when there is one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::Division(_) => Some("division_code"),
            Self::Money(e) => Some(e.field()),
            _ => None,
        }
    }
}
