//! Change-order error types.

use thiserror::Error;

use chantier_shared::types::{ChangeOrderId, MoneyError, ProjectId};

use super::types::ChangeOrderStatus;
use crate::budget::BudgetError;
use crate::division::DivisionError;

/// Errors raised by the change-order register.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeOrderError {
    /// A field failed validation.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Field name.
        field: &'static str,
        /// Explanation.
        message: String,
    },

    /// Division tag could not be classified.
    #[error(transparent)]
    Division(#[from] DivisionError),

    /// Amount is outside the stored money range.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Change order not found.
    #[error("Change order not found: {0}")]
    NotFound(ChangeOrderId),

    /// Change order belongs to another project.
    #[error("Change order {id} belongs to project {found}, not {expected}")]
    ProjectMismatch {
        /// The offending order.
        id: ChangeOrderId,
        /// Project the register manages.
        expected: ProjectId,
        /// Project the order belongs to.
        found: ProjectId,
    },

    /// Attempted a transition the workflow does not allow.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ChangeOrderStatus,
        /// The attempted target status.
        to: ChangeOrderStatus,
    },

    /// Only drafts can be edited.
    #[error("Change order is {0} and can no longer be edited")]
    NotEditable(ChangeOrderStatus),

    /// Approved orders are part of the budget and cannot be deleted.
    #[error("Approved change order {0} cannot be deleted")]
    CannotDeleteApproved(ChangeOrderId),

    /// Numbering sequence overflowed.
    #[error("Change-order numbering is exhausted for this project")]
    NumberingExhausted,

    /// The approval's budget effect was refused by the ledger.
    #[error(transparent)]
    Budget(#[from] BudgetError),
}

impl ChangeOrderError {
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
            Self::NotFound(_) => 404,
            Self::CannotDeleteApproved(_) | Self::NumberingExhausted => 409,
            Self::InvalidTransition { .. } | Self::NotEditable(_) => 422,
            Self::Budget(e) => e.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::Money(_) => "VALIDATION_ERROR",
            Self::Division(_) => "UNKNOWN_DIVISION",
            Self::NotFound(_) => "CHANGE_ORDER_NOT_FOUND",
            Self::ProjectMismatch { .. } => "PROJECT_MISMATCH",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotEditable(_) => "CHANGE_ORDER_NOT_EDITABLE",
            Self::CannotDeleteApproved(_) => "CANNOT_DELETE_APPROVED",
            Self::NumberingExhausted => "NUMBERING_EXHAUSTED",
            Self::Budget(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = ChangeOrderError::InvalidTransition {
            from: ChangeOrderStatus::Draft,
            to: ChangeOrderStatus::Approved,
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert_eq!(
            err.to_string(),
            "Invalid status transition from draft to approved"
        );
    }

    #[test]
    fn test_validation_error() {
        let err = ChangeOrderError::validation("title", "must not be empty");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Invalid title: must not be empty");
    }

    #[test]
    fn test_not_editable_error() {
        let err = ChangeOrderError::NotEditable(ChangeOrderStatus::Submitted);
        assert_eq!(err.status_code(), 422);
        assert!(err.to_string().contains("submitted"));
    }

    #[test]
    fn test_budget_error_passes_through() {
        let err = ChangeOrderError::from(BudgetError::ChangeAlreadyApplied(ChangeOrderId::new()));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "CHANGE_ALREADY_APPLIED");
    }

    #[test]
    fn test_cannot_delete_approved() {
        let err = ChangeOrderError::CannotDeleteApproved(ChangeOrderId::new());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "CANNOT_DELETE_APPROVED");
    }

    #[test]
    fn test_money_error_is_validation() {
        let err = ChangeOrderError::from(MoneyError::TooPrecise {
            field: "amount".into(),
        });
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.to_string(), "amount must have at most 4 decimal places");
    }
}
