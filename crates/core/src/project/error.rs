//! Project service errors.

use thiserror::Error;

use crate::budget::BudgetError;
use crate::change_order::ChangeOrderError;
use crate::repository::RepositoryError;

/// Errors raised by [`super::ProjectBudgetService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    /// Budget ledger refused the operation.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Change-order register refused the operation.
    #[error(transparent)]
    ChangeOrder(#[from] ChangeOrderError),

    /// Persistence failed; nothing was applied.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ProjectError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Budget(e) => e.status_code(),
            Self::ChangeOrder(e) => e.status_code(),
            Self::Repository(e) => e.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Budget(e) => e.error_code(),
            Self::ChangeOrder(e) => e.error_code(),
            Self::Repository(e) => e.error_code(),
        }
    }
}
