//! Persistence traits for budget lines and change orders.
//!
//! Implemented in memory by [`MemoryRepository`] and on PostgreSQL by the
//! db crate. Each ledger mutation issues exactly one call.

pub mod memory;

use std::future::Future;

use thiserror::Error;

use chantier_shared::types::{BudgetLineId, ChangeOrderId, ProjectId};

use crate::budget::BudgetLine;
use crate::change_order::ChangeOrder;

pub use memory::MemoryRepository;

/// Errors raised by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record already exists or violates a uniqueness constraint.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl RepositoryError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "PERSISTENCE_ERROR",
        }
    }
}

/// Budget line persistence.
pub trait BudgetLineRepository: Send + Sync {
    /// Insert a new line.
    fn create_line(
        &self,
        line: &BudgetLine,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite an existing line.
    fn update_line(
        &self,
        line: &BudgetLine,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a line.
    fn delete_line(
        &self,
        id: BudgetLineId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All lines of a project.
    fn list_lines(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<BudgetLine>, RepositoryError>> + Send;
}

/// Change-order persistence.
pub trait ChangeOrderRepository: Send + Sync {
    /// Insert a new order and raise the project's numbering high-water mark
    /// to its sequence.
    fn create_change_order(
        &self,
        order: &ChangeOrder,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite an existing order.
    fn update_change_order(
        &self,
        order: &ChangeOrder,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete an order. The high-water mark is kept.
    fn delete_change_order(
        &self,
        id: ChangeOrderId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// All orders of a project.
    fn list_change_orders(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<ChangeOrder>, RepositoryError>> + Send;

    /// Highest sequence ever assigned in a project, 0 if none.
    fn last_sequence(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<u32, RepositoryError>> + Send;

    /// Atomically store an approved order together with its adjustment line.
    fn persist_approval(
        &self,
        order: &ChangeOrder,
        adjustment: Option<&BudgetLine>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
