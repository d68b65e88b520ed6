//! Project-level budget: rollup and persisted service.

pub mod error;
pub mod rollup;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use error::ProjectError;
pub use rollup::ProjectBudgetRollup;
pub use service::ProjectBudgetService;
