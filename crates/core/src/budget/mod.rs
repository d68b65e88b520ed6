//! Budget lines, per-division rollups and variance.

pub mod error;
pub mod ledger;
pub mod types;
pub mod variance;

#[cfg(test)]
mod ledger_props;

pub use error::BudgetError;
pub use ledger::BudgetLedger;
pub use types::{
    ApprovedChange, BudgetLine, BudgetLinePatch, BudgetLineSource, BudgetTotals, DivisionRollup,
    NewBudgetLine, RollupScope,
};
pub use variance::{VarianceStatus, utilization_percent};
