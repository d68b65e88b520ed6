//! Common types used across the workspace.

pub mod id;
pub mod money;
pub mod tax;

#[cfg(test)]
mod money_props;

pub use id::*;
pub use money::{
    AMOUNT_SCALE, MoneyError, MoneyRollup, Sign, amount_from_f64, amount_from_str, amount_limit,
    check_amount,
};
pub use tax::{TaxBreakdown, TaxRates};
