//! Budget variance classification.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Variance status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    /// Forecast is below the current budget.
    Favorable,
    /// Forecast exceeds the current budget (projected overrun).
    Unfavorable,
    /// Forecast equals the current budget.
    OnBudget,
}

impl VarianceStatus {
    /// Classifies a variance (`budget_current - forecast`).
    #[must_use]
    pub fn of(variance: Decimal) -> Self {
        match variance.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Greater => Self::Favorable,
            std::cmp::Ordering::Less => Self::Unfavorable,
            std::cmp::Ordering::Equal => Self::OnBudget,
        }
    }
}

/// Spend utilization percentage (`actual / budget_current * 100`), two decimals.
///
/// Returns zero when the current budget is zero.
#[must_use]
pub fn utilization_percent(actual: Decimal, budget_current: Decimal) -> Decimal {
    if budget_current.is_zero() {
        Decimal::ZERO
    } else {
        (actual / budget_current * Decimal::ONE_HUNDRED).round_dp(2)
    }
}
