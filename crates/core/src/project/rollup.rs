//! Project-level budget rollup.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use chantier_shared::types::MoneyRollup;

use crate::budget::BudgetLedger;
use crate::change_order::ChangeOrderRegister;

/// Budget figures of a project, recomputed from the current records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBudgetRollup {
    /// Sum of user-entered line originals, or the nominal project budget when
    /// the project has no such lines.
    pub budget_original: Decimal,
    /// Sum of approved additions.
    pub additions_approved: Decimal,
    /// Sum of approved deductions (positive magnitude).
    pub deductions_approved: Decimal,
    /// Signed sum of submitted orders.
    pub pending_amount: Decimal,
    /// `budget_original + additions_approved - deductions_approved`.
    pub budget_revised: Decimal,
    /// Net approved change over `budget_original`, four decimals; zero when
    /// the original budget is zero.
    pub percent_variation: Decimal,
}

impl ProjectBudgetRollup {
    /// Computes the rollup.
    #[must_use]
    pub fn compute(
        ledger: &BudgetLedger,
        register: &ChangeOrderRegister,
        nominal_budget: Decimal,
    ) -> Self {
        let mut manual = ledger.manual_lines().peekable();
        let budget_original = if manual.peek().is_some() {
            MoneyRollup::sum(manual, |l| l.budget_original)
        } else {
            nominal_budget
        };

        let additions_approved = register.additions_approved();
        let deductions_approved = register.deductions_approved();
        let net = additions_approved - deductions_approved;
        let percent_variation = if budget_original.is_zero() {
            Decimal::ZERO
        } else {
            (net / budget_original)
                .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
        };

        Self {
            budget_original,
            additions_approved,
            deductions_approved,
            pending_amount: register.rollup_pending(),
            budget_revised: budget_original + net,
            percent_variation,
        }
    }
}
