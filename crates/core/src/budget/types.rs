//! Budget data types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use chantier_shared::types::{BudgetLineId, ChangeOrderId, MoneyRollup, ProjectId, amount_from_f64};

use super::error::BudgetError;
use super::variance::{VarianceStatus, utilization_percent};

/// Where a budget line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetLineSource {
    /// Entered by a user.
    Manual,
    /// Synthetic adjustment carrying one approved change order's amount.
    ChangeOrder {
        /// The change order this line accounts for.
        change_order_id: ChangeOrderId,
    },
}

/// A budget line item.
///
/// `budget_current` and `variance` are derived. They are recomputed by the
/// ledger on every mutation and whenever lines are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Budget line ID.
    pub id: BudgetLineId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Division code as entered (`03`, `03 30 00`, ...).
    pub division_code: String,
    /// Free-form description.
    pub description: String,
    /// Origin of the line.
    pub source: BudgetLineSource,
    /// Budget at creation.
    pub budget_original: Decimal,
    /// Budget after the owner's initial approval.
    pub budget_approved: Decimal,
    /// Signed sum of approved change orders carried by this line.
    pub budget_changes: Decimal,
    /// Derived: `budget_approved + budget_changes`.
    pub budget_current: Decimal,
    /// Amount contractually obligated.
    pub committed: Decimal,
    /// Amount spent to date.
    pub actual: Decimal,
    /// Projected final spend.
    pub forecast: Decimal,
    /// Derived: `budget_current - forecast`. Negative means overrun.
    pub variance: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl BudgetLine {
    /// Recomputes every derived field from its inputs.
    pub fn recompute(&mut self) {
        self.budget_current = self.budget_approved + self.budget_changes;
        self.variance = self.budget_current - self.forecast;
    }

    /// Returns true if every derived field matches its formula.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.budget_current == self.budget_approved + self.budget_changes
            && self.variance == self.budget_current - self.forecast
    }

    /// Returns true for synthetic change-order adjustment lines.
    #[must_use]
    pub fn is_adjustment(&self) -> bool {
        matches!(self.source, BudgetLineSource::ChangeOrder { .. })
    }

    /// Variance status of this line.
    #[must_use]
    pub fn variance_status(&self) -> VarianceStatus {
        VarianceStatus::of(self.variance)
    }

    /// Actual spend as a percentage of the current budget.
    #[must_use]
    pub fn utilization_percent(&self) -> Decimal {
        utilization_percent(self.actual, self.budget_current)
    }
}

/// Input for creating a budget line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewBudgetLine {
    /// Division code.
    pub division_code: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Original budget amount.
    pub budget_original: Decimal,
}

impl NewBudgetLine {
    /// Creates an input from decimal values.
    #[must_use]
    pub fn new(
        division_code: impl Into<String>,
        description: impl Into<String>,
        budget_original: Decimal,
    ) -> Self {
        Self {
            division_code: division_code.into(),
            description: description.into(),
            budget_original,
        }
    }

    /// Creates an input from a float entered in a form.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `budget_original` is NaN or infinite.
    pub fn try_from_f64(
        division_code: impl Into<String>,
        description: impl Into<String>,
        budget_original: f64,
    ) -> Result<Self, BudgetError> {
        let amount = amount_from_f64("budget_original", budget_original)?;
        Ok(Self::new(division_code, description, amount))
    }
}

/// Partial update of a budget line.
///
/// Only `description`, `committed`, `actual` and `forecast` are applied.
/// Derived and budget fields are accepted so that editors may send a whole
/// line back, but their values are dropped. Any other field is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetLinePatch {
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New committed amount.
    #[serde(default)]
    pub committed: Option<Decimal>,
    /// New actual amount.
    #[serde(default)]
    pub actual: Option<Decimal>,
    /// New forecast amount.
    #[serde(default)]
    pub forecast: Option<Decimal>,

    #[serde(default, rename = "budget_original")]
    _budget_original: Option<IgnoredAny>,
    #[serde(default, rename = "budget_approved")]
    _budget_approved: Option<IgnoredAny>,
    #[serde(default, rename = "budget_changes")]
    _budget_changes: Option<IgnoredAny>,
    #[serde(default, rename = "budget_current")]
    _budget_current: Option<IgnoredAny>,
    #[serde(default, rename = "variance")]
    _variance: Option<IgnoredAny>,
}

impl BudgetLinePatch {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the committed amount.
    #[must_use]
    pub fn committed(mut self, amount: Decimal) -> Self {
        self.committed = Some(amount);
        self
    }

    /// Sets the actual amount.
    #[must_use]
    pub fn actual(mut self, amount: Decimal) -> Self {
        self.actual = Some(amount);
        self
    }

    /// Sets the forecast amount.
    #[must_use]
    pub fn forecast(mut self, amount: Decimal) -> Self {
        self.forecast = Some(amount);
        self
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.committed.is_none()
            && self.actual.is_none()
            && self.forecast.is_none()
    }
}

/// Budget effect of an approved change order, handed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedChange {
    /// The approved change order.
    pub change_order_id: ChangeOrderId,
    /// Its human-assigned number (`CO-001`).
    pub number: String,
    /// Division the change applies to, if it was tagged with one.
    pub division_code: Option<String>,
    /// Signed amount: positive for additions, negative for deductions.
    pub signed_amount: Decimal,
}

/// Which divisions a division rollup lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollupScope {
    /// Only divisions with at least one line.
    #[default]
    Used,
    /// Every taxonomy entry, zero-filled when it has no lines.
    All,
}

/// Summed money fields of a set of budget lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetTotals {
    /// Sum of original budgets.
    pub budget_original: Decimal,
    /// Sum of approved budgets.
    pub budget_approved: Decimal,
    /// Sum of approved changes.
    pub budget_changes: Decimal,
    /// Sum of current budgets.
    pub budget_current: Decimal,
    /// Sum of committed amounts.
    pub committed: Decimal,
    /// Sum of actual amounts.
    pub actual: Decimal,
    /// Sum of forecasts.
    pub forecast: Decimal,
    /// Sum of variances.
    pub variance: Decimal,
}

impl BudgetTotals {
    /// Sums the money fields of `lines`.
    pub fn of_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a BudgetLine>,
        I::IntoIter: Clone,
    {
        let lines = lines.into_iter();
        Self {
            budget_original: MoneyRollup::sum(lines.clone(), |l| l.budget_original),
            budget_approved: MoneyRollup::sum(lines.clone(), |l| l.budget_approved),
            budget_changes: MoneyRollup::sum(lines.clone(), |l| l.budget_changes),
            budget_current: MoneyRollup::sum(lines.clone(), |l| l.budget_current),
            committed: MoneyRollup::sum(lines.clone(), |l| l.committed),
            actual: MoneyRollup::sum(lines.clone(), |l| l.actual),
            forecast: MoneyRollup::sum(lines.clone(), |l| l.forecast),
            variance: MoneyRollup::sum(lines, |l| l.variance),
        }
    }

    /// Sums already-computed totals.
    pub fn combine<'a, I>(totals: I) -> Self
    where
        I: IntoIterator<Item = &'a BudgetTotals>,
        I::IntoIter: Clone,
    {
        let totals = totals.into_iter();
        Self {
            budget_original: MoneyRollup::sum(totals.clone(), |t| t.budget_original),
            budget_approved: MoneyRollup::sum(totals.clone(), |t| t.budget_approved),
            budget_changes: MoneyRollup::sum(totals.clone(), |t| t.budget_changes),
            budget_current: MoneyRollup::sum(totals.clone(), |t| t.budget_current),
            committed: MoneyRollup::sum(totals.clone(), |t| t.committed),
            actual: MoneyRollup::sum(totals.clone(), |t| t.actual),
            forecast: MoneyRollup::sum(totals.clone(), |t| t.forecast),
            variance: MoneyRollup::sum(totals, |t| t.variance),
        }
    }

    /// Variance status of the totals.
    #[must_use]
    pub fn variance_status(&self) -> VarianceStatus {
        VarianceStatus::of(self.variance)
    }

    /// Actual spend as a percentage of the current budget.
    #[must_use]
    pub fn utilization_percent(&self) -> Decimal {
        utilization_percent(self.actual, self.budget_current)
    }
}

/// Rollup of one division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionRollup {
    /// Division code from the taxonomy, or the raw group for lines whose
    /// division is no longer in the taxonomy.
    pub division_code: String,
    /// Division name; `None` for unclassified groups.
    pub division_name: Option<String>,
    /// Number of lines in the division.
    pub line_count: usize,
    /// Summed money fields.
    pub totals: BudgetTotals,
}
