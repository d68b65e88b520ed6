//! Budget ledger: the set of budget lines of one project.
//!
//! Every mutation is split in two steps. `prepare_*` validates the request
//! and returns the record that would be written, without touching the
//! ledger. `commit`/`detach` then apply it. Callers that persist records
//! prepare, persist, and commit only once the write succeeded, so a failed
//! write leaves the ledger unchanged. The `add_line`, `update_line`,
//! `remove_line` and `apply_approved_change` helpers chain both steps for
//! purely in-memory use.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use chantier_shared::types::{BudgetLineId, ProjectId, check_amount};

use super::error::BudgetError;
use super::types::{
    ApprovedChange, BudgetLine, BudgetLinePatch, BudgetLineSource, BudgetTotals, DivisionRollup,
    NewBudgetLine, RollupScope,
};
use crate::division::DivisionTaxonomy;
use crate::division::taxonomy::group_of;

/// Budget lines of a single project.
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    project_id: ProjectId,
    taxonomy: Arc<DivisionTaxonomy>,
    lines: BTreeMap<BudgetLineId, BudgetLine>,
}

impl BudgetLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(project_id: ProjectId, taxonomy: Arc<DivisionTaxonomy>) -> Self {
        Self {
            project_id,
            taxonomy,
            lines: BTreeMap::new(),
        }
    }

    /// Rebuilds a ledger from persisted lines.
    ///
    /// Derived fields are recomputed. Lines whose division has left the
    /// taxonomy are kept and rolled up under their raw group.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::ProjectMismatch` if a line belongs to another
    /// project.
    pub fn from_lines(
        project_id: ProjectId,
        taxonomy: Arc<DivisionTaxonomy>,
        lines: impl IntoIterator<Item = BudgetLine>,
    ) -> Result<Self, BudgetError> {
        let mut ledger = Self::new(project_id, taxonomy);
        for mut line in lines {
            ledger.check_project(&line)?;
            line.recompute();
            ledger.lines.insert(line.id, line);
        }
        Ok(ledger)
    }

    /// Project this ledger belongs to.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Division taxonomy used for classification.
    #[must_use]
    pub fn taxonomy(&self) -> &DivisionTaxonomy {
        &self.taxonomy
    }

    /// Lines in creation order.
    pub fn lines(&self) -> impl Iterator<Item = &BudgetLine> + Clone {
        self.lines.values()
    }

    /// Looks up a line.
    #[must_use]
    pub fn line(&self, id: BudgetLineId) -> Option<&BudgetLine> {
        self.lines.get(&id)
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the ledger has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines entered by users, excluding change-order adjustments.
    pub fn manual_lines(&self) -> impl Iterator<Item = &BudgetLine> + Clone {
        self.lines.values().filter(|l| !l.is_adjustment())
    }

    /// Builds a new line without adding it.
    ///
    /// The line starts with `budget_approved = forecast = budget_original`
    /// and no spend.
    ///
    /// # Errors
    ///
    /// Returns a division error if the code matches no division, and a
    /// validation error if `budget_original` is negative or outside the
    /// stored money range.
    pub fn prepare_line(
        &self,
        input: NewBudgetLine,
        at: DateTime<Utc>,
    ) -> Result<BudgetLine, BudgetError> {
        self.taxonomy.classify(&input.division_code)?;
        checked_amount("budget_original", input.budget_original)?;

        let mut line = BudgetLine {
            id: BudgetLineId::new(),
            project_id: self.project_id,
            division_code: input.division_code.trim().to_string(),
            description: input.description.trim().to_string(),
            source: BudgetLineSource::Manual,
            budget_original: input.budget_original,
            budget_approved: input.budget_original,
            budget_changes: Decimal::ZERO,
            budget_current: Decimal::ZERO,
            committed: Decimal::ZERO,
            actual: Decimal::ZERO,
            forecast: input.budget_original,
            variance: Decimal::ZERO,
            created_at: at,
            updated_at: at,
        };
        line.recompute();
        Ok(line)
    }

    /// Builds the updated version of a line without storing it.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::LineNotFound` for an unknown line and a
    /// validation error for negative or out-of-range spend figures.
    pub fn prepare_update(
        &self,
        id: BudgetLineId,
        patch: &BudgetLinePatch,
        at: DateTime<Utc>,
    ) -> Result<BudgetLine, BudgetError> {
        let mut line = self
            .lines
            .get(&id)
            .cloned()
            .ok_or(BudgetError::LineNotFound(id))?;

        if let Some(description) = &patch.description {
            line.description = description.trim().to_string();
        }
        if let Some(committed) = patch.committed {
            line.committed = checked_amount("committed", committed)?;
        }
        if let Some(actual) = patch.actual {
            line.actual = checked_amount("actual", actual)?;
        }
        if let Some(forecast) = patch.forecast {
            line.forecast = checked_amount("forecast", forecast)?;
        }

        line.recompute();
        line.updated_at = at;
        Ok(line)
    }

    /// Checks that a line may be removed and returns it.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::LineNotFound` for an unknown line and
    /// `BudgetError::AdjustmentLineLocked` for change-order adjustment lines.
    pub fn prepare_removal(&self, id: BudgetLineId) -> Result<&BudgetLine, BudgetError> {
        let line = self.lines.get(&id).ok_or(BudgetError::LineNotFound(id))?;
        if line.is_adjustment() {
            return Err(BudgetError::AdjustmentLineLocked(id));
        }
        Ok(line)
    }

    /// Builds the adjustment line carrying an approved change order.
    ///
    /// Returns `None` when the change has no budget effect at division
    /// level: a zero signed amount, or no division tag. Such changes still
    /// count in the project rollup through the change-order register.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::ChangeAlreadyApplied` if the change order
    /// already has an adjustment line, and a division error if its division
    /// is unknown.
    pub fn prepare_approved_change(
        &self,
        change: &ApprovedChange,
        at: DateTime<Utc>,
    ) -> Result<Option<BudgetLine>, BudgetError> {
        if self.lines.values().any(|l| {
            l.source
                == BudgetLineSource::ChangeOrder {
                    change_order_id: change.change_order_id,
                }
        }) {
            return Err(BudgetError::ChangeAlreadyApplied(change.change_order_id));
        }

        let Some(division_code) = change.division_code.as_deref() else {
            return Ok(None);
        };
        if change.signed_amount.is_zero() {
            return Ok(None);
        }
        self.taxonomy.classify(division_code)?;

        let mut line = BudgetLine {
            id: BudgetLineId::new(),
            project_id: self.project_id,
            division_code: division_code.trim().to_string(),
            description: format!("Change order {}", change.number),
            source: BudgetLineSource::ChangeOrder {
                change_order_id: change.change_order_id,
            },
            budget_original: Decimal::ZERO,
            budget_approved: Decimal::ZERO,
            budget_changes: change.signed_amount,
            budget_current: Decimal::ZERO,
            committed: Decimal::ZERO,
            actual: Decimal::ZERO,
            forecast: change.signed_amount,
            variance: Decimal::ZERO,
            created_at: at,
            updated_at: at,
        };
        line.recompute();
        Ok(Some(line))
    }

    /// Stores a prepared line, replacing any line with the same ID.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::ProjectMismatch` if the line belongs to another
    /// project.
    pub fn commit(&mut self, mut line: BudgetLine) -> Result<&BudgetLine, BudgetError> {
        self.check_project(&line)?;
        line.recompute();
        let id = line.id;
        self.lines.insert(id, line);
        Ok(&self.lines[&id])
    }

    /// Removes a line from the ledger and every rollup.
    pub fn detach(&mut self, id: BudgetLineId) -> Option<BudgetLine> {
        self.lines.remove(&id)
    }

    /// Adds a line.
    ///
    /// # Errors
    ///
    /// See [`BudgetLedger::prepare_line`].
    pub fn add_line(&mut self, input: NewBudgetLine) -> Result<&BudgetLine, BudgetError> {
        let line = self.prepare_line(input, Utc::now())?;
        self.commit(line)
    }

    /// Applies a partial update to a line.
    ///
    /// # Errors
    ///
    /// See [`BudgetLedger::prepare_update`].
    pub fn update_line(
        &mut self,
        id: BudgetLineId,
        patch: &BudgetLinePatch,
    ) -> Result<&BudgetLine, BudgetError> {
        let line = self.prepare_update(id, patch, Utc::now())?;
        self.commit(line)
    }

    /// Removes a line.
    ///
    /// # Errors
    ///
    /// See [`BudgetLedger::prepare_removal`].
    pub fn remove_line(&mut self, id: BudgetLineId) -> Result<BudgetLine, BudgetError> {
        self.prepare_removal(id)?;
        self.detach(id).ok_or(BudgetError::LineNotFound(id))
    }

    /// Folds an approved change order into its division.
    ///
    /// # Errors
    ///
    /// See [`BudgetLedger::prepare_approved_change`].
    pub fn apply_approved_change(
        &mut self,
        change: &ApprovedChange,
    ) -> Result<Option<&BudgetLine>, BudgetError> {
        match self.prepare_approved_change(change, Utc::now())? {
            Some(line) => self.commit(line).map(Some),
            None => Ok(None),
        }
    }

    /// Sums lines per division, in taxonomy order.
    ///
    /// Lines whose division is not in the taxonomy are appended, grouped by
    /// their raw two-character group, without a division name.
    #[must_use]
    pub fn rollup_by_division(&self, scope: RollupScope) -> Vec<DivisionRollup> {
        let mut groups: BTreeMap<&str, Vec<&BudgetLine>> = BTreeMap::new();
        for line in self.lines.values() {
            let key = group_of(&line.division_code).unwrap_or(line.division_code.as_str());
            groups.entry(key).or_default().push(line);
        }

        let mut rollups = Vec::new();
        for division in self.taxonomy.divisions() {
            let lines = groups.remove(division.group()).unwrap_or_default();
            if lines.is_empty() && scope == RollupScope::Used {
                continue;
            }
            rollups.push(DivisionRollup {
                division_code: division.code.clone(),
                division_name: Some(division.name.clone()),
                line_count: lines.len(),
                totals: BudgetTotals::of_lines(lines.iter().copied()),
            });
        }

        rollups.extend(groups.into_iter().map(|(group, lines)| DivisionRollup {
            division_code: group.to_string(),
            division_name: None,
            line_count: lines.len(),
            totals: BudgetTotals::of_lines(lines.iter().copied()),
        }));
        rollups
    }

    /// Project-level totals: the sum of the division rollups.
    #[must_use]
    pub fn rollup_project(&self) -> BudgetTotals {
        let rollups = self.rollup_by_division(RollupScope::Used);
        BudgetTotals::combine(rollups.iter().map(|r| &r.totals))
    }

    fn check_project(&self, line: &BudgetLine) -> Result<(), BudgetError> {
        if line.project_id == self.project_id {
            Ok(())
        } else {
            Err(BudgetError::ProjectMismatch {
                line_id: line.id,
                expected: self.project_id,
                found: line.project_id,
            })
        }
    }
}

fn checked_amount(field: &'static str, amount: Decimal) -> Result<Decimal, BudgetError> {
    let amount = check_amount(field, amount)?;
    if amount < Decimal::ZERO {
        Err(BudgetError::validation(field, "must not be negative"))
    } else {
        Ok(amount)
    }
}
