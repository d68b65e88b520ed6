//! Persisted budget ledger and change-order register of one project.
//!
//! Every mutation validates against the in-memory state, issues exactly one
//! repository call, and applies the change in memory only after that call
//! succeeded. A persistence failure therefore leaves both the store and the
//! service unchanged.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use chantier_shared::types::{BudgetLineId, ChangeOrderId, ProjectId};

use super::error::ProjectError;
use super::rollup::ProjectBudgetRollup;
use crate::budget::{
    BudgetError, BudgetLedger, BudgetLine, BudgetLinePatch, BudgetTotals, DivisionRollup,
    NewBudgetLine, RollupScope,
};
use crate::change_order::{
    ChangeOrder, ChangeOrderError, ChangeOrderPatch, ChangeOrderRegister, NewChangeOrder,
    Numbering, Transition,
};
use crate::division::DivisionTaxonomy;
use crate::repository::{BudgetLineRepository, ChangeOrderRepository, RepositoryError};

/// Budget ledger and change-order register of a project, backed by a
/// repository.
pub struct ProjectBudgetService<R> {
    repo: Arc<R>,
    ledger: BudgetLedger,
    register: ChangeOrderRegister,
    nominal_budget: Decimal,
}

impl<R> ProjectBudgetService<R>
where
    R: BudgetLineRepository + ChangeOrderRepository,
{
    /// Loads a project's lines and change orders.
    ///
    /// `nominal_budget` is the project's contract budget, used as the
    /// original budget while the project has no budget lines.
    ///
    /// # Errors
    ///
    /// Returns a repository error if loading fails, or a project mismatch if
    /// the repository returns records of another project.
    pub async fn load(
        repo: Arc<R>,
        project_id: ProjectId,
        taxonomy: Arc<DivisionTaxonomy>,
        numbering: Numbering,
        nominal_budget: Decimal,
    ) -> Result<Self, ProjectError> {
        let lines = repo
            .list_lines(project_id)
            .await
            .inspect_err(|e| {
                error!(error = %e, project_id = %project_id, "Failed to load budget lines");
            })?;
        let orders = repo
            .list_change_orders(project_id)
            .await
            .inspect_err(|e| {
                error!(error = %e, project_id = %project_id, "Failed to load change orders");
            })?;
        let last_sequence = repo
            .last_sequence(project_id)
            .await
            .inspect_err(|e| {
                error!(error = %e, project_id = %project_id, "Failed to load change-order sequence");
            })?;

        let ledger = BudgetLedger::from_lines(project_id, Arc::clone(&taxonomy), lines)?;
        let register =
            ChangeOrderRegister::from_orders(project_id, taxonomy, numbering, orders, last_sequence)?;

        debug!(
            project_id = %project_id,
            lines = ledger.len(),
            change_orders = register.len(),
            "Project budget loaded"
        );

        Ok(Self {
            repo,
            ledger,
            register,
            nominal_budget,
        })
    }

    /// Project ID.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.ledger.project_id()
    }

    /// Budget lines.
    #[must_use]
    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    /// Change orders.
    #[must_use]
    pub fn register(&self) -> &ChangeOrderRegister {
        &self.register
    }

    /// Adds a budget line.
    ///
    /// # Errors
    ///
    /// Returns a validation or division error for bad input and a repository
    /// error if the write fails.
    pub async fn add_line(&mut self, input: NewBudgetLine) -> Result<&BudgetLine, ProjectError> {
        let line = self.ledger.prepare_line(input, Utc::now())?;
        self.repo
            .create_line(&line)
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "create budget line"))?;

        info!(
            project_id = %line.project_id,
            line_id = %line.id,
            division = %line.division_code,
            budget_original = %line.budget_original,
            "Budget line added"
        );
        Ok(self.ledger.commit(line)?)
    }

    /// Updates committed, actual, forecast or description of a line.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::LineNotFound`, a validation error for negative
    /// amounts, or a repository error.
    pub async fn update_line(
        &mut self,
        id: BudgetLineId,
        patch: &BudgetLinePatch,
    ) -> Result<&BudgetLine, ProjectError> {
        if patch.is_empty() {
            debug!(line_id = %id, "Empty budget line patch ignored");
            return Ok(self.ledger.line(id).ok_or(BudgetError::LineNotFound(id))?);
        }
        let line = self.ledger.prepare_update(id, patch, Utc::now())?;
        self.repo
            .update_line(&line)
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "update budget line"))?;

        info!(
            project_id = %line.project_id,
            line_id = %line.id,
            variance = %line.variance,
            "Budget line updated"
        );
        Ok(self.ledger.commit(line)?)
    }

    /// Removes a budget line.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::LineNotFound`,
    /// `BudgetError::AdjustmentLineLocked`, or a repository error.
    pub async fn remove_line(&mut self, id: BudgetLineId) -> Result<BudgetLine, ProjectError> {
        self.ledger.prepare_removal(id)?;
        self.repo
            .delete_line(id)
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "delete budget line"))?;

        info!(project_id = %self.project_id(), line_id = %id, "Budget line removed");
        self.ledger
            .detach(id)
            .ok_or_else(|| BudgetError::LineNotFound(id).into())
    }

    /// Creates a draft change order.
    ///
    /// # Errors
    ///
    /// Returns a validation or division error for bad input and a repository
    /// error if the write fails.
    pub async fn create_change_order(
        &mut self,
        input: NewChangeOrder,
    ) -> Result<&ChangeOrder, ProjectError> {
        let order = self.register.prepare_create(input, Utc::now())?;
        self.repo
            .create_change_order(&order)
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "create change order"))?;

        info!(
            project_id = %order.project_id,
            change_order = %order.number,
            change_type = %order.change_type,
            amount = %order.amount,
            "Change order created"
        );
        Ok(self.register.commit(order)?)
    }

    /// Edits a draft change order.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::NotEditable` for non-drafts, validation
    /// errors, or a repository error.
    pub async fn update_change_order(
        &mut self,
        id: ChangeOrderId,
        patch: ChangeOrderPatch,
    ) -> Result<&ChangeOrder, ProjectError> {
        let order = self.register.prepare_update(id, patch, Utc::now())?;
        self.repo
            .update_change_order(&order)
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "update change order"))?;

        info!(
            project_id = %order.project_id,
            change_order = %order.number,
            "Change order updated"
        );
        Ok(self.register.commit(order)?)
    }

    /// Submits a draft for approval.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` or a repository error.
    pub async fn submit(&mut self, id: ChangeOrderId) -> Result<&ChangeOrder, ProjectError> {
        self.transition(id, Transition::Submit).await
    }

    /// Approves a submitted order and applies its amount to the budget.
    ///
    /// The order and its adjustment line are written in one repository call.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` unless the order is
    /// submitted, a budget error if its division is unknown, or a repository
    /// error.
    pub async fn approve(&mut self, id: ChangeOrderId) -> Result<&ChangeOrder, ProjectError> {
        let at = Utc::now();
        let order = self.register.prepare_transition(id, Transition::Approve, at)?;
        let change = ChangeOrderRegister::approved_change(&order);
        let adjustment = self.ledger.prepare_approved_change(&change, at)?;

        self.repo
            .persist_approval(&order, adjustment.as_ref())
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "approve change order"))?;

        info!(
            project_id = %order.project_id,
            change_order = %order.number,
            signed_amount = %change.signed_amount,
            adjustment_line = ?adjustment.as_ref().map(|l| l.id),
            "Change order approved"
        );
        if let Some(line) = adjustment {
            self.ledger.commit(line)?;
        }
        Ok(self.register.commit(order)?)
    }

    /// Rejects a submitted order.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` or a repository error.
    pub async fn reject(&mut self, id: ChangeOrderId) -> Result<&ChangeOrder, ProjectError> {
        self.transition(id, Transition::Reject).await
    }

    /// Voids an undecided order.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` or a repository error.
    pub async fn void(&mut self, id: ChangeOrderId) -> Result<&ChangeOrder, ProjectError> {
        self.transition(id, Transition::Void).await
    }

    /// Deletes an order that is not approved. Its number is not reused.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::CannotDeleteApproved`,
    /// `ChangeOrderError::NotFound`, or a repository error.
    pub async fn delete_change_order(
        &mut self,
        id: ChangeOrderId,
    ) -> Result<ChangeOrder, ProjectError> {
        let number = self.register.prepare_delete(id)?.number.clone();
        self.repo
            .delete_change_order(id)
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "delete change order"))?;

        info!(project_id = %self.project_id(), change_order = %number, "Change order deleted");
        self.register
            .detach(id)
            .ok_or_else(|| ChangeOrderError::NotFound(id).into())
    }

    /// Per-division totals.
    #[must_use]
    pub fn rollup_by_division(&self, scope: RollupScope) -> Vec<DivisionRollup> {
        self.ledger.rollup_by_division(scope)
    }

    /// Project totals over all budget lines.
    #[must_use]
    pub fn rollup_project(&self) -> BudgetTotals {
        self.ledger.rollup_project()
    }

    /// Original, approved and pending change figures of the project.
    #[must_use]
    pub fn project_rollup(&self) -> ProjectBudgetRollup {
        ProjectBudgetRollup::compute(&self.ledger, &self.register, self.nominal_budget)
    }

    async fn transition(
        &mut self,
        id: ChangeOrderId,
        transition: Transition,
    ) -> Result<&ChangeOrder, ProjectError> {
        let order = self.register.prepare_transition(id, transition, Utc::now())?;
        self.repo
            .update_change_order(&order)
            .await
            .inspect_err(|e| persist_failed(e, self.project_id(), "update change-order status"))?;

        info!(
            project_id = %order.project_id,
            change_order = %order.number,
            status = %order.status,
            "Change order status changed"
        );
        Ok(self.register.commit(order)?)
    }
}

fn persist_failed(error: &RepositoryError, project_id: ProjectId, action: &str) {
    error!(error = %error, project_id = %project_id, action, "Failed to persist");
}
