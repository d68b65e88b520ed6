//! Change-order register of one project.
//!
//! Follows the same prepare/commit split as the budget ledger: `prepare_*`
//! validates and returns the record to write, `commit`/`detach` apply it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use chantier_shared::types::{ChangeOrderId, MoneyRollup, ProjectId, Sign, check_amount};

use super::error::ChangeOrderError;
use super::types::{ChangeOrder, ChangeOrderPatch, ChangeOrderStatus, NewChangeOrder, Numbering};
use super::workflow::{ChangeOrderWorkflow, Transition};
use crate::budget::{ApprovedChange, BudgetLedger};
use crate::division::DivisionTaxonomy;

/// Change orders of a single project.
#[derive(Debug, Clone)]
pub struct ChangeOrderRegister {
    project_id: ProjectId,
    taxonomy: Arc<DivisionTaxonomy>,
    numbering: Numbering,
    last_sequence: u32,
    orders: BTreeMap<ChangeOrderId, ChangeOrder>,
}

impl ChangeOrderRegister {
    /// Creates an empty register.
    #[must_use]
    pub fn new(project_id: ProjectId, taxonomy: Arc<DivisionTaxonomy>, numbering: Numbering) -> Self {
        Self {
            project_id,
            taxonomy,
            numbering,
            last_sequence: 0,
            orders: BTreeMap::new(),
        }
    }

    /// Rebuilds a register from persisted orders.
    ///
    /// `last_sequence` is the persisted high-water mark; the larger of it and
    /// the highest loaded sequence is kept so deleted numbers stay retired.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::ProjectMismatch` if an order belongs to
    /// another project, and a validation error on `number` if an order's
    /// number does not parse back to its sequence under `numbering`.
    pub fn from_orders(
        project_id: ProjectId,
        taxonomy: Arc<DivisionTaxonomy>,
        numbering: Numbering,
        orders: impl IntoIterator<Item = ChangeOrder>,
        last_sequence: u32,
    ) -> Result<Self, ChangeOrderError> {
        let mut register = Self::new(project_id, taxonomy, numbering);
        register.last_sequence = last_sequence;
        for order in orders {
            if register.numbering.parse(&order.number) != Some(order.sequence) {
                return Err(ChangeOrderError::validation(
                    "number",
                    format!("{} does not match sequence {}", order.number, order.sequence),
                ));
            }
            register.commit(order)?;
        }
        Ok(register)
    }

    /// Project this register belongs to.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Highest sequence number ever assigned.
    #[must_use]
    pub fn last_sequence(&self) -> u32 {
        self.last_sequence
    }

    /// Numbering scheme.
    #[must_use]
    pub fn numbering(&self) -> &Numbering {
        &self.numbering
    }

    /// Orders sorted by sequence.
    #[must_use]
    pub fn orders(&self) -> Vec<&ChangeOrder> {
        let mut orders: Vec<&ChangeOrder> = self.orders.values().collect();
        orders.sort_by_key(|o| o.sequence);
        orders
    }

    /// Looks up an order.
    #[must_use]
    pub fn get(&self, id: ChangeOrderId) -> Option<&ChangeOrder> {
        self.orders.get(&id)
    }

    /// Number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns true if the register holds no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Builds a new draft with the next number, without storing it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title or a negative amount, a
    /// money error for an amount outside the stored range, and a division
    /// error for an unknown division tag.
    pub fn prepare_create(
        &self,
        input: NewChangeOrder,
        at: DateTime<Utc>,
    ) -> Result<ChangeOrder, ChangeOrderError> {
        let title = required_title(&input.title)?;
        let amount = checked_amount(input.amount)?;
        let division_code = self.division(input.division_code)?;
        let sequence = self
            .last_sequence
            .checked_add(1)
            .ok_or(ChangeOrderError::NumberingExhausted)?;

        Ok(ChangeOrder {
            id: ChangeOrderId::new(),
            project_id: self.project_id,
            sequence,
            number: self.numbering.format(sequence),
            title,
            description: input.description.trim().to_string(),
            change_type: input.change_type,
            amount,
            status: ChangeOrderStatus::Draft,
            division_code,
            reason: optional_text(input.reason),
            date_requested: at.date_naive(),
            date_approved: None,
            date_required: input.date_required,
            created_at: at,
            updated_at: at,
        })
    }

    /// Builds the edited version of a draft without storing it.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::NotFound`, `ChangeOrderError::NotEditable`
    /// for non-drafts, and the validation errors of
    /// [`ChangeOrderRegister::prepare_create`].
    pub fn prepare_update(
        &self,
        id: ChangeOrderId,
        patch: ChangeOrderPatch,
        at: DateTime<Utc>,
    ) -> Result<ChangeOrder, ChangeOrderError> {
        let mut order = self.find(id)?.clone();
        if !order.status.is_editable() {
            return Err(ChangeOrderError::NotEditable(order.status));
        }

        if let Some(title) = patch.title {
            order.title = required_title(&title)?;
        }
        if let Some(description) = patch.description {
            order.description = description.trim().to_string();
        }
        if let Some(change_type) = patch.change_type {
            order.change_type = change_type;
        }
        if let Some(amount) = patch.amount {
            order.amount = checked_amount(amount)?;
        }
        if let Some(division_code) = patch.division_code {
            order.division_code = self.division(division_code)?;
        }
        if let Some(reason) = patch.reason {
            order.reason = optional_text(reason);
        }
        if let Some(date_required) = patch.date_required {
            order.date_required = date_required;
        }

        order.updated_at = at;
        Ok(order)
    }

    /// Builds the order as it would be after `transition`.
    ///
    /// Approval stamps `date_approved` with the date of `at`.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::NotFound` or
    /// `ChangeOrderError::InvalidTransition`.
    pub fn prepare_transition(
        &self,
        id: ChangeOrderId,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<ChangeOrder, ChangeOrderError> {
        let mut order = self.find(id)?.clone();
        order.status = ChangeOrderWorkflow::apply(order.status, transition)?;
        if order.status == ChangeOrderStatus::Approved {
            order.date_approved = Some(at.date_naive());
        }
        order.updated_at = at;
        Ok(order)
    }

    /// Checks that an order may be deleted and returns it.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::NotFound` or
    /// `ChangeOrderError::CannotDeleteApproved`.
    pub fn prepare_delete(&self, id: ChangeOrderId) -> Result<&ChangeOrder, ChangeOrderError> {
        let order = self.find(id)?;
        if order.status == ChangeOrderStatus::Approved {
            return Err(ChangeOrderError::CannotDeleteApproved(id));
        }
        Ok(order)
    }

    /// Budget effect of an approved order, for the ledger.
    #[must_use]
    pub fn approved_change(order: &ChangeOrder) -> ApprovedChange {
        ApprovedChange {
            change_order_id: order.id,
            number: order.number.clone(),
            division_code: order.division_code.clone(),
            signed_amount: order.signed_amount(),
        }
    }

    /// Stores a prepared order and advances the high-water mark.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::ProjectMismatch` if the order belongs to
    /// another project.
    pub fn commit(&mut self, order: ChangeOrder) -> Result<&ChangeOrder, ChangeOrderError> {
        if order.project_id != self.project_id {
            return Err(ChangeOrderError::ProjectMismatch {
                id: order.id,
                expected: self.project_id,
                found: order.project_id,
            });
        }
        self.last_sequence = self.last_sequence.max(order.sequence);
        let id = order.id;
        self.orders.insert(id, order);
        Ok(&self.orders[&id])
    }

    /// Removes an order. Its number stays retired.
    pub fn detach(&mut self, id: ChangeOrderId) -> Option<ChangeOrder> {
        self.orders.remove(&id)
    }

    /// Creates a draft.
    ///
    /// # Errors
    ///
    /// See [`ChangeOrderRegister::prepare_create`].
    pub fn create(&mut self, input: NewChangeOrder) -> Result<&ChangeOrder, ChangeOrderError> {
        let order = self.prepare_create(input, Utc::now())?;
        self.commit(order)
    }

    /// Edits a draft.
    ///
    /// # Errors
    ///
    /// See [`ChangeOrderRegister::prepare_update`].
    pub fn update_draft(
        &mut self,
        id: ChangeOrderId,
        patch: ChangeOrderPatch,
    ) -> Result<&ChangeOrder, ChangeOrderError> {
        let order = self.prepare_update(id, patch, Utc::now())?;
        self.commit(order)
    }

    /// Submits a draft.
    ///
    /// # Errors
    ///
    /// See [`ChangeOrderRegister::prepare_transition`].
    pub fn submit(&mut self, id: ChangeOrderId) -> Result<&ChangeOrder, ChangeOrderError> {
        let order = self.prepare_transition(id, Transition::Submit, Utc::now())?;
        self.commit(order)
    }

    /// Approves a submitted order and folds its amount into `ledger`.
    ///
    /// Both sides are validated before either changes, so a refused budget
    /// effect leaves the order submitted.
    ///
    /// # Errors
    ///
    /// See [`ChangeOrderRegister::prepare_transition`] and
    /// [`BudgetLedger::prepare_approved_change`].
    pub fn approve(
        &mut self,
        id: ChangeOrderId,
        ledger: &mut BudgetLedger,
    ) -> Result<&ChangeOrder, ChangeOrderError> {
        if ledger.project_id() != self.project_id {
            return Err(ChangeOrderError::ProjectMismatch {
                id,
                expected: self.project_id,
                found: ledger.project_id(),
            });
        }
        let at = Utc::now();
        let order = self.prepare_transition(id, Transition::Approve, at)?;
        let adjustment = ledger.prepare_approved_change(&Self::approved_change(&order), at)?;
        if let Some(line) = adjustment {
            ledger.commit(line)?;
        }
        self.commit(order)
    }

    /// Rejects a submitted order.
    ///
    /// # Errors
    ///
    /// See [`ChangeOrderRegister::prepare_transition`].
    pub fn reject(&mut self, id: ChangeOrderId) -> Result<&ChangeOrder, ChangeOrderError> {
        let order = self.prepare_transition(id, Transition::Reject, Utc::now())?;
        self.commit(order)
    }

    /// Voids an order that has not been decided.
    ///
    /// # Errors
    ///
    /// See [`ChangeOrderRegister::prepare_transition`].
    pub fn void(&mut self, id: ChangeOrderId) -> Result<&ChangeOrder, ChangeOrderError> {
        let order = self.prepare_transition(id, Transition::Void, Utc::now())?;
        self.commit(order)
    }

    /// Deletes an order that is not approved.
    ///
    /// # Errors
    ///
    /// See [`ChangeOrderRegister::prepare_delete`].
    pub fn delete(&mut self, id: ChangeOrderId) -> Result<ChangeOrder, ChangeOrderError> {
        self.prepare_delete(id)?;
        self.detach(id).ok_or(ChangeOrderError::NotFound(id))
    }

    /// Signed sum of submitted orders; no-cost orders contribute nothing.
    #[must_use]
    pub fn rollup_pending(&self) -> Decimal {
        self.signed_total(ChangeOrderStatus::Submitted)
    }

    /// Signed sum of approved orders; no-cost orders contribute nothing.
    #[must_use]
    pub fn rollup_approved(&self) -> Decimal {
        self.signed_total(ChangeOrderStatus::Approved)
    }

    /// Sum of approved additions.
    #[must_use]
    pub fn additions_approved(&self) -> Decimal {
        self.approved_with_sign(Sign::Positive)
    }

    /// Sum of approved deductions, as a positive magnitude.
    #[must_use]
    pub fn deductions_approved(&self) -> Decimal {
        self.approved_with_sign(Sign::Negative)
    }

    fn signed_total(&self, status: ChangeOrderStatus) -> Decimal {
        MoneyRollup::signed_sum(self.with_status(status), |o| o.rollup_entry())
    }

    fn approved_with_sign(&self, sign: Sign) -> Decimal {
        MoneyRollup::sum(
            self.with_status(ChangeOrderStatus::Approved)
                .filter(|o| o.change_type.sign() == Some(sign)),
            |o| o.amount,
        )
    }

    fn with_status(&self, status: ChangeOrderStatus) -> impl Iterator<Item = &ChangeOrder> {
        self.orders.values().filter(move |o| o.status == status)
    }

    fn find(&self, id: ChangeOrderId) -> Result<&ChangeOrder, ChangeOrderError> {
        self.orders.get(&id).ok_or(ChangeOrderError::NotFound(id))
    }

    fn division(&self, code: Option<String>) -> Result<Option<String>, ChangeOrderError> {
        match optional_text(code) {
            Some(code) => {
                self.taxonomy.classify(&code)?;
                Ok(Some(code))
            }
            None => Ok(None),
        }
    }
}

fn required_title(title: &str) -> Result<String, ChangeOrderError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ChangeOrderError::validation("title", "must not be empty"));
    }
    Ok(title.to_string())
}

fn checked_amount(amount: Decimal) -> Result<Decimal, ChangeOrderError> {
    let amount = check_amount("amount", amount)?;
    if amount < Decimal::ZERO {
        return Err(ChangeOrderError::validation("amount", "must not be negative"));
    }
    Ok(amount)
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
