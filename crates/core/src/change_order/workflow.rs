//! Change-order approval state machine.

use serde::{Deserialize, Serialize};

use super::error::ChangeOrderError;
use super::types::ChangeOrderStatus;

/// A requested workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Draft → Submitted.
    Submit,
    /// Submitted → Approved.
    Approve,
    /// Submitted → Rejected.
    Reject,
    /// Draft | Submitted → Void.
    Void,
}

impl Transition {
    /// Status reached by this transition.
    #[must_use]
    pub fn target(self) -> ChangeOrderStatus {
        match self {
            Self::Submit => ChangeOrderStatus::Submitted,
            Self::Approve => ChangeOrderStatus::Approved,
            Self::Reject => ChangeOrderStatus::Rejected,
            Self::Void => ChangeOrderStatus::Void,
        }
    }
}

/// Stateless validator for change-order transitions.
pub struct ChangeOrderWorkflow;

impl ChangeOrderWorkflow {
    /// Submit a draft for the owner's decision.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` unless the order is a
    /// draft.
    pub fn submit(current: ChangeOrderStatus) -> Result<ChangeOrderStatus, ChangeOrderError> {
        Self::apply(current, Transition::Submit)
    }

    /// Approve a submitted order.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` unless the order is
    /// submitted.
    pub fn approve(current: ChangeOrderStatus) -> Result<ChangeOrderStatus, ChangeOrderError> {
        Self::apply(current, Transition::Approve)
    }

    /// Reject a submitted order.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` unless the order is
    /// submitted.
    pub fn reject(current: ChangeOrderStatus) -> Result<ChangeOrderStatus, ChangeOrderError> {
        Self::apply(current, Transition::Reject)
    }

    /// Void an order that has not been decided yet.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` for terminal orders.
    pub fn void(current: ChangeOrderStatus) -> Result<ChangeOrderStatus, ChangeOrderError> {
        Self::apply(current, Transition::Void)
    }

    /// Validates `transition` from `current` and returns the new status.
    ///
    /// # Errors
    ///
    /// Returns `ChangeOrderError::InvalidTransition` carrying the current
    /// and attempted status.
    pub fn apply(
        current: ChangeOrderStatus,
        transition: Transition,
    ) -> Result<ChangeOrderStatus, ChangeOrderError> {
        let target = transition.target();
        if Self::is_valid_transition(current, target) {
            Ok(target)
        } else {
            Err(ChangeOrderError::InvalidTransition {
                from: current,
                to: target,
            })
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: ChangeOrderStatus, to: ChangeOrderStatus) -> bool {
        use ChangeOrderStatus::{Approved, Draft, Rejected, Submitted, Void};
        matches!(
            (from, to),
            (Draft, Submitted) | (Submitted, Approved | Rejected) | (Draft | Submitted, Void)
        )
    }
}
