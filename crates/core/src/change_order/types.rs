//! Change-order domain types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use chantier_shared::types::{ChangeOrderId, ProjectId, Sign};

/// Kind of contract change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrderType {
    /// Increases the contract amount.
    Addition,
    /// Decreases the contract amount.
    Deduction,
    /// Scope or schedule change with no money effect.
    NoCost,
}

impl ChangeOrderType {
    /// Sign of the amount in budget rollups; `None` for no-cost changes.
    #[must_use]
    pub fn sign(self) -> Option<Sign> {
        match self {
            Self::Addition => Some(Sign::Positive),
            Self::Deduction => Some(Sign::Negative),
            Self::NoCost => None,
        }
    }

    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Deduction => "deduction",
            Self::NoCost => "no_cost",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "addition" => Some(Self::Addition),
            "deduction" => Some(Self::Deduction),
            "no_cost" => Some(Self::NoCost),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeOrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Change-order status in the approval workflow.
///
/// - Draft → Submitted (submit)
/// - Submitted → Approved (approve)
/// - Submitted → Rejected (reject)
/// - Draft | Submitted → Void (void)
///
/// Approved, Rejected and Void are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOrderStatus {
    /// Being drafted; the only editable state.
    Draft,
    /// Awaiting the owner's decision.
    Submitted,
    /// Accepted; its amount is part of the budget.
    Approved,
    /// Refused.
    Rejected,
    /// Withdrawn before a decision.
    Void,
}

impl ChangeOrderStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Void => "void",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    /// Returns true if the order can still be edited.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Void)
    }
}

impl fmt::Display for ChangeOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A change order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOrder {
    /// Change order ID.
    pub id: ChangeOrderId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Position in the project's numbering sequence, starting at 1.
    pub sequence: u32,
    /// Formatted number, e.g. `CO-001`.
    pub number: String,
    /// Short title.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Addition, deduction or no-cost.
    #[serde(rename = "type")]
    pub change_type: ChangeOrderType,
    /// Non-negative magnitude; the sign comes from `change_type`.
    pub amount: Decimal,
    /// Workflow status.
    pub status: ChangeOrderStatus,
    /// Division the change applies to, if any.
    pub division_code: Option<String>,
    /// Why the change was requested.
    pub reason: Option<String>,
    /// Date the order was created.
    pub date_requested: NaiveDate,
    /// Date of approval; set iff the status is approved.
    pub date_approved: Option<NaiveDate>,
    /// Date by which a decision is needed.
    pub date_required: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ChangeOrder {
    /// Rollup contribution: the amount and its sign, or `None` for no-cost
    /// orders whatever their stored amount.
    #[must_use]
    pub fn rollup_entry(&self) -> Option<(Decimal, Sign)> {
        self.change_type.sign().map(|sign| (self.amount, sign))
    }

    /// Signed amount: positive for additions, negative for deductions, zero
    /// for no-cost changes.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.rollup_entry()
            .map_or(Decimal::ZERO, |(amount, sign)| sign.apply(amount))
    }
}

/// Input for creating a change order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewChangeOrder {
    /// Short title; must not be blank.
    pub title: String,
    /// Long description.
    #[serde(default)]
    pub description: String,
    /// Addition, deduction or no-cost.
    #[serde(rename = "type")]
    pub change_type: ChangeOrderType,
    /// Non-negative magnitude.
    pub amount: Decimal,
    /// Optional division tag.
    #[serde(default)]
    pub division_code: Option<String>,
    /// Optional reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Optional decision deadline.
    #[serde(default)]
    pub date_required: Option<NaiveDate>,
}

impl NewChangeOrder {
    /// Creates an input with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, change_type: ChangeOrderType, amount: Decimal) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            change_type,
            amount,
            division_code: None,
            reason: None,
            date_required: None,
        }
    }

    /// Tags the change with a division.
    #[must_use]
    pub fn division(mut self, code: impl Into<String>) -> Self {
        self.division_code = Some(code.into());
        self
    }

    /// Sets the reason.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the decision deadline.
    #[must_use]
    pub fn required_by(mut self, date: NaiveDate) -> Self {
        self.date_required = Some(date);
        self
    }
}

/// Edit of a draft change order.
///
/// For `division_code`, `reason` and `date_required`, an explicit `null`
/// clears the value while an absent field leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeOrderPatch {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New type.
    #[serde(default, rename = "type")]
    pub change_type: Option<ChangeOrderType>,
    /// New amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// New division tag.
    #[serde(default, deserialize_with = "present")]
    pub division_code: Option<Option<String>>,
    /// New reason.
    #[serde(default, deserialize_with = "present")]
    pub reason: Option<Option<String>>,
    /// New decision deadline.
    #[serde(default, deserialize_with = "present")]
    pub date_required: Option<Option<NaiveDate>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Change-order number format: prefix, dash, zero-padded sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numbering {
    prefix: String,
    width: usize,
}

impl Numbering {
    /// Creates a numbering scheme.
    #[must_use]
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    /// Formats a sequence number, e.g. `7` as `CO-007`.
    #[must_use]
    pub fn format(&self, sequence: u32) -> String {
        format!("{}-{:0width$}", self.prefix, sequence, width = self.width)
    }

    /// Parses a formatted number back into its sequence.
    ///
    /// Accepts numbers wider than the configured width (`CO-1000`).
    #[must_use]
    pub fn parse(&self, number: &str) -> Option<u32> {
        let digits = number
            .trim()
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl Default for Numbering {
    fn default() -> Self {
        Self::new("CO", 3)
    }
}
