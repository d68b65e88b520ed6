//! Money rollups over decimal amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal`; floats are only accepted at the
//! boundary through [`amount_from_f64`], which rejects non-finite values.
//! Every stored amount must pass [`check_amount`]: at most
//! [`AMOUNT_SCALE`] decimal places and a magnitude below 10^15, the
//! range of a `NUMERIC(19, 4)` column.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimal places kept for stored amounts.
pub const AMOUNT_SCALE: u32 = 4;

/// Exclusive upper bound on the magnitude of an amount.
#[must_use]
pub fn amount_limit() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

/// Direction in which an amount contributes to a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    /// Amount is added to the total.
    Positive,
    /// Amount is subtracted from the total.
    Negative,
}

impl Sign {
    /// Applies the sign to a magnitude.
    #[must_use]
    pub fn apply(self, amount: Decimal) -> Decimal {
        match self {
            Self::Positive => amount,
            Self::Negative => -amount,
        }
    }
}

/// Errors raised when converting external input into money amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Value is NaN or infinite.
    #[error("{field} must be a finite number")]
    NonFinite {
        /// Name of the offending field.
        field: String,
    },

    /// Value is finite but outside the representable decimal range.
    #[error("{field} is out of range")]
    OutOfRange {
        /// Name of the offending field.
        field: String,
    },

    /// Value has more decimal places than storage keeps.
    #[error("{field} must have at most 4 decimal places")]
    TooPrecise {
        /// Name of the offending field.
        field: String,
    },

    /// Value could not be parsed as a decimal number.
    #[error("{field} is not a valid amount: {value}")]
    Unparseable {
        /// Name of the offending field.
        field: String,
        /// Raw input.
        value: String,
    },
}

impl MoneyError {
    /// Returns the field the error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::NonFinite { field }
            | Self::OutOfRange { field }
            | Self::TooPrecise { field }
            | Self::Unparseable { field, .. } => field,
        }
    }
}

/// Checks that an amount fits the stored money range.
///
/// Trailing zeros do not count towards the scale, so `1.50000` passes.
///
/// # Errors
///
/// Returns `MoneyError::OutOfRange` or `MoneyError::TooPrecise`.
pub fn check_amount(field: &str, amount: Decimal) -> Result<Decimal, MoneyError> {
    if amount.abs() >= amount_limit() {
        return Err(MoneyError::OutOfRange {
            field: field.to_string(),
        });
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(MoneyError::TooPrecise {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

/// Converts a float coming from a UI or import boundary into a decimal amount.
pub fn amount_from_f64(field: &str, value: f64) -> Result<Decimal, MoneyError> {
    if !value.is_finite() {
        return Err(MoneyError::NonFinite {
            field: field.to_string(),
        });
    }
    let amount = Decimal::from_f64(value).ok_or_else(|| MoneyError::OutOfRange {
        field: field.to_string(),
    })?;
    check_amount(field, amount)
}

/// Parses a decimal amount from text.
pub fn amount_from_str(field: &str, value: &str) -> Result<Decimal, MoneyError> {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if matches!(
        lowered.trim_start_matches(['+', '-']),
        "nan" | "inf" | "infinity"
    ) {
        return Err(MoneyError::NonFinite {
            field: field.to_string(),
        });
    }
    let amount = trimmed.parse::<Decimal>().map_err(|_| MoneyError::Unparseable {
        field: field.to_string(),
        value: value.to_string(),
    })?;
    check_amount(field, amount)
}

/// Stateless reducer summing money-bearing records.
///
/// The same reducer backs division sums, change-order sums and invoice
/// subtotals so that every total in the system is computed one way.
pub struct MoneyRollup;

impl MoneyRollup {
    /// Sums the amount returned by `amount` for every record.
    pub fn sum<T, I, F>(records: I, mut amount: F) -> Decimal
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Decimal,
    {
        records.into_iter().map(|record| amount(&record)).sum()
    }

    /// Sums signed contributions; records for which `entry` returns `None`
    /// are excluded.
    pub fn signed_sum<T, I, F>(records: I, mut entry: F) -> Decimal
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Option<(Decimal, Sign)>,
    {
        records
            .into_iter()
            .filter_map(|record| entry(&record))
            .map(|(amount, sign)| sign.apply(amount))
            .sum()
    }

    /// Groups records by `key` and sums each group's amounts.
    pub fn totals_by<T, K, I, KF, AF>(records: I, mut key: KF, mut amount: AF) -> BTreeMap<K, Decimal>
    where
        I: IntoIterator<Item = T>,
        K: Ord,
        KF: FnMut(&T) -> K,
        AF: FnMut(&T) -> Decimal,
    {
        let mut totals = BTreeMap::new();
        for record in records {
            *totals.entry(key(&record)).or_insert(Decimal::ZERO) += amount(&record);
        }
        totals
    }
}
