//! Two-tax calculator for invoices and quotes.
//!
//! Federal and provincial taxes are both applied to the same subtotal
//! (no tax-on-tax), then rounded to the cent.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::money::MoneyRollup;

/// Number of decimal places kept on tax amounts.
const CENT_SCALE: u32 = 2;

/// Federal and provincial tax rates, expressed as percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxRates {
    /// Federal rate in percent (GST).
    pub federal: Decimal,
    /// Provincial rate in percent (QST).
    pub provincial: Decimal,
}

/// Result of applying [`TaxRates`] to a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Pre-tax amount.
    pub subtotal: Decimal,
    /// Federal tax amount.
    pub federal_tax: Decimal,
    /// Provincial tax amount.
    pub provincial_tax: Decimal,
    /// Subtotal plus both taxes.
    pub total: Decimal,
}

impl TaxRates {
    /// Quebec rates: GST 5 %, QST 9.975 %.
    #[must_use]
    pub fn quebec() -> Self {
        Self {
            federal: Decimal::new(5, 0),
            provincial: Decimal::new(9975, 3),
        }
    }

    /// Applies both rates to `subtotal`.
    #[must_use]
    pub fn apply(&self, subtotal: Decimal) -> TaxBreakdown {
        let federal_tax = Self::tax_on(subtotal, self.federal);
        let provincial_tax = Self::tax_on(subtotal, self.provincial);

        TaxBreakdown {
            subtotal,
            federal_tax,
            provincial_tax,
            total: subtotal + federal_tax + provincial_tax,
        }
    }

    /// Sums invoice items with [`MoneyRollup`] and applies both rates.
    pub fn apply_to_items<T, I, F>(&self, items: I, amount: F) -> TaxBreakdown
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Decimal,
    {
        self.apply(MoneyRollup::sum(items, amount))
    }

    fn tax_on(subtotal: Decimal, rate_percent: Decimal) -> Decimal {
        (subtotal * rate_percent / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Default for TaxRates {
    fn default() -> Self {
        Self::quebec()
    }
}
