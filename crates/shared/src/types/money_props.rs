//! Property-based tests for money rollups.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::money::{MoneyRollup, Sign};

/// Strategy to generate amounts in cents (-1,000,000.00 to 1,000,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn sign() -> impl Strategy<Value = Option<Sign>> {
    prop_oneof![Just(None), Just(Some(Sign::Positive)), Just(Some(Sign::Negative))]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Grouped totals always add back up to the ungrouped sum.
    #[test]
    fn prop_totals_by_partition_the_sum(
        records in prop::collection::vec((0u8..5, amount()), 0..50)
    ) {
        let total = MoneyRollup::sum(&records, |(_, a)| *a);
        let grouped = MoneyRollup::totals_by(&records, |(k, _)| *k, |(_, a)| *a);
        let regrouped: Decimal = grouped.values().copied().sum();
        prop_assert_eq!(total, regrouped);
    }

    /// Splitting a record set in two and summing the halves gives the same total.
    #[test]
    fn prop_sum_is_associative(
        records in prop::collection::vec(amount(), 0..50),
        split in 0usize..50,
    ) {
        let split = split.min(records.len());
        let (left, right) = records.split_at(split);
        let whole = MoneyRollup::sum(&records, |a| **a);
        let halves = MoneyRollup::sum(left, |a| **a) + MoneyRollup::sum(right, |a| **a);
        prop_assert_eq!(whole, halves);
    }

    /// Signed sum equals positives minus negatives, ignoring unsigned records.
    #[test]
    fn prop_signed_sum_matches_manual(
        records in prop::collection::vec((amount(), sign()), 0..50)
    ) {
        let signed = MoneyRollup::signed_sum(&records, |(a, s)| s.map(|s| (*a, s)));
        let positives: Decimal = records
            .iter()
            .filter(|(_, s)| *s == Some(Sign::Positive))
            .map(|(a, _)| *a)
            .sum();
        let negatives: Decimal = records
            .iter()
            .filter(|(_, s)| *s == Some(Sign::Negative))
            .map(|(a, _)| *a)
            .sum();
        prop_assert_eq!(signed, positives - negatives);
    }
}
