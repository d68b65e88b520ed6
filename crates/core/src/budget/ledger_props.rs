//! Property-based tests for the budget ledger.
//!
//! - Rollup associativity: the project rollup equals the sum of all lines
//! - Derived-field consistency after any sequence of edits

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use chantier_shared::types::{ChangeOrderId, MoneyRollup, ProjectId};

use super::ledger::BudgetLedger;
use super::types::{ApprovedChange, BudgetLinePatch, BudgetTotals, NewBudgetLine, RollupScope};
use crate::division::DivisionTaxonomy;

/// Strategy for amounts from 0.00 to 1,000,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for division codes across a handful of groups and sub-codes.
fn division_code() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("03".to_string()),
        Just("03 30 00".to_string()),
        Just("09".to_string()),
        Just("09 91 23".to_string()),
        Just("26 05 19".to_string()),
        Just("31".to_string()),
    ]
}

/// Strategy for an optional spend patch.
fn patch() -> impl Strategy<Value = BudgetLinePatch> {
    (
        proptest::option::of(amount()),
        proptest::option::of(amount()),
        proptest::option::of(amount()),
    )
        .prop_map(|(committed, actual, forecast)| {
            let mut patch = BudgetLinePatch::default();
            if let Some(v) = committed {
                patch = patch.committed(v);
            }
            if let Some(v) = actual {
                patch = patch.actual(v);
            }
            if let Some(v) = forecast {
                patch = patch.forecast(v);
            }
            patch
        })
}

fn build(
    lines: Vec<(String, Decimal, BudgetLinePatch)>,
    changes: Vec<(String, Decimal)>,
) -> BudgetLedger {
    let mut ledger = BudgetLedger::new(ProjectId::new(), Arc::new(DivisionTaxonomy::masterformat()));
    for (code, original, patch) in lines {
        let id = ledger
            .add_line(NewBudgetLine::new(code, "", original))
            .unwrap()
            .id;
        ledger.update_line(id, &patch).unwrap();
    }
    for (code, signed_amount) in changes {
        ledger
            .apply_approved_change(&ApprovedChange {
                change_order_id: ChangeOrderId::new(),
                number: "CO-001".to_string(),
                division_code: Some(code),
                signed_amount,
            })
            .unwrap();
    }
    ledger
}

fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    /// The project rollup equals both the sum of division rollups and the
    /// direct sum of all lines.
    #[test]
    fn prop_rollup_associativity(
        lines in prop::collection::vec((division_code(), amount(), patch()), 0..20),
        changes in prop::collection::vec((division_code(), signed_amount()), 0..5),
    ) {
        let ledger = build(lines, changes);

        let project = ledger.rollup_project();
        let direct = BudgetTotals::of_lines(ledger.lines());

        prop_assert_eq!(project, direct);
        prop_assert_eq!(
            project.variance,
            MoneyRollup::sum(ledger.lines(), |l| l.variance)
        );

        let divisions = ledger.rollup_by_division(RollupScope::All);
        let line_count: usize = divisions.iter().map(|r| r.line_count).sum();
        prop_assert_eq!(line_count, ledger.len());
        prop_assert_eq!(BudgetTotals::combine(divisions.iter().map(|r| &r.totals)), project);
    }

    /// Every line satisfies the derived-field formulas after edits.
    #[test]
    fn prop_derived_fields_consistent(
        lines in prop::collection::vec((division_code(), amount(), patch()), 1..20),
        changes in prop::collection::vec((division_code(), signed_amount()), 0..5),
    ) {
        let ledger = build(lines, changes);

        for line in ledger.lines() {
            prop_assert!(line.is_consistent());
        }
        let totals = ledger.rollup_project();
        prop_assert_eq!(totals.budget_current, totals.budget_approved + totals.budget_changes);
        prop_assert_eq!(totals.variance, totals.budget_current - totals.forecast);
    }
}
