//! Property-based tests for the change-order register.
//!
//! - Sequential numbering survives deletions
//! - No-cost orders never move a rollup
//! - A second approval fails and leaves every rollup unchanged

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use chantier_shared::types::ProjectId;

use super::register::ChangeOrderRegister;
use super::types::{ChangeOrderStatus, ChangeOrderType, NewChangeOrder, Numbering};
use crate::budget::{BudgetLedger, RollupScope};
use crate::division::DivisionTaxonomy;

/// Strategy to generate amounts (0.00 to 100,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn change_type() -> impl Strategy<Value = ChangeOrderType> {
    prop_oneof![
        Just(ChangeOrderType::Addition),
        Just(ChangeOrderType::Deduction),
        Just(ChangeOrderType::NoCost),
    ]
}

fn setup() -> (ChangeOrderRegister, BudgetLedger) {
    let project_id = ProjectId::new();
    let taxonomy = Arc::new(DivisionTaxonomy::masterformat());
    (
        ChangeOrderRegister::new(project_id, Arc::clone(&taxonomy), Numbering::default()),
        BudgetLedger::new(project_id, taxonomy),
    )
}

proptest! {
    /// Numbers are assigned 1, 2, 3, ... and never handed out twice, even
    /// when orders are deleted in between.
    #[test]
    fn prop_sequential_numbering_across_deletions(
        steps in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let (mut register, _) = setup();
        let mut issued = BTreeSet::new();

        for (i, delete_latest) in steps.into_iter().enumerate() {
            let order = register
                .create(NewChangeOrder::new("Change", ChangeOrderType::Addition, Decimal::ONE))
                .unwrap()
                .clone();
            let expected = u32::try_from(i + 1).unwrap();
            prop_assert_eq!(order.sequence, expected);
            prop_assert_eq!(&order.number, &Numbering::default().format(expected));
            prop_assert!(issued.insert(order.number));
            if delete_latest {
                register.delete(order.id).unwrap();
            }
        }
    }

    /// No-cost orders contribute zero whatever their stored amount.
    #[test]
    fn prop_no_cost_neutrality(
        orders in prop::collection::vec((change_type(), amount(), any::<bool>()), 0..20),
        no_cost_amount in amount(),
    ) {
        let (mut register, mut ledger) = setup();
        for (change_type, amount, approve) in orders {
            let id = register
                .create(NewChangeOrder::new("Change", change_type, amount).division("03"))
                .unwrap()
                .id;
            register.submit(id).unwrap();
            if approve {
                register.approve(id, &mut ledger).unwrap();
            }
        }
        let pending = register.rollup_pending();
        let approved = register.rollup_approved();
        let budget = ledger.rollup_project();

        let pending_id = register
            .create(NewChangeOrder::new("Resequence", ChangeOrderType::NoCost, no_cost_amount).division("03"))
            .unwrap()
            .id;
        register.submit(pending_id).unwrap();
        let approved_id = register
            .create(NewChangeOrder::new("Reroute", ChangeOrderType::NoCost, no_cost_amount).division("09"))
            .unwrap()
            .id;
        register.submit(approved_id).unwrap();
        register.approve(approved_id, &mut ledger).unwrap();

        prop_assert_eq!(register.rollup_pending(), pending);
        prop_assert_eq!(register.rollup_approved(), approved);
        prop_assert_eq!(ledger.rollup_project(), budget);
    }

    /// Approving twice fails and leaves the budget bit-for-bit unchanged.
    #[test]
    fn prop_approval_idempotence(
        change_type in change_type(),
        amount in amount(),
    ) {
        let (mut register, mut ledger) = setup();
        let id = register
            .create(NewChangeOrder::new("Change", change_type, amount).division("26 05 19"))
            .unwrap()
            .id;
        register.submit(id).unwrap();
        register.approve(id, &mut ledger).unwrap();

        let divisions = ledger.rollup_by_division(RollupScope::All);
        let approved = register.rollup_approved();

        prop_assert!(register.approve(id, &mut ledger).is_err());
        prop_assert_eq!(register.get(id).unwrap().status, ChangeOrderStatus::Approved);
        prop_assert_eq!(ledger.rollup_by_division(RollupScope::All), divisions);
        prop_assert_eq!(register.rollup_approved(), approved);
    }
}
