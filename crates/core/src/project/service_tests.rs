//! Service tests over the in-memory repository.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use chantier_shared::types::{BudgetLineId, ChangeOrderId, ProjectId};

use super::*;
use crate::budget::{BudgetLine, BudgetLinePatch, NewBudgetLine, RollupScope};
use crate::change_order::{
    ChangeOrder, ChangeOrderError, ChangeOrderStatus, ChangeOrderType, NewChangeOrder, Numbering,
};
use crate::division::DivisionTaxonomy;
use crate::repository::{
    BudgetLineRepository, ChangeOrderRepository, MemoryRepository, RepositoryError,
};

/// Repository that fails every write while `failing` is set.
#[derive(Default)]
struct FlakyRepository {
    inner: MemoryRepository,
    failing: AtomicBool,
}

impl FlakyRepository {
    fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RepositoryError::Database("connection reset".into()))
        } else {
            Ok(())
        }
    }
}

impl BudgetLineRepository for FlakyRepository {
    async fn create_line(&self, line: &BudgetLine) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.create_line(line).await
    }

    async fn update_line(&self, line: &BudgetLine) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.update_line(line).await
    }

    async fn delete_line(&self, id: BudgetLineId) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.delete_line(id).await
    }

    async fn list_lines(&self, project_id: ProjectId) -> Result<Vec<BudgetLine>, RepositoryError> {
        self.inner.list_lines(project_id).await
    }
}

impl ChangeOrderRepository for FlakyRepository {
    async fn create_change_order(&self, order: &ChangeOrder) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.create_change_order(order).await
    }

    async fn update_change_order(&self, order: &ChangeOrder) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.update_change_order(order).await
    }

    async fn delete_change_order(&self, id: ChangeOrderId) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.delete_change_order(id).await
    }

    async fn list_change_orders(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ChangeOrder>, RepositoryError> {
        self.inner.list_change_orders(project_id).await
    }

    async fn last_sequence(&self, project_id: ProjectId) -> Result<u32, RepositoryError> {
        self.inner.last_sequence(project_id).await
    }

    async fn persist_approval(
        &self,
        order: &ChangeOrder,
        adjustment: Option<&BudgetLine>,
    ) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.persist_approval(order, adjustment).await
    }
}

async fn service<R>(repo: &Arc<R>, project_id: ProjectId) -> ProjectBudgetService<R>
where
    R: BudgetLineRepository + ChangeOrderRepository,
{
    ProjectBudgetService::load(
        Arc::clone(repo),
        project_id,
        Arc::new(DivisionTaxonomy::masterformat()),
        Numbering::default(),
        Decimal::ZERO,
    )
    .await
    .unwrap()
}

async fn submitted<R>(service: &mut ProjectBudgetService<R>, input: NewChangeOrder) -> ChangeOrderId
where
    R: BudgetLineRepository + ChangeOrderRepository,
{
    let id = service.create_change_order(input).await.unwrap().id;
    service.submit(id).await.unwrap();
    id
}

#[tokio::test]
async fn test_state_survives_reload() {
    let repo = Arc::new(MemoryRepository::new());
    let project_id = ProjectId::new();

    let mut first = service(&repo, project_id).await;
    let line_id = first
        .add_line(NewBudgetLine::new("03", "Concrete", dec!(100000)))
        .await
        .unwrap()
        .id;
    first
        .update_line(line_id, &BudgetLinePatch::default().actual(dec!(1000)))
        .await
        .unwrap();
    let id = submitted(
        &mut first,
        NewChangeOrder::new("Extra footing", ChangeOrderType::Addition, dec!(25000)).division("03"),
    )
    .await;
    first.approve(id).await.unwrap();
    let scrapped = first
        .create_change_order(NewChangeOrder::new("Scrapped", ChangeOrderType::Addition, dec!(1)))
        .await
        .unwrap()
        .id;
    first.delete_change_order(scrapped).await.unwrap();

    let mut second = service(&repo, project_id).await;

    assert_eq!(second.ledger().len(), 2);
    assert_eq!(second.rollup_project(), first.rollup_project());
    assert_eq!(second.project_rollup(), first.project_rollup());
    assert_eq!(second.project_rollup().budget_revised, dec!(125000));
    let next = second
        .create_change_order(NewChangeOrder::new("Next", ChangeOrderType::NoCost, dec!(0)))
        .await
        .unwrap();
    assert_eq!(next.number, "CO-003");
}

#[tokio::test]
async fn test_failed_write_changes_nothing() {
    let repo = Arc::new(FlakyRepository::default());
    let project_id = ProjectId::new();
    let mut service = service(&repo, project_id).await;
    let line_id = service
        .add_line(NewBudgetLine::new("03", "Concrete", dec!(100000)))
        .await
        .unwrap()
        .id;
    let id = submitted(
        &mut service,
        NewChangeOrder::new("Extra footing", ChangeOrderType::Addition, dec!(25000)).division("03"),
    )
    .await;
    let divisions = service.rollup_by_division(RollupScope::Used);
    let rollup = service.project_rollup();

    repo.fail_writes(true);
    let err = service.approve(id).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(service.add_line(NewBudgetLine::new("09", "", dec!(1))).await.is_err());
    assert!(
        service
            .update_line(line_id, &BudgetLinePatch::default().forecast(dec!(1)))
            .await
            .is_err()
    );
    assert!(service.remove_line(line_id).await.is_err());

    assert_eq!(
        service.register().get(id).unwrap().status,
        ChangeOrderStatus::Submitted
    );
    assert_eq!(service.rollup_by_division(RollupScope::Used), divisions);
    assert_eq!(service.project_rollup(), rollup);

    repo.fail_writes(false);
    let reloaded = self::service(&repo, project_id).await;
    assert_eq!(reloaded.ledger().len(), 1);
    assert_eq!(
        reloaded.register().get(id).unwrap().status,
        ChangeOrderStatus::Submitted
    );

    service.approve(id).await.unwrap();
    assert_eq!(service.project_rollup().budget_revised, dec!(125000));
}

/// Scenario D through the service: nothing is written.
#[tokio::test]
async fn test_approve_draft_fails_without_write() {
    let repo = Arc::new(MemoryRepository::new());
    let project_id = ProjectId::new();
    let mut service = service(&repo, project_id).await;
    let id = service
        .create_change_order(
            NewChangeOrder::new("Early", ChangeOrderType::Addition, dec!(5000)).division("03"),
        )
        .await
        .unwrap()
        .id;

    let err = service.approve(id).await.unwrap_err();

    assert_eq!(
        err,
        ProjectError::ChangeOrder(ChangeOrderError::InvalidTransition {
            from: ChangeOrderStatus::Draft,
            to: ChangeOrderStatus::Approved,
        })
    );
    assert_eq!(err.error_code(), "INVALID_TRANSITION");
    assert!(repo.list_lines(project_id).await.unwrap().is_empty());
    assert_eq!(service.project_rollup().additions_approved, Decimal::ZERO);
}

#[tokio::test]
async fn test_adjustment_line_persisted_with_approval() {
    let repo = Arc::new(MemoryRepository::new());
    let project_id = ProjectId::new();
    let mut service = service(&repo, project_id).await;
    let id = submitted(
        &mut service,
        NewChangeOrder::new("Credit", ChangeOrderType::Deduction, dec!(800)).division("09 91 23"),
    )
    .await;

    let order = service.approve(id).await.unwrap().clone();

    assert!(order.date_approved.is_some());
    let stored = repo.list_lines(project_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].budget_changes, dec!(-800));
    let stored_order = &repo.list_change_orders(project_id).await.unwrap()[0];
    assert_eq!(stored_order, &order);
}

#[tokio::test]
async fn test_reject_void_and_edit() {
    let repo = Arc::new(MemoryRepository::new());
    let mut service = service(&repo, ProjectId::new()).await;

    let draft = service
        .create_change_order(NewChangeOrder::new("Draft", ChangeOrderType::Addition, dec!(10)))
        .await
        .unwrap()
        .id;
    let patch = crate::change_order::ChangeOrderPatch {
        amount: Some(dec!(12)),
        ..Default::default()
    };
    assert_eq!(
        service.update_change_order(draft, patch).await.unwrap().amount,
        dec!(12)
    );
    service.void(draft).await.unwrap();

    let refused = submitted(
        &mut service,
        NewChangeOrder::new("Refused", ChangeOrderType::Addition, dec!(10)),
    )
    .await;
    service.reject(refused).await.unwrap();

    let statuses: Vec<ChangeOrderStatus> = service
        .register()
        .orders()
        .into_iter()
        .map(|o| o.status)
        .collect();
    assert_eq!(
        statuses,
        vec![ChangeOrderStatus::Void, ChangeOrderStatus::Rejected]
    );
    assert_eq!(service.project_rollup().pending_amount, Decimal::ZERO);
}

#[tokio::test]
async fn test_empty_patch_is_noop() {
    let repo = Arc::new(FlakyRepository::default());
    let mut service = service(&repo, ProjectId::new()).await;
    let line = service
        .add_line(NewBudgetLine::new("03", "", dec!(10)))
        .await
        .unwrap()
        .clone();

    repo.fail_writes(true);
    let unchanged = service
        .update_line(line.id, &BudgetLinePatch::default())
        .await
        .unwrap();

    assert_eq!(unchanged, &line);
}
