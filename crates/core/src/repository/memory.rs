//! In-memory repository.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chantier_shared::types::{BudgetLineId, ChangeOrderId, ProjectId};

use super::{BudgetLineRepository, ChangeOrderRepository, RepositoryError};
use crate::budget::BudgetLine;
use crate::change_order::ChangeOrder;

#[derive(Debug, Default)]
struct State {
    lines: HashMap<BudgetLineId, BudgetLine>,
    orders: HashMap<ChangeOrderId, ChangeOrder>,
    sequences: HashMap<ProjectId, u32>,
}

/// Repository keeping every record in process memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Database("memory repository lock poisoned".into()))
    }
}

fn insert_new<K, V>(map: &mut HashMap<K, V>, key: K, value: V) -> Result<(), RepositoryError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    if map.contains_key(&key) {
        return Err(RepositoryError::Conflict(format!("{key} already exists")));
    }
    map.insert(key, value);
    Ok(())
}

fn replace<K, V>(map: &mut HashMap<K, V>, key: K, value: V) -> Result<(), RepositoryError>
where
    K: std::hash::Hash + Eq + std::fmt::Display,
{
    match map.get_mut(&key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(RepositoryError::NotFound(key.to_string())),
    }
}

impl BudgetLineRepository for MemoryRepository {
    async fn create_line(&self, line: &BudgetLine) -> Result<(), RepositoryError> {
        insert_new(&mut self.state()?.lines, line.id, line.clone())
    }

    async fn update_line(&self, line: &BudgetLine) -> Result<(), RepositoryError> {
        replace(&mut self.state()?.lines, line.id, line.clone())
    }

    async fn delete_line(&self, id: BudgetLineId) -> Result<(), RepositoryError> {
        self.state()?
            .lines
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list_lines(&self, project_id: ProjectId) -> Result<Vec<BudgetLine>, RepositoryError> {
        let state = self.state()?;
        let mut lines: Vec<BudgetLine> = state
            .lines
            .values()
            .filter(|l| l.project_id == project_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.id);
        Ok(lines)
    }
}

impl ChangeOrderRepository for MemoryRepository {
    async fn create_change_order(&self, order: &ChangeOrder) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        insert_new(&mut state.orders, order.id, order.clone())?;
        let last = state.sequences.entry(order.project_id).or_insert(0);
        *last = (*last).max(order.sequence);
        Ok(())
    }

    async fn update_change_order(&self, order: &ChangeOrder) -> Result<(), RepositoryError> {
        replace(&mut self.state()?.orders, order.id, order.clone())
    }

    async fn delete_change_order(&self, id: ChangeOrderId) -> Result<(), RepositoryError> {
        self.state()?
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn list_change_orders(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ChangeOrder>, RepositoryError> {
        let state = self.state()?;
        let mut orders: Vec<ChangeOrder> = state
            .orders
            .values()
            .filter(|o| o.project_id == project_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.sequence);
        Ok(orders)
    }

    async fn last_sequence(&self, project_id: ProjectId) -> Result<u32, RepositoryError> {
        Ok(self
            .state()?
            .sequences
            .get(&project_id)
            .copied()
            .unwrap_or_default())
    }

    async fn persist_approval(
        &self,
        order: &ChangeOrder,
        adjustment: Option<&BudgetLine>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if !state.orders.contains_key(&order.id) {
            return Err(RepositoryError::NotFound(order.id.to_string()));
        }
        if let Some(line) = adjustment {
            insert_new(&mut state.lines, line.id, line.clone())?;
        }
        state.orders.insert(order.id, order.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::budget::BudgetLineSource;
    use crate::change_order::{ChangeOrderStatus, ChangeOrderType};

    fn sample_line(project_id: ProjectId) -> BudgetLine {
        let now = Utc::now();
        BudgetLine {
            id: BudgetLineId::new(),
            project_id,
            division_code: "03".into(),
            description: String::new(),
            source: BudgetLineSource::Manual,
            budget_original: dec!(100),
            budget_approved: dec!(100),
            budget_changes: Decimal::ZERO,
            budget_current: dec!(100),
            committed: Decimal::ZERO,
            actual: Decimal::ZERO,
            forecast: dec!(100),
            variance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_order(project_id: ProjectId, sequence: u32) -> ChangeOrder {
        let now = Utc::now();
        ChangeOrder {
            id: ChangeOrderId::new(),
            project_id,
            sequence,
            number: format!("CO-{sequence:03}"),
            title: "Change".into(),
            description: String::new(),
            change_type: ChangeOrderType::Addition,
            amount: dec!(10),
            status: ChangeOrderStatus::Draft,
            division_code: None,
            reason: None,
            date_requested: now.date_naive(),
            date_approved: None,
            date_required: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_line_crud() {
        let repo = MemoryRepository::new();
        let project_id = ProjectId::new();
        let mut line = sample_line(project_id);
        repo.create_line(&line).await.unwrap();
        repo.create_line(&sample_line(ProjectId::new()))
            .await
            .unwrap();

        assert!(matches!(
            repo.create_line(&line).await,
            Err(RepositoryError::Conflict(_))
        ));

        line.actual = dec!(40);
        repo.update_line(&line).await.unwrap();
        assert_eq!(repo.list_lines(project_id).await.unwrap(), vec![line.clone()]);

        repo.delete_line(line.id).await.unwrap();
        assert!(repo.list_lines(project_id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_line(line.id).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(
            repo.update_line(&line).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sequence_survives_delete() {
        let repo = MemoryRepository::new();
        let project_id = ProjectId::new();
        assert_eq!(repo.last_sequence(project_id).await.unwrap(), 0);

        let first = sample_order(project_id, 1);
        repo.create_change_order(&first).await.unwrap();
        repo.create_change_order(&sample_order(project_id, 2)).await.unwrap();
        repo.delete_change_order(first.id).await.unwrap();

        assert_eq!(repo.last_sequence(project_id).await.unwrap(), 2);
        assert_eq!(repo.list_change_orders(project_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_approval_writes_both() {
        let repo = MemoryRepository::new();
        let project_id = ProjectId::new();
        let mut order = sample_order(project_id, 1);
        repo.create_change_order(&order).await.unwrap();

        order.status = ChangeOrderStatus::Approved;
        let adjustment = sample_line(project_id);
        repo.persist_approval(&order, Some(&adjustment)).await.unwrap();

        assert_eq!(
            repo.list_change_orders(project_id).await.unwrap()[0].status,
            ChangeOrderStatus::Approved
        );
        assert_eq!(repo.list_lines(project_id).await.unwrap(), vec![adjustment]);
    }

    #[tokio::test]
    async fn test_persist_approval_unknown_order_writes_nothing() {
        let repo = MemoryRepository::new();
        let project_id = ProjectId::new();
        let adjustment = sample_line(project_id);

        let result = repo
            .persist_approval(&sample_order(project_id, 1), Some(&adjustment))
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
        assert!(repo.list_lines(project_id).await.unwrap().is_empty());
    }
}
