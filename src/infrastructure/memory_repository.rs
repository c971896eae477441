// In-process dashboard repository
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::{Dashboard, DashboardContent, DashboardId, NewDashboard};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keeps dashboards in memory, in creation order. Used when no remote backend is
/// configured and as the persistence double in tests.
#[derive(Debug, Default)]
pub struct InMemoryDashboardRepository {
    state: Mutex<State>,
    updates: AtomicUsize,
}

#[derive(Debug, Default)]
struct State {
    next_seq: u64,
    dashboards: BTreeMap<u64, Dashboard>,
    fail_next_update: Option<String>,
}

impl State {
    fn find_mut(&mut self, id: &DashboardId) -> Option<&mut Dashboard> {
        self.dashboards.values_mut().find(|d| &d.id == id)
    }

    fn insert(&mut self, dashboard: Dashboard) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.dashboards.insert(seq, dashboard);
    }
}

impl InMemoryDashboardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("in-memory dashboard state is poisoned"))
    }

    /// Insert a dashboard directly, bypassing `create_dashboard`.
    pub fn seed(&self, name: &str, content: DashboardContent) -> DashboardId {
        let dashboard = Dashboard::new(DashboardId::generate(), name.to_string(), content);
        let id = dashboard.id.clone();
        if let Ok(mut state) = self.lock() {
            state.insert(dashboard);
        }
        id
    }

    /// Make the next `update_dashboard` call fail with the given message.
    pub fn fail_next_update(&self, message: &str) {
        if let Ok(mut state) = self.lock() {
            state.fail_next_update = Some(message.to_string());
        }
    }

    /// Number of successful `update_dashboard` calls.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DashboardRepository for InMemoryDashboardRepository {
    async fn load_dashboards(&self) -> Result<Vec<Dashboard>> {
        Ok(self.lock()?.dashboards.values().cloned().collect())
    }

    async fn create_dashboard(&self, new_dashboard: NewDashboard) -> Result<Dashboard> {
        let mut dashboard = Dashboard::new(
            DashboardId::generate(),
            new_dashboard.name,
            DashboardContent {
                widgets: new_dashboard.widgets,
                layout: Vec::new(),
            },
        );
        dashboard.updated_at = Some(Utc::now());
        self.lock()?.insert(dashboard.clone());
        Ok(dashboard)
    }

    async fn update_dashboard(&self, id: &DashboardId, content: DashboardContent) -> Result<Dashboard> {
        let mut state = self.lock()?;
        if let Some(message) = state.fail_next_update.take() {
            anyhow::bail!("update of dashboard {} failed: {}", id, message);
        }

        let dashboard = state
            .find_mut(id)
            .ok_or_else(|| anyhow!("dashboard {} does not exist", id))?;
        dashboard.content = content;
        dashboard.updated_at = Some(Utc::now());
        let stored = dashboard.clone();
        drop(state);

        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn rename_dashboard(&self, id: &DashboardId, name: &str) -> Result<()> {
        let mut state = self.lock()?;
        let dashboard = state
            .find_mut(id)
            .ok_or_else(|| anyhow!("dashboard {} does not exist", id))?;
        dashboard.name = name.to_string();
        dashboard.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_dashboard(&self, id: &DashboardId) -> Result<()> {
        let mut state = self.lock()?;
        let before = state.dashboards.len();
        state.dashboards.retain(|_, d| &d.id != id);
        if state.dashboards.len() == before {
            anyhow::bail!("dashboard {} does not exist", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_preserves_creation_order() {
        let repo = InMemoryDashboardRepository::new();
        for name in ["first", "second", "third"] {
            repo.create_dashboard(NewDashboard {
                name: name.to_string(),
                widgets: vec![],
            })
            .await
            .unwrap();
        }
        let names: Vec<_> = repo
            .load_dashboards()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let repo = InMemoryDashboardRepository::new();
        let id = repo.seed("Ops", DashboardContent::default());

        repo.fail_next_update("timeout");
        let err = repo
            .update_dashboard(&id, DashboardContent::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
        assert_eq!(repo.update_count(), 0);

        repo.update_dashboard(&id, DashboardContent::default())
            .await
            .unwrap();
        assert_eq!(repo.update_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_errors() {
        let repo = InMemoryDashboardRepository::new();
        let missing = DashboardId::from("missing");
        assert!(repo.rename_dashboard(&missing, "x").await.is_err());
        assert!(repo.delete_dashboard(&missing).await.is_err());
    }
}
