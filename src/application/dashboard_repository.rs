// Repository trait for dashboard persistence
use crate::domain::dashboard::{Dashboard, DashboardContent, DashboardId, NewDashboard};
use async_trait::async_trait;

/// The persistence collaborator. Writes are last-write-wins: no version check is made.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Load every dashboard the user owns
    async fn load_dashboards(&self) -> anyhow::Result<Vec<Dashboard>>;

    /// Create a dashboard; the repository assigns its id
    async fn create_dashboard(&self, new_dashboard: NewDashboard) -> anyhow::Result<Dashboard>;

    /// Replace a dashboard's widgets and layout, returning the stored dashboard
    async fn update_dashboard(
        &self,
        id: &DashboardId,
        content: DashboardContent,
    ) -> anyhow::Result<Dashboard>;

    async fn rename_dashboard(&self, id: &DashboardId, name: &str) -> anyhow::Result<()>;

    async fn delete_dashboard(&self, id: &DashboardId) -> anyhow::Result<()>;
}
