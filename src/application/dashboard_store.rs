// Dashboard store - committed dashboards and the bridge to persistence
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::error::{PersistenceError, StoreError};
use crate::domain::dashboard::{Dashboard, DashboardId, NewDashboard};
use crate::domain::template::TemplateCatalog;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct DashboardStore {
    repository: Arc<dyn DashboardRepository>,
    templates: TemplateCatalog,
    dashboards: BTreeMap<DashboardId, Dashboard>,
}

impl DashboardStore {
    pub fn new(repository: Arc<dyn DashboardRepository>, templates: TemplateCatalog) -> Self {
        Self {
            repository,
            templates,
            dashboards: BTreeMap::new(),
        }
    }

    pub fn repository(&self) -> Arc<dyn DashboardRepository> {
        self.repository.clone()
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    /// Replace the in-memory collection with what persistence holds.
    pub async fn load(&mut self) -> Result<usize, StoreError> {
        let dashboards = self
            .repository
            .load_dashboards()
            .await
            .map_err(PersistenceError::from)?;

        self.dashboards = dashboards.into_iter().map(|d| (d.id.clone(), d)).collect();
        tracing::info!("Loaded {} dashboards", self.dashboards.len());
        Ok(self.dashboards.len())
    }

    pub fn get(&self, id: &DashboardId) -> Option<&Dashboard> {
        self.dashboards.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &Dashboard> {
        self.dashboards.values()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.dashboards.len()
    }

    /// Create a dashboard, optionally pre-populated from a named template.
    pub async fn create(&mut self, name: &str, template: Option<&str>) -> Result<DashboardId, StoreError> {
        let name = validate_name(name)?;
        let widgets = match template {
            Some(template_name) => self
                .templates
                .get(template_name)
                .ok_or_else(|| StoreError::UnknownTemplate(template_name.to_string()))?
                .instantiate(),
            None => Vec::new(),
        };

        let dashboard = self
            .repository
            .create_dashboard(NewDashboard { name, widgets })
            .await
            .map_err(PersistenceError::from)?;

        tracing::info!(
            "Created dashboard {} '{}' with {} widgets",
            dashboard.id,
            dashboard.name,
            dashboard.content.widgets.len()
        );
        let id = dashboard.id.clone();
        self.dashboards.insert(id.clone(), dashboard);
        Ok(id)
    }

    pub async fn rename(&mut self, id: &DashboardId, name: &str) -> Result<(), StoreError> {
        let name = validate_name(name)?;
        if !self.dashboards.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }

        self.repository
            .rename_dashboard(id, &name)
            .await
            .map_err(PersistenceError::from)?;

        if let Some(dashboard) = self.dashboards.get_mut(id) {
            tracing::info!("Renamed dashboard {} to '{}'", id, name);
            dashboard.name = name;
        }
        Ok(())
    }

    /// Delete a dashboard. The last remaining dashboard cannot be deleted.
    pub async fn delete(&mut self, id: &DashboardId) -> Result<(), StoreError> {
        if !self.dashboards.contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        if self.dashboards.len() <= 1 {
            return Err(StoreError::LastDashboard);
        }

        self.repository
            .delete_dashboard(id)
            .await
            .map_err(PersistenceError::from)?;

        self.dashboards.remove(id);
        tracing::info!("Deleted dashboard {}", id);
        Ok(())
    }

    /// Atomically replace a committed dashboard with what persistence accepted.
    pub fn commit(&mut self, dashboard: Dashboard) {
        self.dashboards.insert(dashboard.id.clone(), dashboard);
    }
}

fn validate_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(StoreError::EmptyName)
    } else {
        Ok(trimmed.to_string())
    }
}
