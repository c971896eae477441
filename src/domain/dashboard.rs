// Dashboard domain model
use super::layout::LayoutEntry;
use super::widget::{WidgetId, WidgetInstance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardId(String);

impl DashboardId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DashboardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DashboardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for DashboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Widgets and layout of a dashboard; the unit that gets committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardContent {
    pub widgets: Vec<WidgetInstance>,
    pub layout: Vec<LayoutEntry>,
}

impl DashboardContent {
    pub fn widget_ids(&self) -> BTreeSet<&WidgetId> {
        self.widgets.iter().map(|w| &w.id).collect()
    }

    pub fn layout_ids(&self) -> BTreeSet<&WidgetId> {
        self.layout.iter().map(|l| &l.widget_id).collect()
    }

    /// True when every widget has exactly one layout entry and every entry has a widget.
    pub fn is_reconciled(&self) -> bool {
        self.widgets.len() == self.layout.len() && self.widget_ids() == self.layout_ids()
    }

    pub fn widget(&self, id: &WidgetId) -> Option<&WidgetInstance> {
        self.widgets.iter().find(|w| &w.id == id)
    }

    pub fn layout_for(&self, id: &WidgetId) -> Option<&LayoutEntry> {
        self.layout.iter().find(|l| &l.widget_id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: DashboardId,
    pub name: String,
    #[serde(flatten)]
    pub content: DashboardContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Dashboard {
    pub fn new(id: DashboardId, name: String, content: DashboardContent) -> Self {
        Self {
            id,
            name,
            content,
            updated_at: None,
        }
    }
}

/// What the persistence collaborator needs to create a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDashboard {
    pub name: String,
    pub widgets: Vec<WidgetInstance>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::GridSize;
    use crate::domain::widget::WidgetType;

    #[test]
    fn test_reconciled_requires_bijection() {
        let a = WidgetId::from("a");
        let mut content = DashboardContent {
            widgets: vec![WidgetInstance::new(a.clone(), WidgetType::Metric)],
            layout: vec![],
        };
        assert!(!content.is_reconciled());

        content
            .layout
            .push(LayoutEntry::new(a.clone(), 0, 0, GridSize::new(4, 3)));
        assert!(content.is_reconciled());

        content
            .layout
            .push(LayoutEntry::new(a, 0, 3, GridSize::new(4, 3)));
        assert!(!content.is_reconciled());
    }

    #[test]
    fn test_dashboard_json_flattens_content() {
        let dashboard = Dashboard::new(
            DashboardId::from("d1"),
            "Ops".to_string(),
            DashboardContent::default(),
        );
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "d1", "name": "Ops", "widgets": [], "layout": []})
        );
        let back: Dashboard = serde_json::from_value(json).unwrap();
        assert_eq!(back, dashboard);
    }
}
