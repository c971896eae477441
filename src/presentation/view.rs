// Summary renderer - JSON view model of a rendered dashboard
use crate::application::rendering::{WidgetRenderer, render_dashboard};
use crate::domain::dashboard::DashboardContent;
use crate::domain::layout::LayoutEntry;
use crate::domain::registry::{WidgetDefinition, WidgetRegistry};
use crate::domain::widget_config::{
    ActionsConfig, ActivityConfig, ChartConfig, EntitySelection, MetricConfig, TableConfig,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSummary {
    pub title: String,
    pub detail: String,
    pub configured: bool,
    /// Whether the client should offer reconfigure/remove controls.
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView {
    #[serde(flatten)]
    pub position: LayoutEntry,
    #[serde(flatten)]
    pub summary: WidgetSummary,
}

pub struct SummaryRenderer;

impl SummaryRenderer {
    fn summary(title: String, detail: String, edit_mode: bool) -> WidgetSummary {
        WidgetSummary {
            title,
            detail,
            configured: true,
            editable: edit_mode,
        }
    }
}

impl WidgetRenderer for SummaryRenderer {
    type Output = WidgetSummary;

    fn unconfigured(&self, definition: &WidgetDefinition, edit_mode: bool) -> WidgetSummary {
        WidgetSummary {
            title: definition.display_name.to_string(),
            detail: "Not configured yet".to_string(),
            configured: false,
            editable: edit_mode,
        }
    }

    fn metric(&self, config: &MetricConfig, edit_mode: bool) -> WidgetSummary {
        let title = config
            .label
            .clone()
            .unwrap_or_else(|| format!("{:?} of {}", config.calculation_type, config.entity_type));
        let detail = match &config.entities {
            EntitySelection::All => format!("all {}", config.entity_type),
            EntitySelection::Ids(ids) => format!("{} selected {}", ids.len(), config.entity_type),
        };
        Self::summary(title, detail, edit_mode)
    }

    fn activity(&self, config: &ActivityConfig, edit_mode: bool) -> WidgetSummary {
        let detail = match config.limit {
            Some(limit) => format!("latest {} changes", limit),
            None => "latest changes".to_string(),
        };
        Self::summary(format!("Activity: {}", config.entity_type), detail, edit_mode)
    }

    fn actions(&self, config: &ActionsConfig, edit_mode: bool) -> WidgetSummary {
        let detail = config.actions.iter().cloned().collect::<Vec<_>>().join(", ");
        Self::summary("Quick actions".to_string(), detail, edit_mode)
    }

    fn table(&self, config: &TableConfig, edit_mode: bool) -> WidgetSummary {
        let detail = match &config.scope {
            Some(scope) => format!("assessment {}", scope.assessment_id),
            None => "all assessments".to_string(),
        };
        Self::summary(config.entity_type.clone(), detail, edit_mode)
    }

    fn chart(&self, config: &ChartConfig, edit_mode: bool) -> WidgetSummary {
        Self::summary(
            format!("{} by {}", config.entity_type, config.group_by),
            format!("{:?} chart", config.chart_kind).to_lowercase(),
            edit_mode,
        )
    }
}

pub fn render_views(content: &DashboardContent, edit_mode: bool) -> Vec<WidgetView> {
    render_dashboard(&SummaryRenderer, WidgetRegistry::global(), content, edit_mode)
        .into_iter()
        .map(|placed| WidgetView {
            position: placed.position,
            summary: placed.output,
        })
        .collect()
}
