// Rendering dispatch - routes each widget instance to its type's renderer
use crate::application::config_dialog::ConfigDialog;
use crate::application::edit_controller::EditController;
use crate::application::error::{DialogError, SessionError};
use crate::domain::dashboard::{DashboardContent, DashboardId};
use crate::domain::layout::LayoutEntry;
use crate::domain::registry::{WidgetDefinition, WidgetRegistry};
use crate::domain::widget::{WidgetId, WidgetInstance};
use crate::domain::widget_config::{
    ActionsConfig, ActivityConfig, ChartConfig, MetricConfig, TableConfig, WidgetConfig,
};

/// The rendering collaborator: one entry point per widget type, plus the placeholder
/// shown for widgets that have not been configured yet.
pub trait WidgetRenderer {
    type Output;

    fn unconfigured(&self, definition: &WidgetDefinition, edit_mode: bool) -> Self::Output;
    fn metric(&self, config: &MetricConfig, edit_mode: bool) -> Self::Output;
    fn activity(&self, config: &ActivityConfig, edit_mode: bool) -> Self::Output;
    fn actions(&self, config: &ActionsConfig, edit_mode: bool) -> Self::Output;
    fn table(&self, config: &TableConfig, edit_mode: bool) -> Self::Output;
    fn chart(&self, config: &ChartConfig, edit_mode: bool) -> Self::Output;
}

/// Render one instance. Retired widget types render nothing.
pub fn render_widget<R: WidgetRenderer>(
    renderer: &R,
    registry: &WidgetRegistry,
    instance: &WidgetInstance,
    edit_mode: bool,
) -> Option<R::Output> {
    let definition = registry.get(instance.widget_type()?)?;
    let output = match instance.config() {
        None => renderer.unconfigured(definition, edit_mode),
        Some(WidgetConfig::Metric(c)) => renderer.metric(c, edit_mode),
        Some(WidgetConfig::Activity(c)) => renderer.activity(c, edit_mode),
        Some(WidgetConfig::Actions(c)) => renderer.actions(c, edit_mode),
        Some(WidgetConfig::Table(c)) => renderer.table(c, edit_mode),
        Some(WidgetConfig::Chart(c)) => renderer.chart(c, edit_mode),
    };
    Some(output)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOutput<T> {
    pub widget_id: WidgetId,
    pub position: LayoutEntry,
    pub output: T,
}

/// Render every placed widget in reading order (top to bottom, then left to right).
/// Widgets without a layout entry are skipped.
pub fn render_dashboard<R: WidgetRenderer>(
    renderer: &R,
    registry: &WidgetRegistry,
    content: &DashboardContent,
    edit_mode: bool,
) -> Vec<PlacedOutput<R::Output>> {
    let mut placed: Vec<PlacedOutput<R::Output>> = content
        .widgets
        .iter()
        .filter_map(|instance| {
            let position = content.layout_for(&instance.id)?.clone();
            let output = render_widget(renderer, registry, instance, edit_mode)?;
            Some(PlacedOutput {
                widget_id: instance.id.clone(),
                position,
                output,
            })
        })
        .collect();
    placed.sort_by_key(|p| (p.position.y, p.position.x));
    placed
}

/// Requests a rendered widget can raise while the dashboard is in edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetRequest {
    Reconfigure(WidgetId),
    Remove(WidgetId),
}

#[derive(Debug)]
pub enum RequestOutcome {
    DialogOpened(ConfigDialog),
    Removed(bool),
    /// The widget is no longer in the pending buffer.
    Ignored,
}

/// Route a widget's request to the config dialog or to `remove_widget`.
pub fn route_request(
    controller: &mut EditController,
    dashboard_id: &DashboardId,
    request: WidgetRequest,
) -> Result<RequestOutcome, DialogError> {
    match request {
        WidgetRequest::Reconfigure(widget_id) => {
            let session = controller
                .session(dashboard_id)
                .ok_or_else(|| SessionError::NotEditing(dashboard_id.clone()))?;
            match session.pending().widget(&widget_id) {
                Some(instance) => Ok(RequestOutcome::DialogOpened(ConfigDialog::open(
                    dashboard_id,
                    instance,
                )?)),
                None => Ok(RequestOutcome::Ignored),
            }
        }
        WidgetRequest::Remove(widget_id) => {
            let removed = controller.remove_widget(dashboard_id, &widget_id)?;
            Ok(RequestOutcome::Removed(removed))
        }
    }
}
