// HTTP request handlers
use crate::application::config_dialog::Draft;
use crate::application::edit_controller::EditController;
use crate::application::edit_session::SessionPhase;
use crate::application::error::{DialogError, PersistenceError, SessionError, StoreError};
use crate::application::rendering::{RequestOutcome, WidgetRequest, route_request};
use crate::domain::dashboard::{Dashboard, DashboardContent, DashboardId};
use crate::domain::layout::LayoutEntry;
use crate::domain::registry::{CategoryGroup, WidgetRegistry};
use crate::domain::widget::WidgetId;
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use crate::presentation::view::{WidgetView, render_views};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub id: DashboardId,
    pub name: String,
    pub widget_count: usize,
    pub editing: bool,
}

#[derive(Deserialize)]
pub struct CreateDashboardRequest {
    pub name: String,
    pub template: Option<String>,
}

#[derive(Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWidgetRequest {
    pub type_tag: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingView {
    pub dashboard_id: DashboardId,
    pub saving: bool,
    #[serde(flatten)]
    pub content: DashboardContent,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse<T> {
    pub result: T,
    pub pending: PendingView,
}

fn pending_view(controller: &EditController, id: &DashboardId) -> Result<PendingView, ApiError> {
    let session = controller
        .session(id)
        .ok_or_else(|| SessionError::NotEditing(id.clone()))?;
    Ok(PendingView {
        dashboard_id: id.clone(),
        saving: session.phase() == SessionPhase::Saving,
        content: session.pending().clone(),
    })
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Widget catalog grouped by category
pub async fn list_catalog() -> Json<Vec<CategoryGroup<'static>>> {
    Json(WidgetRegistry::global().by_category())
}

pub async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let workspace = state.workspace.lock().await;
    Json(workspace.store.templates().names().map(str::to_string).collect())
}

pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<DashboardSummary>> {
    let workspace = state.workspace.lock().await;
    let summaries = workspace
        .store
        .list()
        .map(|d| DashboardSummary {
            id: d.id.clone(),
            name: d.name.clone(),
            widget_count: d.content.widgets.len(),
            editing: workspace.controller.is_editing(&d.id),
        })
        .collect();
    Json(summaries)
}

pub async fn create_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDashboardRequest>,
) -> Result<(StatusCode, Json<Dashboard>), ApiError> {
    let mut workspace = state.workspace.lock().await;
    let id = workspace
        .store
        .create(&request.name, request.template.as_deref())
        .await?;
    let dashboard = workspace
        .store
        .get(&id)
        .cloned()
        .ok_or(StoreError::NotFound(id))?;
    Ok((StatusCode::CREATED, Json(dashboard)))
}

pub async fn get_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Dashboard>, ApiError> {
    let id = DashboardId::from(id);
    let workspace = state.workspace.lock().await;
    let dashboard = workspace
        .store
        .get(&id)
        .cloned()
        .ok_or(StoreError::NotFound(id))?;
    Ok(Json(dashboard))
}

/// Rendered view: the pending buffer in edit mode while a session is active,
/// otherwise the committed dashboard.
pub async fn view_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WidgetView>>, ApiError> {
    let id = DashboardId::from(id);
    let workspace = state.workspace.lock().await;
    if let Some(session) = workspace.controller.session(&id) {
        return Ok(Json(render_views(session.pending(), true)));
    }
    let dashboard = workspace
        .store
        .get(&id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
    Ok(Json(render_views(&dashboard.content, false)))
}

pub async fn rename_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenameRequest>,
) -> Result<StatusCode, ApiError> {
    let id = DashboardId::from(id);
    let mut workspace = state.workspace.lock().await;
    workspace.store.rename(&id, &request.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    let id = DashboardId::from(id);
    let mut workspace = state.workspace.lock().await;
    if workspace.controller.is_editing(&id) {
        return Err(StoreError::Editing(id).into());
    }
    workspace.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn enter_edit(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PendingView>, ApiError> {
    let id = DashboardId::from(id);
    let mut guard = state.workspace.lock().await;
    let workspace = &mut *guard;
    let dashboard = workspace
        .store
        .get(&id)
        .ok_or_else(|| SessionError::UnknownDashboard(id.clone()))?;
    workspace.controller.enter_edit(dashboard)?;
    Ok(Json(pending_view(&workspace.controller, &id)?))
}

pub async fn get_pending(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PendingView>, ApiError> {
    let id = DashboardId::from(id);
    let workspace = state.workspace.lock().await;
    Ok(Json(pending_view(&workspace.controller, &id)?))
}

pub async fn add_widget(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddWidgetRequest>,
) -> Result<Json<MutationResponse<Option<WidgetId>>>, ApiError> {
    let id = DashboardId::from(id);
    let mut workspace = state.workspace.lock().await;
    let added = workspace.controller.add_widget(&id, &request.type_tag)?;
    Ok(Json(MutationResponse {
        result: added,
        pending: pending_view(&workspace.controller, &id)?,
    }))
}

pub async fn remove_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<MutationResponse<bool>>, ApiError> {
    let id = DashboardId::from(id);
    let mut workspace = state.workspace.lock().await;
    let outcome = route_request(
        &mut workspace.controller,
        &id,
        WidgetRequest::Remove(WidgetId::from(widget_id)),
    )?;
    let removed = matches!(outcome, RequestOutcome::Removed(true));
    Ok(Json(MutationResponse {
        result: removed,
        pending: pending_view(&workspace.controller, &id)?,
    }))
}

/// Run the submitted fields through the widget's config dialog and save the draft.
pub async fn configure_widget(
    Path((id, widget_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<MutationResponse<bool>>, ApiError> {
    let id = DashboardId::from(id);
    let widget_id = WidgetId::from(widget_id);
    let mut workspace = state.workspace.lock().await;

    if workspace.controller.session(&id).map(|s| s.phase()) == Some(SessionPhase::Saving) {
        return Err(SessionError::SaveInFlight(id).into());
    }
    let request = WidgetRequest::Reconfigure(widget_id.clone());
    let mut dialog = match route_request(&mut workspace.controller, &id, request)? {
        RequestOutcome::DialogOpened(dialog) => dialog,
        _ => {
            tracing::warn!("Widget {} not found on dashboard {}, config dropped", widget_id, id);
            return Ok(Json(MutationResponse {
                result: false,
                pending: pending_view(&workspace.controller, &id)?,
            }));
        }
    };
    match dialog.apply_fields(fields) {
        Draft::Valid(_) => {}
        Draft::Invalid(e) => return Err(DialogError::NotConfigurable(e.clone()).into()),
        Draft::Untouched => return Err(DialogError::NoValidDraft.into()),
    }

    let applied = dialog.save(&mut workspace.controller)?;
    Ok(Json(MutationResponse {
        result: applied,
        pending: pending_view(&workspace.controller, &id)?,
    }))
}

pub async fn set_layout(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(layout): Json<Vec<LayoutEntry>>,
) -> Result<Json<PendingView>, ApiError> {
    let id = DashboardId::from(id);
    let mut workspace = state.workspace.lock().await;
    workspace.controller.set_layout(&id, layout)?;
    Ok(Json(pending_view(&workspace.controller, &id)?))
}

/// Puts the session back into Editing if the save handler is dropped (client gone,
/// request timed out) before the outcome is applied.
struct SaveGuard {
    state: Arc<AppState>,
    dashboard_id: DashboardId,
    armed: bool,
}

impl SaveGuard {
    fn new(state: Arc<AppState>, dashboard_id: DashboardId) -> Self {
        Self {
            state,
            dashboard_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let state = self.state.clone();
        let id = self.dashboard_id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    state.workspace.lock().await.controller.abort_save(&id);
                });
            }
            Err(_) => {
                if let Ok(mut workspace) = state.workspace.try_lock() {
                    workspace.controller.abort_save(&id);
                }
            }
        }
    }
}

/// Commit the pending buffer. The workspace lock is released while persistence is
/// awaited; meanwhile the session rejects mutations and further saves.
pub async fn save_edit(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Dashboard>, ApiError> {
    let id = DashboardId::from(id);
    let (request, repository) = {
        let mut workspace = state.workspace.lock().await;
        let request = workspace.controller.begin_save(&id)?;
        (request, workspace.store.repository())
    };
    let guard = SaveGuard::new(state.clone(), id.clone());

    let outcome = repository
        .update_dashboard(&request.dashboard_id, request.content.clone())
        .await
        .map_err(PersistenceError::from);

    let mut workspace = state.workspace.lock().await;
    guard.disarm();
    let dashboard = workspace.controller.finish_save(request, outcome)?;
    workspace.store.commit(dashboard.clone());
    Ok(Json(dashboard))
}

pub async fn cancel_edit(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    let id = DashboardId::from(id);
    let mut workspace = state.workspace.lock().await;
    workspace.controller.cancel(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
