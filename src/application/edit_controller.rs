// Edit session controller - Viewing/Editing state machine across dashboards
use crate::application::dashboard_store::DashboardStore;
use crate::application::edit_session::{EditSession, SessionPhase};
use crate::application::error::{PersistenceError, SessionError};
use crate::domain::dashboard::{Dashboard, DashboardContent, DashboardId};
use crate::domain::layout::LayoutEntry;
use crate::domain::registry::WidgetRegistry;
use crate::domain::widget::WidgetId;
use crate::domain::widget_config::WidgetConfig;
use std::collections::HashMap;

/// A reconciled buffer handed out by [`EditController::begin_save`], to be submitted
/// to persistence and then returned through [`EditController::finish_save`].
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub dashboard_id: DashboardId,
    pub content: DashboardContent,
}

/// Owns every active edit session. A dashboard with no session is in Viewing.
pub struct EditController {
    registry: &'static WidgetRegistry,
    sessions: HashMap<DashboardId, EditSession>,
}

impl EditController {
    pub fn new(registry: &'static WidgetRegistry) -> Self {
        Self {
            registry,
            sessions: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &'static WidgetRegistry {
        self.registry
    }

    pub fn is_editing(&self, id: &DashboardId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn session(&self, id: &DashboardId) -> Option<&EditSession> {
        self.sessions.get(id)
    }

    fn session_mut(&mut self, id: &DashboardId) -> Result<&mut EditSession, SessionError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotEditing(id.clone()))
    }

    pub fn enter_edit(&mut self, dashboard: &Dashboard) -> Result<&EditSession, SessionError> {
        if self.sessions.contains_key(&dashboard.id) {
            return Err(SessionError::AlreadyEditing(dashboard.id.clone()));
        }

        tracing::info!("Entering edit mode for dashboard {}", dashboard.id);
        let session = EditSession::enter(dashboard, self.registry);
        Ok(self.sessions.entry(dashboard.id.clone()).or_insert(session))
    }

    pub fn add_widget(
        &mut self,
        id: &DashboardId,
        type_tag: &str,
    ) -> Result<Option<WidgetId>, SessionError> {
        let registry = self.registry;
        self.session_mut(id)?.add_widget(registry, type_tag)
    }

    pub fn remove_widget(&mut self, id: &DashboardId, widget_id: &WidgetId) -> Result<bool, SessionError> {
        self.session_mut(id)?.remove_widget(widget_id)
    }

    pub fn set_widget_config(
        &mut self,
        id: &DashboardId,
        widget_id: &WidgetId,
        config: WidgetConfig,
    ) -> Result<bool, SessionError> {
        self.session_mut(id)?.set_widget_config(widget_id, config)
    }

    pub fn set_layout(&mut self, id: &DashboardId, layout: Vec<LayoutEntry>) -> Result<(), SessionError> {
        self.session_mut(id)?.set_layout(layout)
    }

    /// Discard the buffer without contacting persistence.
    pub fn cancel(&mut self, id: &DashboardId) -> Result<(), SessionError> {
        let session = self.session_mut(id)?;
        if session.phase() == SessionPhase::Saving {
            return Err(SessionError::SaveInFlight(id.clone()));
        }
        self.sessions.remove(id);
        tracing::info!("Cancelled edit of dashboard {}", id);
        Ok(())
    }

    /// First half of a save: reconcile the buffer and lock the session against
    /// further mutation until [`finish_save`](Self::finish_save) is called.
    pub fn begin_save(&mut self, id: &DashboardId) -> Result<SaveRequest, SessionError> {
        let registry = self.registry;
        let content = self.session_mut(id)?.begin_save(registry)?;
        tracing::info!(
            "Submitting dashboard {} ({} widgets)",
            id,
            content.widgets.len()
        );
        Ok(SaveRequest {
            dashboard_id: id.clone(),
            content,
        })
    }

    /// Second half of a save. On success the session ends and the stored dashboard is
    /// returned for commit; on failure the session goes back to Editing with its buffer intact.
    pub fn finish_save(
        &mut self,
        request: SaveRequest,
        outcome: Result<Dashboard, PersistenceError>,
    ) -> Result<Dashboard, SessionError> {
        let id = request.dashboard_id;
        match outcome {
            Ok(dashboard) => {
                self.sessions.remove(&id);
                tracing::info!("Committed dashboard {}", id);
                Ok(dashboard)
            }
            Err(e) => {
                tracing::error!("Saving dashboard {} failed: {}", id, e);
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.abort_save();
                }
                Err(SessionError::Persistence(e))
            }
        }
    }

    /// Put a session whose submission was abandoned back into Editing, buffer intact.
    /// Returns whether a save was actually in flight.
    pub fn abort_save(&mut self, id: &DashboardId) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) if session.phase() == SessionPhase::Saving => {
                session.abort_save();
                tracing::warn!("Save of dashboard {} was abandoned, back to editing", id);
                true
            }
            _ => false,
        }
    }

    /// Reconcile, submit and commit in one step.
    pub async fn save(
        &mut self,
        id: &DashboardId,
        store: &mut DashboardStore,
    ) -> Result<(), SessionError> {
        let request = self.begin_save(id)?;
        let outcome = store
            .repository()
            .update_dashboard(&request.dashboard_id, request.content.clone())
            .await
            .map_err(PersistenceError::from);
        let dashboard = self.finish_save(request, outcome)?;
        store.commit(dashboard);
        Ok(())
    }
}
