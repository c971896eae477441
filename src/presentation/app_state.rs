// Application state for HTTP handlers
use crate::application::dashboard_store::DashboardStore;
use crate::application::edit_controller::EditController;
use tokio::sync::Mutex;

/// Committed dashboards and active edit sessions, behind one lock. Handlers never hold
/// the lock across a persistence round-trip during save, so a concurrent request sees
/// the session as saving and is rejected instead of queued.
pub struct AppState {
    pub workspace: Mutex<Workspace>,
}

pub struct Workspace {
    pub store: DashboardStore,
    pub controller: EditController,
}

impl AppState {
    pub fn new(store: DashboardStore, controller: EditController) -> Self {
        Self {
            workspace: Mutex::new(Workspace { store, controller }),
        }
    }
}
