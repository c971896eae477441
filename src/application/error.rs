// Error taxonomy for the edit engine
use crate::domain::dashboard::DashboardId;
use crate::domain::widget_config::ValidationError;

/// The persistence collaborator failed. Always retryable; nothing local is lost.
#[derive(Debug, thiserror::Error)]
#[error("persistence failed: {0:#}")]
pub struct PersistenceError(#[from] pub anyhow::Error);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("dashboard {0} is not being edited")]
    NotEditing(DashboardId),

    #[error("dashboard {0} is already being edited")]
    AlreadyEditing(DashboardId),

    #[error("a save for dashboard {0} is in flight")]
    SaveInFlight(DashboardId),

    #[error("dashboard {0} does not exist")]
    UnknownDashboard(DashboardId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("dashboard {0} does not exist")]
    NotFound(DashboardId),

    #[error("dashboard name must not be empty")]
    EmptyName,

    #[error("the last remaining dashboard cannot be deleted")]
    LastDashboard,

    #[error("unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("dashboard {0} has an active edit session")]
    Editing(DashboardId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("the config dialog is closed")]
    Closed,

    #[error("there is no valid draft to save")]
    NoValidDraft,

    #[error("widget cannot be configured: {0}")]
    NotConfigurable(#[from] ValidationError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
