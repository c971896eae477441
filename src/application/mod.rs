// Application layer - Edit sessions, config dialog and the dashboard store
pub mod config_dialog;
pub mod dashboard_repository;
pub mod dashboard_store;
pub mod edit_controller;
pub mod edit_session;
pub mod error;
pub mod placement;
pub mod rendering;
