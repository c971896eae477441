// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_repository::DashboardRepository;
use crate::application::dashboard_store::DashboardStore;
use crate::application::edit_controller::EditController;
use crate::domain::registry::WidgetRegistry;
use crate::infrastructure::config::{Backend, load_app_config};
use crate::infrastructure::memory_repository::InMemoryDashboardRepository;
use crate::infrastructure::rest_repository::RestDashboardRepository;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;
    let templates = app_config.template_catalog()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn DashboardRepository> = match app_config.persistence.backend {
        Backend::Memory => Arc::new(InMemoryDashboardRepository::new()),
        Backend::Rest => {
            let base_url = app_config
                .persistence
                .base_url
                .clone()
                .context("persistence.base_url is required for the rest backend")?;
            Arc::new(RestDashboardRepository::new(
                base_url,
                app_config.persistence.token.clone(),
            ))
        }
    };

    // Create store and edit controller (application layer)
    let mut store = DashboardStore::new(repository, templates);
    let loaded = store.load().await?;
    tracing::info!("Loaded {} dashboards from {:?} backend", loaded, app_config.persistence.backend);
    let controller = EditController::new(WidgetRegistry::global());

    // Build router (presentation layer)
    let state = Arc::new(AppState::new(store, controller));
    let router = presentation::router(state);

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", app_config.server.bind))?;
    tracing::info!("Starting dashboard-composer service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
