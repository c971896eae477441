// Presentation layer - HTTP surface over the store and edit sessions
pub mod api_error;
pub mod app_state;
pub mod handlers;
pub mod view;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/catalog", get(list_catalog))
        .route("/templates", get(list_templates))
        .route("/dashboards", get(list_dashboards).post(create_dashboard))
        .route(
            "/dashboards/:id",
            get(get_dashboard)
                .patch(rename_dashboard)
                .delete(delete_dashboard),
        )
        .route("/dashboards/:id/view", get(view_dashboard))
        .route("/dashboards/:id/edit", get(get_pending).post(enter_edit))
        .route("/dashboards/:id/edit/widgets", post(add_widget))
        .route(
            "/dashboards/:id/edit/widgets/:widget_id",
            axum::routing::delete(remove_widget),
        )
        .route(
            "/dashboards/:id/edit/widgets/:widget_id/config",
            put(configure_widget),
        )
        .route("/dashboards/:id/edit/layout", put(set_layout))
        .route("/dashboards/:id/edit/save", post(save_edit))
        .route("/dashboards/:id/edit/cancel", post(cancel_edit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_repository::DashboardRepository;
    use crate::application::dashboard_store::DashboardStore;
    use crate::application::edit_controller::EditController;
    use crate::domain::dashboard::{Dashboard, DashboardContent, DashboardId, NewDashboard};
    use crate::domain::registry::WidgetRegistry;
    use crate::domain::template::TemplateCatalog;
    use crate::infrastructure::memory_repository::InMemoryDashboardRepository;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Persistence whose updates never complete.
    #[derive(Default)]
    struct StalledRepository {
        inner: InMemoryDashboardRepository,
    }

    #[async_trait]
    impl DashboardRepository for StalledRepository {
        async fn load_dashboards(&self) -> anyhow::Result<Vec<Dashboard>> {
            self.inner.load_dashboards().await
        }

        async fn create_dashboard(&self, new_dashboard: NewDashboard) -> anyhow::Result<Dashboard> {
            self.inner.create_dashboard(new_dashboard).await
        }

        async fn update_dashboard(
            &self,
            _id: &DashboardId,
            _content: DashboardContent,
        ) -> anyhow::Result<Dashboard> {
            std::future::pending().await
        }

        async fn rename_dashboard(&self, id: &DashboardId, name: &str) -> anyhow::Result<()> {
            self.inner.rename_dashboard(id, name).await
        }

        async fn delete_dashboard(&self, id: &DashboardId) -> anyhow::Result<()> {
            self.inner.delete_dashboard(id).await
        }
    }

    async fn app(repo: Arc<InMemoryDashboardRepository>) -> Router {
        app_with(repo).await
    }

    async fn app_with(repo: Arc<dyn DashboardRepository>) -> Router {
        let mut store = DashboardStore::new(repo, TemplateCatalog::builtin());
        store.load().await.unwrap();
        let controller = EditController::new(WidgetRegistry::global());
        router(Arc::new(AppState::new(store, controller)))
    }

    async fn wait_for_saving(app: &Router, id: &str, saving: bool) {
        for _ in 0..200 {
            let (status, pending) =
                call(app, Method::GET, &format!("/dashboards/{id}/edit"), None).await;
            if status == StatusCode::OK && pending["saving"] == json!(saving) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session for {id} never reached saving = {saving}");
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_edit_flow_over_http() {
        let repo = Arc::new(InMemoryDashboardRepository::new());
        let app = app(repo.clone()).await;

        let (status, created) =
            call(&app, Method::POST, "/dashboards", Some(json!({"name": "Ops"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::POST, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::POST, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, added) = call(
            &app,
            Method::POST,
            &format!("/dashboards/{id}/edit/widgets"),
            Some(json!({"typeTag": "table"})),
        )
        .await;
        let widget_id = added["result"].as_str().unwrap().to_string();
        assert_eq!(
            added["pending"]["layout"][0],
            json!({"widgetId": widget_id, "x": 0, "y": 0, "w": 8, "h": 5})
        );

        let (_, ignored) = call(
            &app,
            Method::POST,
            &format!("/dashboards/{id}/edit/widgets"),
            Some(json!({"typeTag": "unknown-type"})),
        )
        .await;
        assert_eq!(ignored["result"], Value::Null);
        assert_eq!(ignored["pending"]["widgets"].as_array().unwrap().len(), 1);

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/dashboards/{id}/edit/widgets/{widget_id}/config"),
            Some(json!({"scope": {"assessmentId": 9}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, configured) = call(
            &app,
            Method::PUT,
            &format!("/dashboards/{id}/edit/widgets/{widget_id}/config"),
            Some(json!({"entityType": "actions", "scope": {"assessmentId": 9}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(configured["result"], json!(true));

        let (status, saved) =
            call(&app, Method::POST, &format!("/dashboards/{id}/edit/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            saved["widgets"][0]["config"],
            json!({"entityType": "actions", "scope": {"assessmentId": 9}})
        );
        assert_eq!(repo.update_count(), 1);

        let (status, _) = call(&app, Method::GET, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, view) = call(&app, Method::GET, &format!("/dashboards/{id}/view"), None).await;
        assert_eq!(view[0]["detail"], json!("assessment 9"));
        assert_eq!(view[0]["editable"], json!(false));
    }

    #[tokio::test]
    async fn test_failed_save_is_bad_gateway_and_keeps_session() {
        let repo = Arc::new(InMemoryDashboardRepository::new());
        let app = app(repo.clone()).await;
        let (_, created) = call(
            &app,
            Method::POST,
            "/dashboards",
            Some(json!({"name": "Ops", "template": "operations"})),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();

        let (_, pending) = call(&app, Method::POST, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(pending["layout"].as_array().unwrap().len(), 4);

        repo.fail_next_update("offline");
        let (status, body) =
            call(&app, Method::POST, &format!("/dashboards/{id}/edit/save"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("offline"));

        let (status, pending) =
            call(&app, Method::GET, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending["saving"], json!(false));

        let (status, _) = call(&app, Method::POST, &format!("/dashboards/{id}/edit/save"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let repo = Arc::new(InMemoryDashboardRepository::new());
        let app = app(repo).await;
        let (_, a) = call(&app, Method::POST, "/dashboards", Some(json!({"name": "A"}))).await;
        let (_, b) = call(&app, Method::POST, "/dashboards", Some(json!({"name": "B"}))).await;
        let a = a["id"].as_str().unwrap().to_string();
        let b = b["id"].as_str().unwrap().to_string();

        call(&app, Method::POST, &format!("/dashboards/{a}/edit"), None).await;
        let (status, _) = call(&app, Method::DELETE, &format!("/dashboards/{a}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::DELETE, &format!("/dashboards/{b}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        call(&app, Method::POST, &format!("/dashboards/{a}/edit/cancel"), None).await;
        let (status, body) = call(&app, Method::DELETE, &format!("/dashboards/{a}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("last"));
    }

    #[tokio::test]
    async fn test_catalog_lists_categories() {
        let app = app(Arc::new(InMemoryDashboardRepository::new())).await;
        let (status, catalog) = call(&app, Method::GET, "/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(catalog[0]["category"], json!("insights"));
        assert_eq!(catalog[0]["widgets"][0]["widgetType"], json!("metric"));
        assert_eq!(catalog[0]["widgets"][0]["defaultSize"], json!({"w": 4, "h": 3}));

        let (_, templates) = call(&app, Method::GET, "/templates", None).await;
        assert_eq!(templates, json!(["operations", "assessment-review"]));
    }

    #[tokio::test]
    async fn test_save_window_rejects_requests_and_dropped_save_keeps_edits() {
        let app = app_with(Arc::new(StalledRepository::default())).await;
        let (_, created) =
            call(&app, Method::POST, "/dashboards", Some(json!({"name": "Ops"}))).await;
        let id = created["id"].as_str().unwrap().to_string();
        call(&app, Method::POST, &format!("/dashboards/{id}/edit"), None).await;
        call(
            &app,
            Method::POST,
            &format!("/dashboards/{id}/edit/widgets"),
            Some(json!({"typeTag": "chart"})),
        )
        .await;

        let save = tokio::spawn({
            let app = app.clone();
            let uri = format!("/dashboards/{id}/edit/save");
            async move { call(&app, Method::POST, &uri, None).await }
        });
        wait_for_saving(&app, &id, true).await;

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/dashboards/{id}/edit/widgets"),
            Some(json!({"typeTag": "metric"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("in flight"));
        let (status, _) =
            call(&app, Method::POST, &format!("/dashboards/{id}/edit/cancel"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) =
            call(&app, Method::POST, &format!("/dashboards/{id}/edit/save"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        save.abort();
        assert!(save.await.unwrap_err().is_cancelled());
        wait_for_saving(&app, &id, false).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/dashboards/{id}/edit/save"))
            .body(Body::empty())
            .unwrap();
        let timed_out = tokio::time::timeout(Duration::from_millis(50), app.clone().oneshot(request)).await;
        assert!(timed_out.is_err());
        wait_for_saving(&app, &id, false).await;

        let (_, pending) = call(&app, Method::GET, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(pending["widgets"].as_array().unwrap().len(), 1);
        let (status, _) =
            call(&app, Method::POST, &format!("/dashboards/{id}/edit/cancel"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::POST, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_layout_from_the_wire_is_normalised_before_commit() {
        let app = app(Arc::new(InMemoryDashboardRepository::new())).await;
        let (_, created) =
            call(&app, Method::POST, "/dashboards", Some(json!({"name": "Ops"}))).await;
        let id = created["id"].as_str().unwrap().to_string();
        call(&app, Method::POST, &format!("/dashboards/{id}/edit"), None).await;
        let (_, added) = call(
            &app,
            Method::POST,
            &format!("/dashboards/{id}/edit/widgets"),
            Some(json!({"typeTag": "metric"})),
        )
        .await;
        let metric = added["result"].as_str().unwrap().to_string();

        let (status, pending) = call(
            &app,
            Method::PUT,
            &format!("/dashboards/{id}/edit/layout"),
            Some(json!([{"widgetId": metric, "x": 0, "y": u32::MAX, "w": 0, "h": 0}])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!((&pending["layout"][0]["w"], &pending["layout"][0]["h"]), (&json!(1), &json!(1)));

        let (status, added) = call(
            &app,
            Method::POST,
            &format!("/dashboards/{id}/edit/widgets"),
            Some(json!({"typeTag": "chart"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(added["pending"]["layout"][1]["y"], json!(u32::MAX));

        let (status, saved) =
            call(&app, Method::POST, &format!("/dashboards/{id}/edit/save"), None).await;
        assert_eq!(status, StatusCode::OK);
        let layout = saved["layout"].as_array().unwrap();
        assert_eq!(layout.len(), 2);
        assert!(layout.iter().all(|l| l["w"].as_u64().unwrap() >= 1 && l["h"].as_u64().unwrap() >= 1));
    }

    #[tokio::test]
    async fn test_configure_rejects_unknown_field_in_any_position() {
        let app = app(Arc::new(InMemoryDashboardRepository::new())).await;
        let (_, created) =
            call(&app, Method::POST, "/dashboards", Some(json!({"name": "Ops"}))).await;
        let id = created["id"].as_str().unwrap().to_string();
        call(&app, Method::POST, &format!("/dashboards/{id}/edit"), None).await;
        let (_, added) = call(
            &app,
            Method::POST,
            &format!("/dashboards/{id}/edit/widgets"),
            Some(json!({"typeTag": "table"})),
        )
        .await;
        let table = added["result"].as_str().unwrap().to_string();
        let uri = format!("/dashboards/{id}/edit/widgets/{table}/config");

        for body in [
            json!({"bogus": 1, "entityType": "actions"}),
            json!({"zzz": 1, "entityType": "actions"}),
        ] {
            let (status, error) = call(&app, Method::PUT, &uri, Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(error["error"].as_str().unwrap().contains("no field"));
        }

        let (_, pending) = call(&app, Method::GET, &format!("/dashboards/{id}/edit"), None).await;
        assert_eq!(pending["widgets"][0]["config"], json!({}));
    }
}
