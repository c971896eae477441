// REST dashboard repository - talks to the remote dashboards API
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::{Dashboard, DashboardContent, DashboardId, NewDashboard};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct RestDashboardRepository {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

impl RestDashboardRepository {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/dashboards", self.base_url)
    }

    fn dashboard_url(&self, id: &DashboardId) -> String {
        format!("{}/dashboards/{}", self.base_url, urlencoding::encode(id.as_str()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} failed with status {}: {}", what, status, body);
        }

        Ok(response)
    }
}

#[async_trait]
impl DashboardRepository for RestDashboardRepository {
    async fn load_dashboards(&self) -> Result<Vec<Dashboard>> {
        let response = self
            .send(self.client.get(self.collection_url()), "load dashboards")
            .await?;
        let dashboards = response
            .json::<Vec<Dashboard>>()
            .await
            .context("Failed to parse dashboards response")?;
        tracing::debug!("Fetched {} dashboards from {}", dashboards.len(), self.base_url);
        Ok(dashboards)
    }

    async fn create_dashboard(&self, new_dashboard: NewDashboard) -> Result<Dashboard> {
        let response = self
            .send(
                self.client.post(self.collection_url()).json(&new_dashboard),
                "create dashboard",
            )
            .await?;
        response
            .json::<Dashboard>()
            .await
            .context("Failed to parse created dashboard")
    }

    async fn update_dashboard(&self, id: &DashboardId, content: DashboardContent) -> Result<Dashboard> {
        let response = self
            .send(
                self.client.put(self.dashboard_url(id)).json(&content),
                "update dashboard",
            )
            .await?;
        response
            .json::<Dashboard>()
            .await
            .context("Failed to parse updated dashboard")
    }

    async fn rename_dashboard(&self, id: &DashboardId, name: &str) -> Result<()> {
        self.send(
            self.client
                .patch(self.dashboard_url(id))
                .json(&RenameBody { name }),
            "rename dashboard",
        )
        .await?;
        Ok(())
    }

    async fn delete_dashboard(&self, id: &DashboardId) -> Result<()> {
        self.send(self.client.delete(self.dashboard_url(id)), "delete dashboard")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_trim_slash_and_encode_ids() {
        let repo = RestDashboardRepository::new("https://api.example.com/v1/".to_string(), None);
        assert_eq!(repo.collection_url(), "https://api.example.com/v1/dashboards");
        assert_eq!(
            repo.dashboard_url(&DashboardId::from("team ops/1")),
            "https://api.example.com/v1/dashboards/team%20ops%2F1"
        );
    }
}
