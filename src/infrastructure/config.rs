// Configuration loading - file and environment layers
use crate::domain::template::{Template, TemplateCatalog};
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub persistence: PersistenceSettings,
    #[serde(default)]
    pub templates: Vec<TemplateSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Rest,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PersistenceSettings {
    #[serde(default)]
    pub backend: Backend,
    pub base_url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateSettings {
    pub name: String,
    pub widgets: Vec<String>,
}

/// Load `config/app.{toml,yaml,json}` if present, overridden by `DASHBOARD__*` variables
/// (e.g. `DASHBOARD__PERSISTENCE__BACKEND=rest`).
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

impl AppConfig {
    /// Configured templates, or the built-in ones when none are configured.
    pub fn template_catalog(&self) -> anyhow::Result<TemplateCatalog> {
        if self.templates.is_empty() {
            return Ok(TemplateCatalog::builtin());
        }

        let templates = self
            .templates
            .iter()
            .map(|t| {
                Template::from_tags(t.name.clone(), &t.widgets)
                    .with_context(|| format!("Template '{}' is invalid", t.name))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(TemplateCatalog::new(templates))
    }
}
