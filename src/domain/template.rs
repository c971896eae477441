// Dashboard templates - predefined ordered widget lists
use super::widget::{UnknownWidgetType, WidgetId, WidgetInstance, WidgetType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub widgets: Vec<WidgetType>,
}

impl Template {
    pub fn new(name: impl Into<String>, widgets: Vec<WidgetType>) -> Self {
        Self {
            name: name.into(),
            widgets,
        }
    }

    /// Parse a template from raw type tags, rejecting tags that are not registered.
    pub fn from_tags(name: impl Into<String>, tags: &[String]) -> Result<Self, UnknownWidgetType> {
        let widgets = tags
            .iter()
            .map(|t| t.parse::<WidgetType>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, widgets))
    }

    /// Fresh, unconfigured instances in template order. Layout is left empty.
    pub fn instantiate(&self) -> Vec<WidgetInstance> {
        self.widgets
            .iter()
            .map(|t| WidgetInstance::new(WidgetId::generate(), *t))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Template::new(
                "operations",
                vec![
                    WidgetType::Metric,
                    WidgetType::Metric,
                    WidgetType::Activity,
                    WidgetType::Actions,
                ],
            ),
            Template::new(
                "assessment-review",
                vec![WidgetType::Table, WidgetType::Chart, WidgetType::Activity],
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.name.as_str())
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
