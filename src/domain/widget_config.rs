// Per-type widget configuration shapes
use super::widget::WidgetType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field '{0}' is required")]
    MissingField(&'static str),

    #[error("{widget_type} widgets have no field '{field}'")]
    UnknownField {
        widget_type: WidgetType,
        field: String,
    },

    #[error("field '{0}' must not be empty")]
    EmptySelection(&'static str),

    #[error("field '{field}' must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{widget_type} config is malformed: {reason}")]
    Malformed {
        widget_type: WidgetType,
        reason: String,
    },

    #[error("config for {found} cannot be applied to a {expected} widget")]
    TypeMismatch {
        expected: WidgetType,
        found: WidgetType,
    },

    #[error("widget type '{0}' is retired and cannot be configured")]
    Retired(String),
}

/// Which entities a metric aggregates over: every entity, or an explicit set of ids.
/// Serialized as the string `"all"` or an array of ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntitySelectionRepr", into = "EntitySelectionRepr")]
pub enum EntitySelection {
    All,
    Ids(BTreeSet<u64>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum EntitySelectionRepr {
    Keyword(String),
    Ids(BTreeSet<u64>),
}

impl TryFrom<EntitySelectionRepr> for EntitySelection {
    type Error = String;

    fn try_from(repr: EntitySelectionRepr) -> Result<Self, Self::Error> {
        match repr {
            EntitySelectionRepr::Keyword(k) if k == "all" => Ok(EntitySelection::All),
            EntitySelectionRepr::Keyword(k) => {
                Err(format!("expected \"all\" or a list of ids, got \"{}\"", k))
            }
            EntitySelectionRepr::Ids(ids) => Ok(EntitySelection::Ids(ids)),
        }
    }
}

impl From<EntitySelection> for EntitySelectionRepr {
    fn from(selection: EntitySelection) -> Self {
        match selection {
            EntitySelection::All => EntitySelectionRepr::Keyword("all".to_string()),
            EntitySelection::Ids(ids) => EntitySelectionRepr::Ids(ids),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    Count,
    Sum,
    Average,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    pub entity_type: String,
    pub entities: EntitySelection,
    pub calculation_type: CalculationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityConfig {
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsConfig {
    pub actions: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableScope {
    pub assessment_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<TableScope>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub entity_type: String,
    pub chart_kind: ChartKind,
    pub group_by: String,
}

/// A complete, validated configuration, keyed by the widget type it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetConfig {
    Metric(MetricConfig),
    Activity(ActivityConfig),
    Actions(ActionsConfig),
    Table(TableConfig),
    Chart(ChartConfig),
}

impl WidgetConfig {
    pub fn widget_type(&self) -> WidgetType {
        match self {
            WidgetConfig::Metric(_) => WidgetType::Metric,
            WidgetConfig::Activity(_) => WidgetType::Activity,
            WidgetConfig::Actions(_) => WidgetType::Actions,
            WidgetConfig::Table(_) => WidgetType::Table,
            WidgetConfig::Chart(_) => WidgetType::Chart,
        }
    }

    /// Parse and validate a config object for the given widget type.
    pub fn from_value(
        widget_type: WidgetType,
        value: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        let config = match widget_type {
            WidgetType::Metric => WidgetConfig::Metric(parse(widget_type, value)?),
            WidgetType::Activity => WidgetConfig::Activity(parse(widget_type, value)?),
            WidgetType::Actions => WidgetConfig::Actions(parse(widget_type, value)?),
            WidgetType::Table => WidgetConfig::Table(parse(widget_type, value)?),
            WidgetType::Chart => WidgetConfig::Chart(parse(widget_type, value)?),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_value(&self) -> serde_json::Value {
        let value = match self {
            WidgetConfig::Metric(c) => serde_json::to_value(c),
            WidgetConfig::Activity(c) => serde_json::to_value(c),
            WidgetConfig::Actions(c) => serde_json::to_value(c),
            WidgetConfig::Table(c) => serde_json::to_value(c),
            WidgetConfig::Chart(c) => serde_json::to_value(c),
        };
        // Plain structs of strings, integers and sets always serialize.
        value.unwrap_or_default()
    }

    /// Semantic checks serde cannot express: non-empty strings and selections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            WidgetConfig::Metric(c) => {
                require_text("entityType", &c.entity_type)?;
                if let EntitySelection::Ids(ids) = &c.entities {
                    if ids.is_empty() {
                        return Err(ValidationError::EmptySelection("entities"));
                    }
                }
                Ok(())
            }
            WidgetConfig::Activity(c) => {
                require_text("entityType", &c.entity_type)?;
                if c.limit == Some(0) {
                    return Err(ValidationError::NotPositive { field: "limit" });
                }
                Ok(())
            }
            WidgetConfig::Actions(c) => {
                if c.actions.is_empty() || c.actions.iter().any(|a| a.trim().is_empty()) {
                    return Err(ValidationError::EmptySelection("actions"));
                }
                Ok(())
            }
            WidgetConfig::Table(c) => require_text("entityType", &c.entity_type),
            WidgetConfig::Chart(c) => {
                require_text("entityType", &c.entity_type)?;
                require_text("groupBy", &c.group_by)
            }
        }
    }
}

fn parse<T: DeserializeOwned>(
    widget_type: WidgetType,
    value: serde_json::Value,
) -> Result<T, ValidationError> {
    serde_json::from_value(value).map_err(|e| ValidationError::Malformed {
        widget_type,
        reason: e.to_string(),
    })
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}
