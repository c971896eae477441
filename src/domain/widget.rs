// Widget instance domain model
use super::widget_config::{ValidationError, WidgetConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a widget instance, unique within its dashboard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WidgetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WidgetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of widget types the application knows how to render and configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Metric,
    Activity,
    Actions,
    Table,
    Chart,
}

impl WidgetType {
    pub const ALL: [WidgetType; 5] = [
        WidgetType::Metric,
        WidgetType::Activity,
        WidgetType::Actions,
        WidgetType::Table,
        WidgetType::Chart,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            WidgetType::Metric => "metric",
            WidgetType::Activity => "activity",
            WidgetType::Actions => "actions",
            WidgetType::Table => "table",
            WidgetType::Chart => "chart",
        }
    }
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown widget type '{0}'")]
pub struct UnknownWidgetType(pub String);

impl FromStr for WidgetType {
    type Err = UnknownWidgetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetType::ALL
            .into_iter()
            .find(|t| t.tag() == s)
            .ok_or_else(|| UnknownWidgetType(s.to_string()))
    }
}

/// What a widget instance is: a registered type with its (possibly empty) config,
/// or a type tag that is no longer registered, kept verbatim so it survives commits.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    Registered {
        widget_type: WidgetType,
        config: Option<WidgetConfig>,
    },
    Retired {
        type_tag: String,
        config: serde_json::Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WidgetRecord", into = "WidgetRecord")]
pub struct WidgetInstance {
    pub id: WidgetId,
    pub kind: WidgetKind,
}

impl WidgetInstance {
    /// A fresh, unconfigured instance.
    pub fn new(id: WidgetId, widget_type: WidgetType) -> Self {
        Self {
            id,
            kind: WidgetKind::Registered {
                widget_type,
                config: None,
            },
        }
    }

    pub fn configured(id: WidgetId, config: WidgetConfig) -> Self {
        Self {
            id,
            kind: WidgetKind::Registered {
                widget_type: config.widget_type(),
                config: Some(config),
            },
        }
    }

    pub fn widget_type(&self) -> Option<WidgetType> {
        match &self.kind {
            WidgetKind::Registered { widget_type, .. } => Some(*widget_type),
            WidgetKind::Retired { .. } => None,
        }
    }

    pub fn type_tag(&self) -> &str {
        match &self.kind {
            WidgetKind::Registered { widget_type, .. } => widget_type.tag(),
            WidgetKind::Retired { type_tag, .. } => type_tag,
        }
    }

    pub fn config(&self) -> Option<&WidgetConfig> {
        match &self.kind {
            WidgetKind::Registered { config, .. } => config.as_ref(),
            WidgetKind::Retired { .. } => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config().is_some()
    }

    /// Replace the config. Fails when the config belongs to another widget type
    /// or the instance's type is retired.
    pub fn set_config(&mut self, new_config: WidgetConfig) -> Result<(), ValidationError> {
        match &mut self.kind {
            WidgetKind::Registered {
                widget_type,
                config,
            } => {
                if new_config.widget_type() != *widget_type {
                    return Err(ValidationError::TypeMismatch {
                        expected: *widget_type,
                        found: new_config.widget_type(),
                    });
                }
                *config = Some(new_config);
                Ok(())
            }
            WidgetKind::Retired { type_tag, .. } => {
                Err(ValidationError::Retired(type_tag.clone()))
            }
        }
    }
}

/// Wire shape shared with the persistence collaborator: `{id, widgetType, config}` where
/// an empty object means "unconfigured".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WidgetRecord {
    id: WidgetId,
    widget_type: String,
    #[serde(default = "empty_object")]
    config: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn is_empty_config(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl From<WidgetRecord> for WidgetInstance {
    fn from(record: WidgetRecord) -> Self {
        let kind = match record.widget_type.parse::<WidgetType>() {
            Ok(widget_type) => {
                let config = if is_empty_config(&record.config) {
                    None
                } else {
                    match WidgetConfig::from_value(widget_type, record.config) {
                        Ok(config) => Some(config),
                        Err(e) => {
                            tracing::warn!(
                                "Stored config for widget {} ({}) is unreadable, treating as unconfigured: {}",
                                record.id,
                                widget_type,
                                e
                            );
                            None
                        }
                    }
                };
                WidgetKind::Registered {
                    widget_type,
                    config,
                }
            }
            Err(_) => {
                tracing::warn!(
                    "Widget {} has retired type '{}', preserving it without rendering",
                    record.id,
                    record.widget_type
                );
                WidgetKind::Retired {
                    type_tag: record.widget_type,
                    config: record.config,
                }
            }
        };

        Self {
            id: record.id,
            kind,
        }
    }
}

impl From<WidgetInstance> for WidgetRecord {
    fn from(instance: WidgetInstance) -> Self {
        let (widget_type, config) = match instance.kind {
            WidgetKind::Registered {
                widget_type,
                config,
            } => (
                widget_type.tag().to_string(),
                config.map(|c| c.to_value()).unwrap_or_else(empty_object),
            ),
            WidgetKind::Retired { type_tag, config } => (type_tag, config),
        };

        Self {
            id: instance.id,
            widget_type,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget_config::{TableConfig, TableScope};
    use serde_json::json;

    #[test]
    fn test_widget_type_tags_parse_back() {
        for widget_type in WidgetType::ALL {
            assert_eq!(widget_type.tag().parse::<WidgetType>(), Ok(widget_type));
        }
        assert!("gauge".parse::<WidgetType>().is_err());
    }

    #[test]
    fn test_empty_config_reads_as_unconfigured() {
        let instance: WidgetInstance =
            serde_json::from_value(json!({"id": "a", "widgetType": "metric", "config": {}}))
                .unwrap();
        assert_eq!(instance.widget_type(), Some(WidgetType::Metric));
        assert!(!instance.is_configured());

        let missing: WidgetInstance =
            serde_json::from_value(json!({"id": "b", "widgetType": "chart"})).unwrap();
        assert!(!missing.is_configured());
    }

    #[test]
    fn test_retired_type_is_preserved_verbatim() {
        let raw = json!({"id": "old", "widgetType": "gauge", "config": {"needle": 3}});
        let instance: WidgetInstance = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(instance.widget_type(), None);
        assert_eq!(instance.type_tag(), "gauge");
        assert_eq!(serde_json::to_value(&instance).unwrap(), raw);
    }

    #[test]
    fn test_table_config_written_in_wire_shape() {
        let instance = WidgetInstance::configured(
            WidgetId::from("t1"),
            WidgetConfig::Table(TableConfig {
                entity_type: "actions".to_string(),
                scope: Some(TableScope { assessment_id: 7 }),
            }),
        );
        assert_eq!(
            serde_json::to_value(&instance).unwrap(),
            json!({
                "id": "t1",
                "widgetType": "table",
                "config": {"entityType": "actions", "scope": {"assessmentId": 7}}
            })
        );
    }

    #[test]
    fn test_set_config_rejects_other_widget_type() {
        let mut instance = WidgetInstance::new(WidgetId::from("m"), WidgetType::Metric);
        let table = WidgetConfig::Table(TableConfig {
            entity_type: "actions".to_string(),
            scope: None,
        });
        assert!(matches!(
            instance.set_config(table),
            Err(ValidationError::TypeMismatch { .. })
        ));
        assert!(!instance.is_configured());
    }
}
