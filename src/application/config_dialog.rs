// Config negotiation dialog - per-widget-type draft forms
use crate::application::edit_controller::EditController;
use crate::application::error::DialogError;
use crate::domain::dashboard::DashboardId;
use crate::domain::widget::{WidgetId, WidgetInstance, WidgetType};
use crate::domain::widget_config::{ValidationError, WidgetConfig};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    /// `"all"` or a list of entity ids
    EntitySelection,
    Choice(&'static [&'static str]),
    PositiveNumber,
    TextSet,
    AssessmentScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

const METRIC_FORM: &[FieldSpec] = &[
    field("entityType", FieldKind::Text, true),
    field("entities", FieldKind::EntitySelection, true),
    field(
        "calculationType",
        FieldKind::Choice(&["count", "sum", "average", "min", "max"]),
        true,
    ),
    field("label", FieldKind::Text, false),
];

const ACTIVITY_FORM: &[FieldSpec] = &[
    field("entityType", FieldKind::Text, true),
    field("limit", FieldKind::PositiveNumber, false),
];

const ACTIONS_FORM: &[FieldSpec] = &[field("actions", FieldKind::TextSet, true)];

const TABLE_FORM: &[FieldSpec] = &[
    field("entityType", FieldKind::Text, true),
    field("scope", FieldKind::AssessmentScope, false),
];

const CHART_FORM: &[FieldSpec] = &[
    field("entityType", FieldKind::Text, true),
    field("chartKind", FieldKind::Choice(&["bar", "line", "pie"]), true),
    field("groupBy", FieldKind::Text, true),
];

/// The form a widget type is configured through.
pub fn form_for(widget_type: WidgetType) -> &'static [FieldSpec] {
    match widget_type {
        WidgetType::Metric => METRIC_FORM,
        WidgetType::Activity => ACTIVITY_FORM,
        WidgetType::Actions => ACTIONS_FORM,
        WidgetType::Table => TABLE_FORM,
        WidgetType::Chart => CHART_FORM,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Open,
    Saved,
    Cancelled,
}

/// Draft state of an open dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    /// No field has been touched yet.
    Untouched,
    Valid(WidgetConfig),
    Invalid(ValidationError),
}

/// Edits the config of one widget in an edit session. The committed instance is only
/// touched by [`ConfigDialog::save`], and only with a valid draft.
#[derive(Debug, Clone)]
pub struct ConfigDialog {
    dashboard_id: DashboardId,
    widget_id: WidgetId,
    widget_type: WidgetType,
    fields: Map<String, Value>,
    draft: Draft,
    state: DialogState,
}

impl ConfigDialog {
    /// Open the form for a widget, pre-filled with its current config if it has one.
    pub fn open(dashboard_id: &DashboardId, instance: &WidgetInstance) -> Result<Self, DialogError> {
        let widget_type = instance
            .widget_type()
            .ok_or_else(|| ValidationError::Retired(instance.type_tag().to_string()))?;

        let fields = match instance.config().map(WidgetConfig::to_value) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Ok(Self {
            dashboard_id: dashboard_id.clone(),
            widget_id: instance.id.clone(),
            widget_type,
            fields,
            draft: Draft::Untouched,
            state: DialogState::Open,
        })
    }

    pub fn widget_type(&self) -> WidgetType {
        self.widget_type
    }

    pub fn form(&self) -> &'static [FieldSpec] {
        form_for(self.widget_type)
    }

    #[cfg(test)]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == DialogState::Open
    }

    /// Field-change callback. `null` clears the field. Re-validates the whole draft.
    pub fn on_field_change(&mut self, name: &str, value: Value) -> &Draft {
        if !self.is_open() {
            tracing::warn!("Ignoring change to '{}' on a closed config dialog", name);
            return &self.draft;
        }

        if !self.has_field(name) {
            self.draft = Draft::Invalid(ValidationError::UnknownField {
                widget_type: self.widget_type,
                field: name.to_string(),
            });
            return &self.draft;
        }

        if value.is_null() {
            self.fields.remove(name);
        } else {
            self.fields.insert(name.to_string(), value);
        }

        self.draft = match self.validate_fields() {
            Ok(config) => Draft::Valid(config),
            Err(e) => Draft::Invalid(e),
        };
        &self.draft
    }

    /// Apply a batch of field changes. A field the form does not have invalidates the
    /// draft and nothing in the batch is applied.
    pub fn apply_fields(&mut self, changes: Map<String, Value>) -> &Draft {
        if !self.is_open() {
            tracing::warn!("Ignoring field changes on a closed config dialog");
            return &self.draft;
        }

        if let Some(unknown) = changes.keys().find(|name| !self.has_field(name)) {
            self.draft = Draft::Invalid(ValidationError::UnknownField {
                widget_type: self.widget_type,
                field: unknown.clone(),
            });
            return &self.draft;
        }

        for (name, value) in changes {
            self.on_field_change(&name, value);
        }
        &self.draft
    }

    fn has_field(&self, name: &str) -> bool {
        self.form().iter().any(|f| f.name == name)
    }

    fn validate_fields(&self) -> Result<WidgetConfig, ValidationError> {
        if let Some(missing) = self
            .form()
            .iter()
            .find(|f| f.required && !self.fields.contains_key(f.name))
        {
            return Err(ValidationError::MissingField(missing.name));
        }
        WidgetConfig::from_value(self.widget_type, Value::Object(self.fields.clone()))
    }

    pub fn can_save(&self) -> bool {
        self.is_open() && matches!(self.draft, Draft::Valid(_))
    }

    /// Forward the valid draft to the edit session and close. Returns whether the
    /// session applied it (false when the widget vanished from the buffer meanwhile).
    /// On a session error the dialog stays open so the user can retry.
    pub fn save(&mut self, controller: &mut EditController) -> Result<bool, DialogError> {
        if !self.is_open() {
            return Err(DialogError::Closed);
        }
        let Draft::Valid(config) = &self.draft else {
            return Err(DialogError::NoValidDraft);
        };

        let applied = controller.set_widget_config(&self.dashboard_id, &self.widget_id, config.clone())?;
        self.state = DialogState::Saved;
        Ok(applied)
    }

    /// Close without saving; the draft is discarded.
    pub fn cancel(&mut self) {
        if self.is_open() {
            self.fields.clear();
            self.draft = Draft::Untouched;
            self.state = DialogState::Cancelled;
        }
    }
}
