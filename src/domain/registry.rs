// Widget registry - static catalog of widget types
use super::layout::GridSize;
use super::widget::WidgetType;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    Insights,
    Work,
    Shortcuts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    pub widget_type: WidgetType,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: WidgetCategory,
    pub default_size: GridSize,
    /// Smallest size the renderer can draw legibly.
    pub min_size: GridSize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup<'a> {
    pub category: WidgetCategory,
    pub widgets: Vec<&'a WidgetDefinition>,
}

#[derive(Debug)]
pub struct WidgetRegistry {
    definitions: BTreeMap<WidgetType, WidgetDefinition>,
}

static REGISTRY: LazyLock<WidgetRegistry> = LazyLock::new(WidgetRegistry::builtin);

impl WidgetRegistry {
    /// The process-wide catalog.
    pub fn global() -> &'static WidgetRegistry {
        &REGISTRY
    }

    fn builtin() -> Self {
        let definitions = WidgetType::ALL
            .into_iter()
            .map(|t| (t, Self::definition_for(t)))
            .collect();
        Self { definitions }
    }

    // Exhaustive so a new WidgetType cannot ship without a catalog entry.
    fn definition_for(widget_type: WidgetType) -> WidgetDefinition {
        let (display_name, description, category, default_size, min_size) = match widget_type {
            WidgetType::Metric => (
                "Metric",
                "A single aggregated number over a set of entities",
                WidgetCategory::Insights,
                GridSize::new(4, 3),
                GridSize::new(2, 2),
            ),
            WidgetType::Activity => (
                "Activity",
                "Recent changes to entities of one type",
                WidgetCategory::Work,
                GridSize::new(4, 5),
                GridSize::new(3, 3),
            ),
            WidgetType::Actions => (
                "Quick actions",
                "Shortcut buttons for common tasks",
                WidgetCategory::Shortcuts,
                GridSize::new(4, 2),
                GridSize::new(2, 1),
            ),
            WidgetType::Table => (
                "Table",
                "Tabular list of entities, optionally scoped to an assessment",
                WidgetCategory::Work,
                GridSize::new(8, 5),
                GridSize::new(4, 3),
            ),
            WidgetType::Chart => (
                "Chart",
                "Entities grouped by a field and charted",
                WidgetCategory::Insights,
                GridSize::new(6, 4),
                GridSize::new(3, 3),
            ),
        };

        WidgetDefinition {
            widget_type,
            display_name,
            description,
            category,
            default_size,
            min_size,
        }
    }

    /// Look a definition up by its type tag.
    pub fn lookup(&self, type_tag: &str) -> Option<&WidgetDefinition> {
        let widget_type = type_tag.parse::<WidgetType>().ok()?;
        self.get(widget_type)
    }

    pub fn get(&self, widget_type: WidgetType) -> Option<&WidgetDefinition> {
        self.definitions.get(&widget_type)
    }

    /// Definitions grouped by category, categories and widgets in a stable order.
    pub fn by_category(&self) -> Vec<CategoryGroup<'_>> {
        let mut groups: BTreeMap<WidgetCategory, Vec<&WidgetDefinition>> = BTreeMap::new();
        for definition in self.definitions.values() {
            groups.entry(definition.category).or_default().push(definition);
        }
        groups
            .into_iter()
            .map(|(category, widgets)| CategoryGroup { category, widgets })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_widget_type_is_registered() {
        let registry = WidgetRegistry::global();
        for widget_type in WidgetType::ALL {
            let definition = registry.lookup(widget_type.tag()).unwrap();
            assert_eq!(definition.widget_type, widget_type);
            assert!(definition.min_size.w <= definition.default_size.w);
            assert!(definition.min_size.h <= definition.default_size.h);
        }
    }

    #[test]
    fn test_lookup_unknown_tag() {
        assert!(WidgetRegistry::global().lookup("unknown-type").is_none());
        assert!(WidgetRegistry::global().lookup("").is_none());
    }

    #[test]
    fn test_default_sizes_used_by_placement() {
        let registry = WidgetRegistry::global();
        assert_eq!(registry.lookup("metric").unwrap().default_size, GridSize::new(4, 3));
        assert_eq!(registry.lookup("activity").unwrap().default_size, GridSize::new(4, 5));
    }

    #[test]
    fn test_by_category_groups_everything_once() {
        let groups = WidgetRegistry::global().by_category();
        let categories: Vec<_> = groups.iter().map(|g| g.category).collect();
        assert_eq!(
            categories,
            vec![
                WidgetCategory::Insights,
                WidgetCategory::Work,
                WidgetCategory::Shortcuts
            ]
        );
        let total: usize = groups.iter().map(|g| g.widgets.len()).sum();
        assert_eq!(total, WidgetType::ALL.len());
        assert!(groups.iter().all(|g| g.widgets.iter().all(|w| w.category == g.category)));
    }
}
