// Edit session - copy-on-write pending buffer for one dashboard
use crate::application::error::SessionError;
use crate::application::placement::compute_placement;
use crate::domain::dashboard::{Dashboard, DashboardContent, DashboardId};
use crate::domain::layout::{GridSize, LayoutEntry};
use crate::domain::registry::WidgetRegistry;
use crate::domain::widget::{WidgetId, WidgetInstance};
use crate::domain::widget_config::WidgetConfig;
use std::collections::HashSet;

/// Size given to a retired widget that lost its layout entry; it is never rendered.
const RETIRED_WIDGET_SIZE: GridSize = GridSize::new(1, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Editing,
    /// The reconciled buffer has been handed to persistence and the outcome is pending.
    Saving,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    dashboard_id: DashboardId,
    pending: DashboardContent,
    phase: SessionPhase,
}

impl EditSession {
    /// Snapshot the dashboard's committed widgets and layout into a fresh buffer.
    /// Widgets that have never been placed (template dashboards) are placed now.
    pub fn enter(dashboard: &Dashboard, registry: &WidgetRegistry) -> Self {
        let mut pending = dashboard.content.clone();
        place_unplaced(&mut pending, registry);

        Self {
            dashboard_id: dashboard.id.clone(),
            pending,
            phase: SessionPhase::Editing,
        }
    }

    pub fn dashboard_id(&self) -> &DashboardId {
        &self.dashboard_id
    }

    pub fn pending(&self) -> &DashboardContent {
        &self.pending
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Editing => Ok(()),
            SessionPhase::Saving => Err(SessionError::SaveInFlight(self.dashboard_id.clone())),
        }
    }

    /// Add an unconfigured widget below everything else. Unknown type tags are ignored.
    pub fn add_widget(
        &mut self,
        registry: &WidgetRegistry,
        type_tag: &str,
    ) -> Result<Option<WidgetId>, SessionError> {
        self.ensure_idle()?;

        let Some(definition) = registry.lookup(type_tag) else {
            tracing::warn!(
                "Ignoring add of unknown widget type '{}' on dashboard {}",
                type_tag,
                self.dashboard_id
            );
            return Ok(None);
        };

        let id = self.fresh_widget_id();
        let entry = compute_placement(&self.pending.layout, id.clone(), definition.default_size);
        tracing::debug!(
            "Adding {} widget {} at ({}, {}) on dashboard {}",
            definition.widget_type,
            id,
            entry.x,
            entry.y,
            self.dashboard_id
        );

        self.pending
            .widgets
            .push(WidgetInstance::new(id.clone(), definition.widget_type));
        self.pending.layout.push(entry);
        Ok(Some(id))
    }

    fn fresh_widget_id(&self) -> WidgetId {
        loop {
            let id = WidgetId::generate();
            let taken = self.pending.widgets.iter().any(|w| w.id == id)
                || self.pending.layout.iter().any(|l| l.widget_id == id);
            if !taken {
                return id;
            }
        }
    }

    /// Remove a widget together with its layout entry. Returns whether anything was removed.
    pub fn remove_widget(&mut self, id: &WidgetId) -> Result<bool, SessionError> {
        self.ensure_idle()?;

        let before = (self.pending.widgets.len(), self.pending.layout.len());
        self.pending.widgets.retain(|w| &w.id != id);
        self.pending.layout.retain(|l| &l.widget_id != id);
        let removed = before != (self.pending.widgets.len(), self.pending.layout.len());

        if removed {
            tracing::debug!("Removed widget {} from dashboard {}", id, self.dashboard_id);
        } else {
            tracing::warn!(
                "Widget {} not found on dashboard {}, nothing to remove",
                id,
                self.dashboard_id
            );
        }
        Ok(removed)
    }

    /// Replace a widget's config. Returns whether it was applied.
    pub fn set_widget_config(
        &mut self,
        id: &WidgetId,
        config: WidgetConfig,
    ) -> Result<bool, SessionError> {
        self.ensure_idle()?;

        let Some(instance) = self.pending.widgets.iter_mut().find(|w| &w.id == id) else {
            tracing::warn!(
                "Widget {} not found on dashboard {}, config dropped",
                id,
                self.dashboard_id
            );
            return Ok(false);
        };

        match instance.set_config(config) {
            Ok(()) => {
                tracing::debug!("Configured widget {} on dashboard {}", id, self.dashboard_id);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Rejected config for widget {}: {}", id, e);
                Ok(false)
            }
        }
    }

    /// Replace the whole pending layout. The widget/layout bijection is only restored on save.
    pub fn set_layout(&mut self, mut layout: Vec<LayoutEntry>) -> Result<(), SessionError> {
        self.ensure_idle()?;
        layout.iter_mut().for_each(LayoutEntry::clamp_size);
        tracing::debug!(
            "Replacing layout of dashboard {} ({} entries)",
            self.dashboard_id,
            layout.len()
        );
        self.pending.layout = layout;
        Ok(())
    }

    /// Reconcile the buffer and mark the session as saving. Returns what to submit.
    pub fn begin_save(&mut self, registry: &WidgetRegistry) -> Result<DashboardContent, SessionError> {
        self.ensure_idle()?;
        reconcile(&mut self.pending, registry);
        self.phase = SessionPhase::Saving;
        Ok(self.pending.clone())
    }

    /// Return to editing after a failed submission; the buffer is untouched.
    pub fn abort_save(&mut self) {
        self.phase = SessionPhase::Editing;
    }
}

/// Restore the widget/layout bijection: drop orphaned and duplicate layout entries, then
/// place widgets that have no entry at the bottom of the grid, in widget order.
pub fn reconcile(content: &mut DashboardContent, registry: &WidgetRegistry) {
    let widget_ids: HashSet<WidgetId> = content.widgets.iter().map(|w| w.id.clone()).collect();
    let mut seen = HashSet::new();
    let before = content.layout.len();
    content
        .layout
        .retain(|l| widget_ids.contains(&l.widget_id) && seen.insert(l.widget_id.clone()));
    if content.layout.len() != before {
        tracing::debug!("Dropped {} orphaned layout entries", before - content.layout.len());
    }
    content.layout.iter_mut().for_each(LayoutEntry::clamp_size);

    place_unplaced(content, registry);
}

fn place_unplaced(content: &mut DashboardContent, registry: &WidgetRegistry) {
    let placed: HashSet<WidgetId> = content.layout.iter().map(|l| l.widget_id.clone()).collect();
    let unplaced: Vec<(WidgetId, GridSize)> = content
        .widgets
        .iter()
        .filter(|w| !placed.contains(&w.id))
        .map(|w| {
            let size = w
                .widget_type()
                .and_then(|t| registry.get(t))
                .map(|d| d.default_size)
                .unwrap_or(RETIRED_WIDGET_SIZE);
            (w.id.clone(), size)
        })
        .collect();

    for (id, size) in unplaced {
        let entry = compute_placement(&content.layout, id, size);
        tracing::debug!("Placed widget {} at row {}", entry.widget_id, entry.y);
        content.layout.push(entry);
    }
}
