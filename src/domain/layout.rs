// Grid layout domain model
use super::widget::WidgetId;
use serde::{Deserialize, Serialize};

/// Size of a widget in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub w: u32,
    pub h: u32,
}

impl GridSize {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// Position and size of one widget instance on the dashboard grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    pub widget_id: WidgetId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl LayoutEntry {
    pub fn new(widget_id: WidgetId, x: u32, y: u32, size: GridSize) -> Self {
        let mut entry = Self {
            widget_id,
            x,
            y,
            w: size.w,
            h: size.h,
        };
        entry.clamp_size();
        entry
    }

    /// Entries decoded from the wire bypass `new`; widths and heights are at least 1 unit.
    pub fn clamp_size(&mut self) {
        self.w = self.w.max(1);
        self.h = self.h.max(1);
    }

    /// Row just below this entry, pinned at the last grid row.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    #[cfg(test)]
    pub fn size(&self) -> GridSize {
        GridSize::new(self.w, self.h)
    }
}
