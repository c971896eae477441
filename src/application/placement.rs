// Grid placement engine
use crate::domain::layout::{GridSize, LayoutEntry};
use crate::domain::widget::WidgetId;

/// Place a new widget at column 0 directly below everything already on the grid.
///
/// Deterministic and O(n); it never fills gaps beside shorter widgets and does not
/// repair overlaps introduced by free-form drag or resize.
pub fn compute_placement(existing: &[LayoutEntry], widget_id: WidgetId, size: GridSize) -> LayoutEntry {
    let row = existing.iter().map(LayoutEntry::bottom).max().unwrap_or(0);
    LayoutEntry::new(widget_id, 0, row, size)
}
