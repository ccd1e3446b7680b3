//! Window settings of a worksheet (`sheetView`).

use serde::{Deserialize, Serialize};

use crate::CellRef;

/// Smallest and largest zoom percentages a sheet view accepts.
pub const MIN_ZOOM: u16 = 10;
pub const MAX_ZOOM: u16 = 400;

/// One of the four quadrants a split or frozen window can have.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanePosition {
    #[default]
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl PanePosition {
    pub fn to_ooxml(self) -> &'static str {
        match self {
            PanePosition::TopLeft => "topLeft",
            PanePosition::TopRight => "topRight",
            PanePosition::BottomLeft => "bottomLeft",
            PanePosition::BottomRight => "bottomRight",
        }
    }

    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "topLeft" => Some(PanePosition::TopLeft),
            "topRight" => Some(PanePosition::TopRight),
            "bottomLeft" => Some(PanePosition::BottomLeft),
            "bottomRight" => Some(PanePosition::BottomRight),
            _ => None,
        }
    }
}

/// A frozen or split window (`pane`).
///
/// For frozen panes the splits count whole columns and rows. For split panes
/// they are positions in twentieths of a point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    pub x_split: f64,
    pub y_split: f64,
    /// First visible cell of the bottom-right quadrant.
    pub top_left_cell: CellRef,
    pub active_pane: PanePosition,
    pub frozen: bool,
}

impl Pane {
    /// Freeze `cols` columns and `rows` rows. The active quadrant is the one
    /// that scrolls in both directions that are frozen.
    pub fn frozen(cols: u32, rows: u32, top_left_cell: CellRef) -> Self {
        let active_pane = match (cols > 0, rows > 0) {
            (true, true) => PanePosition::BottomRight,
            (false, true) => PanePosition::BottomLeft,
            (true, false) => PanePosition::TopRight,
            (false, false) => PanePosition::TopLeft,
        };
        Self {
            x_split: f64::from(cols),
            y_split: f64::from(rows),
            top_left_cell,
            active_pane,
            frozen: true,
        }
    }

    pub fn split(
        x_split: f64,
        y_split: f64,
        top_left_cell: CellRef,
        active_pane: PanePosition,
    ) -> Self {
        Self {
            x_split,
            y_split,
            top_left_cell,
            active_pane,
            frozen: false,
        }
    }

    /// Frozen column count; `None` for split panes.
    pub fn frozen_columns(&self) -> Option<u32> {
        self.frozen.then_some(self.x_split as u32)
    }

    pub fn frozen_rows(&self) -> Option<u32> {
        self.frozen.then_some(self.y_split as u32)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetView {
    pub show_grid_lines: bool,
    /// Show formulas instead of their results.
    pub show_formulas: bool,
    pub show_row_col_headers: bool,
    /// Percent, 10..=400.
    pub zoom_scale: u16,
    /// Cell shown in the top-left corner of the window.
    pub top_left_cell: Option<CellRef>,
    pub active_cell: Option<CellRef>,
    pub pane: Option<Pane>,
}

impl Default for SheetView {
    fn default() -> Self {
        Self {
            show_grid_lines: true,
            show_formulas: false,
            show_row_col_headers: true,
            zoom_scale: 100,
            top_left_cell: None,
            active_cell: None,
            pane: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_panes_pick_the_scrolling_quadrant() {
        let pane = Pane::frozen(0, 3, CellRef::new(3, 0));
        assert_eq!(pane.active_pane, PanePosition::BottomLeft);
        assert_eq!(pane.frozen_rows(), Some(3));
        assert_eq!(pane.frozen_columns(), Some(0));

        assert_eq!(
            Pane::frozen(2, 0, CellRef::new(0, 2)).active_pane,
            PanePosition::TopRight
        );
        let split = Pane::split(1500.0, 0.0, CellRef::new(0, 4), PanePosition::TopRight);
        assert_eq!(split.frozen_columns(), None);
    }

    #[test]
    fn pane_positions_use_ooxml_names() {
        for pos in [
            PanePosition::TopLeft,
            PanePosition::TopRight,
            PanePosition::BottomLeft,
            PanePosition::BottomRight,
        ] {
            assert_eq!(PanePosition::from_ooxml(pos.to_ooxml()), Some(pos));
        }
        assert_eq!(PanePosition::from_ooxml("middle"), None);
    }
}
