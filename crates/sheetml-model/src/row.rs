use std::collections::BTreeMap;

use crate::cell::{next_serial, Cell, CellError, EXCEL_MAX_COLS};
use crate::outline::MAX_OUTLINE_LEVEL;
use crate::CellRef;

/// Twips per point (row heights are stored in twips).
pub const TWIPS_PER_POINT: i32 = 20;

/// Height value meaning "not set; use the sheet default".
pub const UNSET_HEIGHT: i16 = -1;

/// Errors raised by row property setters.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("row height {0} is not a valid height (use -1 to reset)")]
    InvalidHeight(f64),
    #[error("outline level {0} exceeds the maximum of 7")]
    OutlineLevel(u8),
}

/// A sparse row of cells, ordered by column.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    index: u32,
    serial: u64,
    cells: BTreeMap<u32, Cell>,
    /// Height in twips; `None` means the sheet default applies.
    height_twips: Option<u16>,
    hidden: bool,
    collapsed: bool,
    outline_level: u8,
    style_id: Option<u32>,
}

impl Row {
    pub(crate) fn new(index: u32) -> Self {
        Self {
            index,
            serial: next_serial(),
            cells: BTreeMap::new(),
            height_twips: None,
            hidden: false,
            collapsed: false,
            outline_level: 0,
            style_id: None,
        }
    }

    /// 0-based row index.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    /// Move the row (and every cell's self-reported address) to `index`.
    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
        for cell in self.cells.values_mut() {
            cell.set_address(CellRef::new(index, cell.col()));
        }
    }

    pub fn cell(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    pub fn cell_mut(&mut self, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    /// Cells in strictly increasing column order.
    pub fn cells(&self) -> impl DoubleEndedIterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn cells_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Cell> {
        self.cells.values_mut()
    }

    /// Lowest populated column, or `None` for an empty row.
    pub fn first_cell_num(&self) -> Option<u32> {
        self.cells.keys().next().copied()
    }

    /// Highest populated column (inclusive), or `None` for an empty row.
    pub fn last_cell_num(&self) -> Option<u32> {
        self.cells.keys().next_back().copied()
    }

    pub fn physical_number_of_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Height in twips, or `None` when unset.
    pub fn height(&self) -> Option<u16> {
        self.height_twips
    }

    pub fn height_in_points(&self) -> Option<f32> {
        self.height_twips.map(|t| f32::from(t) / TWIPS_PER_POINT as f32)
    }

    pub fn has_custom_height(&self) -> bool {
        self.height_twips.is_some()
    }

    /// Set the height in twips; [`UNSET_HEIGHT`] restores the sheet default.
    pub fn set_height(&mut self, twips: i16) -> Result<(), RowError> {
        match twips {
            UNSET_HEIGHT => self.height_twips = None,
            t if t < 0 => return Err(RowError::InvalidHeight(f64::from(t))),
            t => self.height_twips = Some(t as u16),
        }
        Ok(())
    }

    /// Set the height in points; `-1.0` restores the sheet default.
    pub fn set_height_in_points(&mut self, points: f32) -> Result<(), RowError> {
        if points == -1.0 {
            self.height_twips = None;
            return Ok(());
        }
        let twips = (f64::from(points) * f64::from(TWIPS_PER_POINT)).round();
        if !(0.0..=f64::from(i16::MAX)).contains(&twips) {
            return Err(RowError::InvalidHeight(f64::from(points)));
        }
        self.height_twips = Some(twips as u16);
        Ok(())
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Zero height (hidden) flag.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    pub fn outline_level(&self) -> u8 {
        self.outline_level
    }

    pub fn set_outline_level(&mut self, level: u8) -> Result<(), RowError> {
        if level > MAX_OUTLINE_LEVEL {
            return Err(RowError::OutlineLevel(level));
        }
        self.outline_level = level;
        Ok(())
    }

    /// Row-level default style (`customFormat`), if any.
    pub fn style_id(&self) -> Option<u32> {
        self.style_id
    }

    pub fn set_style_id(&mut self, style_id: Option<u32>) {
        self.style_id = style_id;
    }

    /// Row carries nothing worth writing: no cells and default properties.
    pub(crate) fn is_default(&self) -> bool {
        self.cells.is_empty()
            && self.height_twips.is_none()
            && !self.hidden
            && !self.collapsed
            && self.outline_level == 0
            && self.style_id.is_none()
    }

    /// Create an empty cell at `col`, replacing (and discarding) any cell there.
    ///
    /// A member of a multi-cell array group cannot be replaced.
    pub fn create_cell(&mut self, col: u32) -> Result<&mut Cell, CellError> {
        if col >= EXCEL_MAX_COLS {
            return Err(CellError::ColumnOutOfBounds(col));
        }
        if let Some(existing) = self.cells.get(&col) {
            existing.ensure_not_in_multi_cell_array()?;
        }
        let slot = self.cell_entry(col);
        *slot = Cell::new(slot.address());
        Ok(slot)
    }

    /// The cell at `col`, created empty if absent.
    pub fn cell_mut_or_create(&mut self, col: u32) -> Result<&mut Cell, CellError> {
        if col >= EXCEL_MAX_COLS {
            return Err(CellError::ColumnOutOfBounds(col));
        }
        Ok(self.cell_entry(col))
    }

    /// Remove and return the cell at `col`. Handles to it become stale.
    ///
    /// A member of a multi-cell array group cannot be removed on its own.
    pub fn remove_cell(&mut self, col: u32) -> Result<Option<Cell>, CellError> {
        if let Some(existing) = self.cells.get(&col) {
            existing.ensure_not_in_multi_cell_array()?;
        }
        Ok(self.cells.remove(&col))
    }

    pub(crate) fn cells_in(
        &self,
        cols: std::ops::RangeInclusive<u32>,
    ) -> impl DoubleEndedIterator<Item = &Cell> {
        self.cells.range(cols).map(|(_, cell)| cell)
    }

    pub(crate) fn insert_cell(&mut self, cell: Cell) -> Option<Cell> {
        self.cells.insert(cell.col(), cell)
    }

    pub(crate) fn take_cell(&mut self, col: u32) -> Option<Cell> {
        self.cells.remove(&col)
    }

    pub(crate) fn cell_entry(&mut self, col: u32) -> &mut Cell {
        let row = self.index;
        self.cells
            .entry(col)
            .or_insert_with(|| Cell::new(CellRef::new(row, col)))
    }

    /// Properties only (no cells), with a fresh identity.
    pub(crate) fn duplicate_properties(&self, index: u32) -> Self {
        Self {
            index,
            serial: next_serial(),
            cells: BTreeMap::new(),
            height_twips: self.height_twips,
            hidden: self.hidden,
            collapsed: self.collapsed,
            outline_level: self.outline_level,
            style_id: self.style_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_row_has_no_first_or_last_cell() {
        let mut row = Row::new(0);
        assert_eq!(row.first_cell_num(), None);
        assert_eq!(row.last_cell_num(), None);

        row.cell_entry(5);
        row.cell_entry(2);
        assert_eq!(row.first_cell_num(), Some(2));
        assert_eq!(row.last_cell_num(), Some(5));

        row.remove_cell(5).unwrap();
        assert_eq!(row.last_cell_num(), Some(2));
        row.remove_cell(2).unwrap();
        assert_eq!(row.first_cell_num(), None);
    }

    #[test]
    fn create_cell_replaces_prior_value_and_style() {
        let mut row = Row::new(0);
        let cell = row.create_cell(1).unwrap();
        cell.set_value(4.0).unwrap();
        cell.set_style_id(2);

        let replaced = row.create_cell(1).unwrap();
        assert!(replaced.value().is_blank());
        assert_eq!(replaced.style_id(), 0);
        assert_eq!(row.physical_number_of_cells(), 1);
        assert!(row.create_cell(EXCEL_MAX_COLS).is_err());
    }

    #[test]
    fn height_converts_twips_and_points() {
        let mut row = Row::new(3);
        row.set_height_in_points(20.0).unwrap();
        assert_eq!(row.height(), Some(400));
        row.set_height(300).unwrap();
        assert_eq!(row.height_in_points(), Some(15.0));
        row.set_height(UNSET_HEIGHT).unwrap();
        assert_eq!(row.height(), None);
        assert!(row.set_height(-5).is_err());
    }

    #[test]
    fn reindexing_updates_cell_addresses() {
        let mut row = Row::new(1);
        row.cell_entry(0);
        row.set_index(7);
        assert_eq!(row.cell(0).unwrap().address(), CellRef::new(7, 0));
    }
}
