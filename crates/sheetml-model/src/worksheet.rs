use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellError, EXCEL_MAX_COLS, EXCEL_MAX_ROWS};
use crate::comments::Comment;
use crate::header_footer::HeaderFooterSettings;
use crate::hyperlinks::Hyperlink;
use crate::merge::MergedRegions;
use crate::outline::{OutlinePr, MAX_OUTLINE_LEVEL};
use crate::print_settings::{PageMargins, PageSetup, PrintOptions};
use crate::row::{Row, RowError};
use crate::shared_strings::SharedStringTable;
use crate::table::{Table, TableError};
use crate::value::{RichText, StringValue};
use crate::view::{Pane, PanePosition, SheetView, MAX_ZOOM, MIN_ZOOM};
use crate::{CellRef, CellValue, Range};

/// Identifier for a worksheet, stable across renames and reordering.
pub type WorksheetId = u32;

/// Row height used when a row has no explicit height.
pub const DEFAULT_ROW_HEIGHT_POINTS: f32 = 15.0;

/// Column width (in characters of the default font) when none is set.
pub const DEFAULT_COLUMN_WIDTH: f32 = 8.43;

/// Sheet tab visibility.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    /// Hidden and not listed in the "Unhide" dialog.
    VeryHidden,
}

impl SheetVisibility {
    /// Value of the `state` attribute; `None` for visible sheets.
    pub fn to_ooxml(self) -> Option<&'static str> {
        match self {
            SheetVisibility::Visible => None,
            SheetVisibility::Hidden => Some("hidden"),
            SheetVisibility::VeryHidden => Some("veryHidden"),
        }
    }

    pub fn from_ooxml(state: Option<&str>) -> Self {
        match state {
            Some("hidden") => SheetVisibility::Hidden,
            Some("veryHidden") => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }
}

/// Per-column properties (`<col>`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnProps {
    /// Width in characters of the default font.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<u32>,
    #[serde(default)]
    pub outline_level: u8,
    #[serde(default)]
    pub collapsed: bool,
}

impl ColumnProps {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Stable reference to a cell that survives shifts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellHandle(u64);

/// Stable reference to a row that survives shifts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowHandle(u64);

/// Errors raised by worksheet operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SheetError {
    #[error("handle refers to a cell or row that no longer exists")]
    StaleHandle,
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error(transparent)]
    Row(#[from] RowError),
    #[error("row index {0} is outside the sheet grid")]
    RowOutOfBounds(u32),
    #[error("column index {0} is outside the sheet grid")]
    ColumnOutOfBounds(u32),
    #[error("merged region {0} must span at least two cells")]
    MergedRegionTooSmall(Range),
    #[error("merged region {new} overlaps existing merged region {existing}")]
    MergedRegionOverlap { existing: Range, new: Range },
    #[error("range {range} intersects multi-cell array formula {array}")]
    ArrayFormulaIntersects { range: Range, array: Range },
    #[error("cell {0} is not part of an array formula")]
    NotArrayFormula(CellRef),
    #[error("row {row} contains cells of multi-cell array formula {array}")]
    RowInArrayFormula { row: u32, array: Range },
    #[error("invalid shift band {first}..={last}")]
    InvalidShiftBand { first: u32, last: u32 },
    #[error("shift would overwrite {what} at {at} outside the shifted band")]
    ShiftCollision { what: &'static str, at: Range },
    #[error("shift would split {what} {range} at the band boundary")]
    ShiftSplitsRange { what: &'static str, range: Range },
    #[error("shift would move {what} {range} beyond the sheet grid")]
    ShiftOutOfBounds { what: &'static str, range: Range },
    #[error("zoom {0}% is outside 10..=400")]
    InvalidZoom(u16),
}

/// A worksheet: sparse rows of cells plus sheet-level structures.
#[derive(Clone, Debug)]
pub struct Worksheet {
    id: WorksheetId,
    name: String,
    visibility: SheetVisibility,
    rows: BTreeMap<u32, Row>,
    /// Multi-cell array groups, keyed by anchor (top-left) cell.
    array_groups: BTreeMap<CellRef, Range>,
    merged: MergedRegions,
    hyperlinks: Vec<Hyperlink>,
    comments: BTreeMap<CellRef, Comment>,
    tables: Vec<Table>,
    columns: BTreeMap<u32, ColumnProps>,
    row_breaks: BTreeSet<u32>,
    col_breaks: BTreeSet<u32>,
    pub header_footer: HeaderFooterSettings,
    pub default_row_height_points: f32,
    pub default_column_width: Option<f32>,
    /// Tab shown as selected in the window.
    pub tab_selected: bool,
    pub view: SheetView,
    pub page_margins: PageMargins,
    pub page_setup: PageSetup,
    pub print_options: PrintOptions,
    pub outline: OutlinePr,
    tracked_cells: HashMap<u64, CellRef>,
    tracked_rows: HashMap<u64, u32>,
}

impl Worksheet {
    pub fn new(id: WorksheetId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visibility: SheetVisibility::Visible,
            rows: BTreeMap::new(),
            array_groups: BTreeMap::new(),
            merged: MergedRegions::new(),
            hyperlinks: Vec::new(),
            comments: BTreeMap::new(),
            tables: Vec::new(),
            columns: BTreeMap::new(),
            row_breaks: BTreeSet::new(),
            col_breaks: BTreeSet::new(),
            header_footer: HeaderFooterSettings::default(),
            default_row_height_points: DEFAULT_ROW_HEIGHT_POINTS,
            default_column_width: None,
            tab_selected: false,
            view: SheetView::default(),
            page_margins: PageMargins::default(),
            page_setup: PageSetup::default(),
            print_options: PrintOptions::default(),
            outline: OutlinePr::default(),
            tracked_cells: HashMap::new(),
            tracked_rows: HashMap::new(),
        }
    }

    pub fn id(&self) -> WorksheetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn visibility(&self) -> SheetVisibility {
        self.visibility
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility != SheetVisibility::Visible
    }

    /// Workbook-level rules (last visible sheet, active tab) are enforced by
    /// [`crate::Workbook::set_sheet_visibility`].
    pub(crate) fn set_visibility(&mut self, visibility: SheetVisibility) {
        self.visibility = visibility;
    }

    // ---- rows ---------------------------------------------------------------

    /// Create an empty row at `index`, replacing any existing row there.
    pub fn create_row(&mut self, index: u32) -> Result<&mut Row, SheetError> {
        check_row(index)?;
        if let Some(existing) = self.rows.get(&index) {
            ensure_row_outside_arrays(existing)?;
        }
        let slot = self.rows.entry(index).or_insert_with(|| Row::new(index));
        *slot = Row::new(index);
        Ok(slot)
    }

    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows.get_mut(&index)
    }

    pub fn row_mut_or_create(&mut self, index: u32) -> Result<&mut Row, SheetError> {
        check_row(index)?;
        Ok(self.rows.entry(index).or_insert_with(|| Row::new(index)))
    }

    /// Remove a row and its cells. Rows holding part of a multi-cell array
    /// formula cannot be removed.
    pub fn remove_row(&mut self, index: u32) -> Result<Option<Row>, SheetError> {
        if let Some(existing) = self.rows.get(&index) {
            ensure_row_outside_arrays(existing)?;
        }
        Ok(self.rows.remove(&index))
    }

    /// Rows in strictly increasing index order.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &Row> {
        self.rows.values()
    }

    pub fn rows_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Row> {
        self.rows.values_mut()
    }

    /// Lowest row index present, or `None` for a sheet without rows.
    pub fn first_row_num(&self) -> Option<u32> {
        self.rows.keys().next().copied()
    }

    pub fn last_row_num(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    pub fn physical_number_of_rows(&self) -> usize {
        self.rows.len()
    }

    /// Height of `index` in points, falling back to the sheet default.
    pub fn row_height_points(&self, index: u32) -> f32 {
        self.rows
            .get(&index)
            .and_then(Row::height_in_points)
            .unwrap_or(self.default_row_height_points)
    }

    // ---- cells --------------------------------------------------------------

    pub fn cell(&self, cell: CellRef) -> Option<&Cell> {
        self.rows.get(&cell.row)?.cell(cell.col)
    }

    pub fn cell_mut(&mut self, cell: CellRef) -> Option<&mut Cell> {
        self.rows.get_mut(&cell.row)?.cell_mut(cell.col)
    }

    /// The cell at `cell`, creating its row and the cell as needed.
    pub fn cell_mut_or_create(&mut self, cell: CellRef) -> Result<&mut Cell, SheetError> {
        check_cell(cell)?;
        let row = self.row_mut_or_create(cell.row)?;
        Ok(row.cell_mut_or_create(cell.col)?)
    }

    /// Create an empty cell, discarding any previous value and style there.
    pub fn create_cell(&mut self, cell: CellRef) -> Result<&mut Cell, SheetError> {
        check_cell(cell)?;
        if let Some(existing) = self.cell(cell) {
            existing.ensure_not_in_multi_cell_array()?;
        }
        let row = self.row_mut_or_create(cell.row)?;
        Ok(row.create_cell(cell.col)?)
    }

    pub fn remove_cell(&mut self, cell: CellRef) -> Result<Option<Cell>, SheetError> {
        match self.rows.get_mut(&cell.row) {
            Some(row) => Ok(row.remove_cell(cell.col)?),
            None => Ok(None),
        }
    }

    /// Every cell, row-major.
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.values().flat_map(Row::cells)
    }

    /// Set a plain value.
    ///
    /// On the anchor of a multi-cell array group the whole group is dissolved
    /// first; other members of such a group are rejected.
    pub fn set_value(
        &mut self,
        cell: CellRef,
        value: impl Into<CellValue>,
    ) -> Result<&mut Cell, SheetError> {
        check_cell(cell)?;
        if let Some(group) = self.multi_cell_group_of(cell)? {
            self.dissolve_array_group(group);
        }
        let target = self.cell_mut_or_create(cell)?;
        target.set_value(value)?;
        Ok(target)
    }

    /// Set or clear a cell formula (see [`Cell::set_formula`]).
    pub fn set_formula(
        &mut self,
        cell: CellRef,
        formula: Option<&str>,
    ) -> Result<&mut Cell, SheetError> {
        check_cell(cell)?;
        if let Some(existing) = self.cell(cell) {
            existing.ensure_not_in_multi_cell_array()?;
        }
        let target = self.cell_mut_or_create(cell)?;
        target.set_formula(formula)?;
        Ok(target)
    }

    /// Set a string value: interned when a shared string table is supplied,
    /// stored inline otherwise.
    pub fn set_string(
        &mut self,
        cell: CellRef,
        text: impl Into<RichText>,
        strings: Option<&mut SharedStringTable>,
    ) -> Result<&mut Cell, SheetError> {
        check_cell(cell)?;
        self.multi_cell_group_of(cell)?;
        let value = match strings {
            Some(table) => StringValue::Shared(table.intern(text)),
            None => StringValue::Inline(text.into()),
        };
        self.set_value(cell, CellValue::String(value))
    }

    /// Text of a string cell (shared entries resolved through `strings`).
    pub fn cell_text<'a>(
        &'a self,
        cell: CellRef,
        strings: Option<&'a SharedStringTable>,
    ) -> Option<&'a RichText> {
        match self.cell(cell)?.value() {
            CellValue::String(s) => s.resolve(strings),
            _ => None,
        }
    }

    // ---- handles ------------------------------------------------------------

    /// A handle to the cell currently at `cell`, if one exists.
    pub fn cell_handle(&mut self, cell: CellRef) -> Option<CellHandle> {
        let serial = self.cell(cell)?.serial();
        self.tracked_cells.insert(serial, cell);
        Some(CellHandle(serial))
    }

    pub fn resolve_cell(&self, handle: CellHandle) -> Result<&Cell, SheetError> {
        let at = *self
            .tracked_cells
            .get(&handle.0)
            .ok_or(SheetError::StaleHandle)?;
        self.cell(at)
            .filter(|cell| cell.serial() == handle.0)
            .ok_or(SheetError::StaleHandle)
    }

    pub fn resolve_cell_mut(&mut self, handle: CellHandle) -> Result<&mut Cell, SheetError> {
        let at = *self
            .tracked_cells
            .get(&handle.0)
            .ok_or(SheetError::StaleHandle)?;
        self.cell_mut(at)
            .filter(|cell| cell.serial() == handle.0)
            .ok_or(SheetError::StaleHandle)
    }

    pub fn row_handle(&mut self, index: u32) -> Option<RowHandle> {
        let serial = self.rows.get(&index)?.serial();
        self.tracked_rows.insert(serial, index);
        Some(RowHandle(serial))
    }

    pub fn resolve_row(&self, handle: RowHandle) -> Result<&Row, SheetError> {
        let at = *self
            .tracked_rows
            .get(&handle.0)
            .ok_or(SheetError::StaleHandle)?;
        self.rows
            .get(&at)
            .filter(|row| row.serial() == handle.0)
            .ok_or(SheetError::StaleHandle)
    }

    pub fn resolve_row_mut(&mut self, handle: RowHandle) -> Result<&mut Row, SheetError> {
        let at = *self
            .tracked_rows
            .get(&handle.0)
            .ok_or(SheetError::StaleHandle)?;
        self.rows
            .get_mut(&at)
            .filter(|row| row.serial() == handle.0)
            .ok_or(SheetError::StaleHandle)
    }

    // ---- array formulas -----------------------------------------------------

    /// Put `formula` on `range` as one array group and return the member
    /// cells in row-major order. Only the top-left cell carries the text.
    pub fn set_array_formula(
        &mut self,
        formula: &str,
        range: Range,
    ) -> Result<Vec<&Cell>, SheetError> {
        let text = formula.trim();
        let text = text.strip_prefix('=').unwrap_or(text).trim();
        if text.is_empty() {
            return Err(CellError::EmptyFormula.into());
        }
        check_cell(range.end)?;
        if let Some(existing) = self
            .array_groups
            .values()
            .find(|existing| existing.intersects(&range) && **existing != range)
        {
            return Err(SheetError::ArrayFormulaIntersects {
                range,
                array: *existing,
            });
        }

        if range.is_single_cell() {
            self.array_groups.remove(&range.start);
        } else {
            self.array_groups.insert(range.start, range);
        }
        for at in range.cells() {
            let row = self.rows.entry(at.row).or_insert_with(|| Row::new(at.row));
            let anchor_text = (at == range.start).then(|| text.to_string());
            row.cell_entry(at.col).join_array_group(range, anchor_text);
        }
        Ok(range.cells().filter_map(|at| self.cell(at)).collect())
    }

    /// Dissolve the array group containing `cell`; members become blank.
    pub fn remove_array_formula(&mut self, cell: CellRef) -> Result<Vec<&Cell>, SheetError> {
        let range = self
            .cell(cell)
            .and_then(Cell::array_formula_range)
            .ok_or(SheetError::NotArrayFormula(cell))?;
        for at in range.cells() {
            if let Some(member) = self.cell_mut(at) {
                member.clear_array_membership();
                member.replace_formula_unchecked(None);
                member.set_cached_value(CellValue::Blank);
            }
        }
        self.array_groups.remove(&range.start);
        Ok(range.cells().filter_map(|at| self.cell(at)).collect())
    }

    /// The top-left cell of the array group `cell` belongs to.
    pub fn first_cell_in_array_formula(&self, cell: CellRef) -> Result<&Cell, SheetError> {
        let range = self
            .cell(cell)
            .and_then(Cell::array_formula_range)
            .ok_or(SheetError::NotArrayFormula(cell))?;
        self.cell(range.start)
            .ok_or(SheetError::NotArrayFormula(cell))
    }

    /// `(range, formula)` of every array group, anchors in row-major order.
    pub fn array_formulas(&self) -> Vec<(Range, &str)> {
        self.iter_cells()
            .filter(|cell| cell.is_array_formula_anchor())
            .filter_map(|cell| Some((cell.array_formula_range()?, cell.formula()?)))
            .collect()
    }

    /// The multi-cell group `cell` anchors. Errors for non-anchor members.
    fn multi_cell_group_of(&self, cell: CellRef) -> Result<Option<Range>, SheetError> {
        match self.cell(cell).and_then(Cell::array_formula_range) {
            Some(range) if !range.is_single_cell() => {
                if range.start == cell {
                    Ok(Some(range))
                } else {
                    Err(CellError::PartOfArrayFormula { cell, range }.into())
                }
            }
            _ => Ok(None),
        }
    }

    fn dissolve_array_group(&mut self, range: Range) {
        for at in range.cells() {
            if let Some(member) = self.cell_mut(at) {
                member.clear_array_membership();
            }
        }
        self.array_groups.remove(&range.start);
    }

    // ---- merged regions -----------------------------------------------------

    /// Add a merged region, rejecting single cells, overlaps with existing
    /// regions, and intersections with multi-cell array formulas.
    pub fn add_merged_region(&mut self, range: Range) -> Result<usize, SheetError> {
        if range.is_single_cell() {
            return Err(SheetError::MergedRegionTooSmall(range));
        }
        check_cell(range.end)?;
        if let Some(existing) = self.merged.find_overlap(&range) {
            return Err(SheetError::MergedRegionOverlap {
                existing,
                new: range,
            });
        }
        if let Some(array) = self.array_groups.values().find(|a| a.intersects(&range)) {
            return Err(SheetError::ArrayFormulaIntersects {
                range,
                array: *array,
            });
        }
        Ok(self.merged.push(range))
    }

    pub fn remove_merged_region(&mut self, index: usize) -> Option<Range> {
        self.merged.remove(index)
    }

    pub fn merged_region(&self, index: usize) -> Option<Range> {
        self.merged.get(index)
    }

    /// All merged regions in one borrow.
    pub fn merged_regions(&self) -> &[Range] {
        self.merged.as_slice()
    }

    pub fn num_merged_regions(&self) -> usize {
        self.merged.len()
    }

    pub fn merged_region_containing(&self, cell: CellRef) -> Option<Range> {
        self.merged
            .index_containing(cell)
            .and_then(|i| self.merged.get(i))
    }

    // ---- columns and breaks -------------------------------------------------

    pub fn column(&self, col: u32) -> Option<&ColumnProps> {
        self.columns.get(&col)
    }

    pub fn column_mut(&mut self, col: u32) -> Result<&mut ColumnProps, SheetError> {
        check_col(col)?;
        Ok(self.columns.entry(col).or_default())
    }

    /// Columns with explicit properties, in index order.
    pub fn columns(&self) -> impl Iterator<Item = (u32, &ColumnProps)> {
        self.columns.iter().map(|(col, props)| (*col, props))
    }

    /// Effective width of `col` in characters.
    pub fn column_width(&self, col: u32) -> f32 {
        self.columns
            .get(&col)
            .and_then(|c| c.width)
            .or(self.default_column_width)
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn set_column_width(&mut self, col: u32, width: f32) -> Result<(), SheetError> {
        self.column_mut(col)?.width = Some(width);
        Ok(())
    }

    pub fn set_column_hidden(&mut self, col: u32, hidden: bool) -> Result<(), SheetError> {
        self.column_mut(col)?.hidden = hidden;
        Ok(())
    }

    pub fn is_column_hidden(&self, col: u32) -> bool {
        self.columns.get(&col).is_some_and(|c| c.hidden)
    }

    /// Manual page break after row `row`.
    pub fn set_row_break(&mut self, row: u32) -> Result<(), SheetError> {
        check_row(row)?;
        self.row_breaks.insert(row);
        Ok(())
    }

    pub fn remove_row_break(&mut self, row: u32) -> bool {
        self.row_breaks.remove(&row)
    }

    pub fn is_row_broken(&self, row: u32) -> bool {
        self.row_breaks.contains(&row)
    }

    pub fn row_breaks(&self) -> impl Iterator<Item = u32> + '_ {
        self.row_breaks.iter().copied()
    }

    /// Manual page break after column `col`.
    pub fn set_column_break(&mut self, col: u32) -> Result<(), SheetError> {
        check_col(col)?;
        self.col_breaks.insert(col);
        Ok(())
    }

    pub fn remove_column_break(&mut self, col: u32) -> bool {
        self.col_breaks.remove(&col)
    }

    pub fn is_column_broken(&self, col: u32) -> bool {
        self.col_breaks.contains(&col)
    }

    pub fn column_breaks(&self) -> impl Iterator<Item = u32> + '_ {
        self.col_breaks.iter().copied()
    }

    // ---- window and outline -------------------------------------------------

    /// Freeze `cols` columns and `rows` rows; the scrolling part starts at
    /// `left_col`/`top_row`. Freezing nothing removes the pane.
    pub fn create_freeze_pane(
        &mut self,
        cols: u32,
        rows: u32,
        left_col: u32,
        top_row: u32,
    ) -> Result<(), SheetError> {
        check_cell(CellRef::new(rows, cols))?;
        let top_left = CellRef::new(top_row, left_col);
        check_cell(top_left)?;
        self.view.pane = (cols > 0 || rows > 0).then(|| Pane::frozen(cols, rows, top_left));
        Ok(())
    }

    /// Split the window at `x_split`/`y_split` twentieths of a point.
    pub fn create_split_pane(
        &mut self,
        x_split: f64,
        y_split: f64,
        left_col: u32,
        top_row: u32,
        active_pane: PanePosition,
    ) -> Result<(), SheetError> {
        let top_left = CellRef::new(top_row, left_col);
        check_cell(top_left)?;
        self.view.pane = Some(Pane::split(x_split, y_split, top_left, active_pane));
        Ok(())
    }

    pub fn remove_pane(&mut self) -> Option<Pane> {
        self.view.pane.take()
    }

    /// Zoom in percent, 10..=400.
    pub fn set_zoom(&mut self, percent: u16) -> Result<(), SheetError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&percent) {
            return Err(SheetError::InvalidZoom(percent));
        }
        self.view.zoom_scale = percent;
        Ok(())
    }

    pub fn set_active_cell(&mut self, cell: CellRef) -> Result<(), SheetError> {
        check_cell(cell)?;
        self.view.active_cell = Some(cell);
        Ok(())
    }

    /// Scroll the window so `top_row` and `left_col` are the first visible.
    pub fn show_in_pane(&mut self, top_row: u32, left_col: u32) -> Result<(), SheetError> {
        let cell = CellRef::new(top_row, left_col);
        check_cell(cell)?;
        self.view.top_left_cell = Some(cell);
        Ok(())
    }

    /// Add one outline level to rows `first..=last` (capped at 7).
    pub fn group_rows(&mut self, first: u32, last: u32) -> Result<(), SheetError> {
        let (first, last) = (first.min(last), first.max(last));
        check_row(last)?;
        for index in first..=last {
            let row = self.row_mut_or_create(index)?;
            let level = (row.outline_level() + 1).min(MAX_OUTLINE_LEVEL);
            row.set_outline_level(level)?;
        }
        Ok(())
    }

    /// Remove one outline level from rows `first..=last`.
    pub fn ungroup_rows(&mut self, first: u32, last: u32) -> Result<(), SheetError> {
        let (first, last) = (first.min(last), first.max(last));
        check_row(last)?;
        for row in self.rows.range_mut(first..=last).map(|(_, row)| row) {
            let level = row.outline_level().saturating_sub(1);
            row.set_outline_level(level)?;
            if level == 0 {
                row.set_collapsed(false);
            }
        }
        Ok(())
    }

    pub fn group_columns(&mut self, first: u32, last: u32) -> Result<(), SheetError> {
        let (first, last) = (first.min(last), first.max(last));
        check_col(last)?;
        for col in first..=last {
            let props = self.columns.entry(col).or_default();
            props.outline_level = (props.outline_level + 1).min(MAX_OUTLINE_LEVEL);
        }
        Ok(())
    }

    pub fn ungroup_columns(&mut self, first: u32, last: u32) -> Result<(), SheetError> {
        let (first, last) = (first.min(last), first.max(last));
        check_col(last)?;
        for props in self.columns.range_mut(first..=last).map(|(_, props)| props) {
            props.outline_level = props.outline_level.saturating_sub(1);
            if props.outline_level == 0 {
                props.collapsed = false;
            }
        }
        self.columns.retain(|_, props| !props.is_default());
        Ok(())
    }

    /// Deepest row outline level in use.
    pub fn max_row_outline_level(&self) -> u8 {
        self.rows
            .values()
            .map(Row::outline_level)
            .max()
            .unwrap_or(0)
    }

    pub fn max_column_outline_level(&self) -> u8 {
        self.columns
            .values()
            .map(|c| c.outline_level)
            .max()
            .unwrap_or(0)
    }

    // ---- hyperlinks, comments, tables ---------------------------------------

    pub fn add_hyperlink(&mut self, hyperlink: Hyperlink) -> Result<(), SheetError> {
        check_cell(hyperlink.range.end)?;
        self.hyperlinks.push(hyperlink);
        Ok(())
    }

    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    /// The first hyperlink whose range covers `cell`.
    pub fn hyperlink_at(&self, cell: CellRef) -> Option<&Hyperlink> {
        self.hyperlinks.iter().find(|h| h.range.contains(cell))
    }

    pub fn remove_hyperlink(&mut self, cell: CellRef) -> Option<Hyperlink> {
        let idx = self.hyperlinks.iter().position(|h| h.range.contains(cell))?;
        Some(self.hyperlinks.remove(idx))
    }

    /// Attach a comment to its cell, replacing any previous one.
    pub fn set_comment(&mut self, comment: Comment) -> Result<Option<Comment>, SheetError> {
        check_cell(comment.cell_ref)?;
        Ok(self.comments.insert(comment.cell_ref, comment))
    }

    pub fn comment(&self, cell: CellRef) -> Option<&Comment> {
        self.comments.get(&cell)
    }

    pub fn comment_mut(&mut self, cell: CellRef) -> Option<&mut Comment> {
        self.comments.get_mut(&cell)
    }

    pub fn remove_comment(&mut self, cell: CellRef) -> Option<Comment> {
        self.comments.remove(&cell)
    }

    /// Comments in row-major order of their cells.
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Workbook-wide name/id uniqueness is the caller's job.
    pub(crate) fn insert_table(&mut self, table: Table) -> Result<(), TableError> {
        self.check_table_range(table.range, None)?;
        self.tables.push(table);
        Ok(())
    }

    /// `range` fits the grid and overlaps no table other than `except`.
    pub(crate) fn check_table_range(
        &self,
        range: Range,
        except: Option<u32>,
    ) -> Result<(), TableError> {
        check_cell(range.end).map_err(|_| TableError::InvalidRange)?;
        let clash = self
            .tables
            .iter()
            .filter(|t| Some(t.id) != except)
            .find(|t| t.range.intersects(&range));
        match clash {
            Some(existing) => Err(TableError::Overlap {
                existing: existing.name.clone(),
                new: range,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn remove_table(&mut self, name: &str) -> Option<Table> {
        let idx = self
            .tables
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))?;
        Some(self.tables.remove(idx))
    }

    /// Deep copy with fresh cell/row identities and no tables.
    pub(crate) fn duplicate(&self, id: WorksheetId, name: String) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|(index, row)| {
                let mut copy = row.duplicate_properties(*index);
                for cell in row.cells() {
                    copy.insert_cell(cell.duplicate_at(cell.address()));
                }
                (*index, copy)
            })
            .collect();
        let mut copy = self.empty_copy();
        copy.id = id;
        copy.name = name;
        copy.rows = rows;
        copy
    }

    fn empty_copy(&self) -> Self {
        Self {
            id: self.id,
            name: String::new(),
            visibility: self.visibility,
            rows: BTreeMap::new(),
            array_groups: self.array_groups.clone(),
            merged: self.merged.clone(),
            hyperlinks: self.hyperlinks.clone(),
            comments: self.comments.clone(),
            tables: Vec::new(),
            columns: self.columns.clone(),
            row_breaks: self.row_breaks.clone(),
            col_breaks: self.col_breaks.clone(),
            header_footer: self.header_footer.clone(),
            default_row_height_points: self.default_row_height_points,
            default_column_width: self.default_column_width,
            tab_selected: false,
            view: self.view.clone(),
            page_margins: self.page_margins,
            page_setup: self.page_setup,
            print_options: self.print_options,
            outline: self.outline,
            tracked_cells: HashMap::new(),
            tracked_rows: HashMap::new(),
        }
    }

    // ---- shifting -----------------------------------------------------------

    /// Move rows `first..=last` by `amount` (positive = down).
    ///
    /// Cells, row properties, page breaks, merged regions, array groups,
    /// hyperlinks, comments and tables inside the band move with it. Rows
    /// pushed above row 0 are discarded. The shift is rejected, with nothing changed, if
    /// it would land on cells or other content outside the band, split a
    /// merged region / array group / hyperlink / table across the band edge,
    /// or push content past the last row.
    pub fn shift_rows(&mut self, first: u32, last: u32, amount: i32) -> Result<(), SheetError> {
        self.shift(Shift {
            axis: Axis::Rows,
            first,
            last,
            delta: i64::from(amount),
        })
    }

    /// Column analogue of [`Worksheet::shift_rows`]; column properties move
    /// with their columns.
    pub fn shift_columns(&mut self, first: u32, last: u32, amount: i32) -> Result<(), SheetError> {
        self.shift(Shift {
            axis: Axis::Columns,
            first,
            last,
            delta: i64::from(amount),
        })
    }

    fn shift(&mut self, shift: Shift) -> Result<(), SheetError> {
        if shift.first > shift.last || shift.last >= shift.axis.limit() {
            return Err(SheetError::InvalidShiftBand {
                first: shift.first,
                last: shift.last,
            });
        }
        if shift.delta == 0 {
            return Ok(());
        }

        self.validate_cell_shift(&shift)?;
        let merged_plan = self
            .merged
            .as_slice()
            .iter()
            .map(|r| shift.place("merged region", *r))
            .collect::<Result<Vec<_>, _>>()?;
        let array_plan = self
            .array_groups
            .values()
            .map(|r| shift.place("array formula", *r))
            .collect::<Result<Vec<_>, _>>()?;
        let comment_plan = self
            .comments
            .keys()
            .map(|at| shift.place("comment", Range::single(*at)))
            .collect::<Result<Vec<_>, _>>()?;
        let link_plan = self
            .hyperlinks
            .iter()
            .map(|h| shift.place("hyperlink", h.range))
            .collect::<Result<Vec<_>, _>>()?;
        let table_plan = self
            .tables
            .iter()
            .map(|t| shift.place("table", t.range))
            .collect::<Result<Vec<_>, _>>()?;
        let breaks = self.shifted_breaks(&shift)?;

        // Everything validated; apply.
        match shift.axis {
            Axis::Rows => {
                self.move_rows(&shift);
                self.row_breaks = breaks;
            }
            Axis::Columns => {
                self.move_columns(&shift);
                self.col_breaks = breaks;
            }
        }

        let merged: Vec<Range> = self
            .merged
            .as_slice()
            .iter()
            .zip(merged_plan)
            .filter_map(|(range, placement)| placement.apply(*range))
            .collect();
        self.merged.reset(merged);

        let groups = std::mem::take(&mut self.array_groups);
        self.array_groups = groups
            .into_values()
            .zip(array_plan)
            .filter_map(|(range, placement)| placement.apply(range))
            .map(|range| (range.start, range))
            .collect();

        let comments = std::mem::take(&mut self.comments);
        self.comments = comments
            .into_values()
            .zip(comment_plan)
            .filter_map(|(mut comment, placement)| {
                comment.cell_ref = placement.apply(Range::single(comment.cell_ref))?.start;
                Some((comment.cell_ref, comment))
            })
            .collect();

        let links = std::mem::take(&mut self.hyperlinks);
        self.hyperlinks = links
            .into_iter()
            .zip(link_plan)
            .filter_map(|(mut link, placement)| {
                link.range = placement.apply(link.range)?;
                Some(link)
            })
            .collect();

        let tables = std::mem::take(&mut self.tables);
        self.tables = tables
            .into_iter()
            .zip(table_plan)
            .filter_map(|(mut table, placement)| {
                table.range = placement.apply(table.range)?;
                Some(table)
            })
            .collect();

        self.tracked_cells.retain(|_, at| {
            let coord = shift.axis.coord(*at);
            if !shift.in_band(coord) {
                return true;
            }
            match shift.target(coord) {
                Some(target) => {
                    *at = shift.axis.with_coord(*at, target);
                    true
                }
                None => false,
            }
        });
        if shift.axis == Axis::Rows {
            self.tracked_rows.retain(|_, row| {
                if !shift.in_band(*row) {
                    return true;
                }
                match shift.target(*row) {
                    Some(target) => {
                        *row = target;
                        true
                    }
                    None => false,
                }
            });
        }

        log::debug!(
            "sheet '{}': shifted {:?} {}..={} by {}",
            self.name,
            shift.axis,
            shift.first,
            shift.last,
            shift.delta
        );
        Ok(())
    }

    /// Page breaks on the shifted axis after the move. Breaks in the band
    /// follow it, breaks pushed above the top are dropped, and breaks already
    /// in the destination are overwritten.
    fn shifted_breaks(&self, shift: &Shift) -> Result<BTreeSet<u32>, SheetError> {
        let breaks = match shift.axis {
            Axis::Rows => &self.row_breaks,
            Axis::Columns => &self.col_breaks,
        };
        let dest = shift.destination_in_grid();
        let mut kept = BTreeSet::new();
        let mut moved = Vec::new();
        for &at in breaks {
            if !shift.in_band(at) {
                if !dest.as_ref().is_some_and(|d| d.contains(&at)) {
                    kept.insert(at);
                }
                continue;
            }
            match shift.target(at) {
                Some(target) if target < shift.axis.limit() => moved.push(target),
                Some(_) => {
                    return Err(SheetError::ShiftOutOfBounds {
                        what: "page break",
                        range: shift.axis.line(at),
                    })
                }
                None => {}
            }
        }
        kept.extend(moved);
        Ok(kept)
    }

    fn validate_cell_shift(&self, shift: &Shift) -> Result<(), SheetError> {
        let limit = shift.axis.limit();
        let dest = shift.destination_in_grid();
        let out_of_grid =
            |what: &'static str, range: Range| SheetError::ShiftOutOfBounds { what, range };

        match shift.axis {
            Axis::Rows => {
                for row in self.rows.range(shift.first..=shift.last).map(|(_, r)| r) {
                    if i64::from(row.index()) + shift.delta >= i64::from(limit) {
                        return Err(out_of_grid("row", shift.axis.line(row.index())));
                    }
                }
                if let Some(dest) = dest {
                    for row in self.rows.range(dest).map(|(_, r)| r) {
                        if shift.in_band(row.index()) {
                            continue;
                        }
                        if let Some(cell) = row.cells().next() {
                            return Err(SheetError::ShiftCollision {
                                what: "cell",
                                at: Range::single(cell.address()),
                            });
                        }
                    }
                }
            }
            Axis::Columns => {
                for row in self.rows.values() {
                    if let Some(cell) = row.cells_in(shift.first..=shift.last).next_back() {
                        if i64::from(cell.col()) + shift.delta >= i64::from(limit) {
                            return Err(out_of_grid("cell", Range::single(cell.address())));
                        }
                    }
                    if let Some(dest) = dest.clone() {
                        if let Some(cell) = row.cells_in(dest).find(|c| !shift.in_band(c.col())) {
                            return Err(SheetError::ShiftCollision {
                                what: "cell",
                                at: Range::single(cell.address()),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn move_rows(&mut self, shift: &Shift) {
        let band: Vec<u32> = self
            .rows
            .range(shift.first..=shift.last)
            .map(|(index, _)| *index)
            .collect();
        let moving: Vec<Row> = band.iter().filter_map(|i| self.rows.remove(i)).collect();

        // Rows left in the destination are empty (validated); they are overwritten.
        if let Some(dest) = shift.destination_in_grid() {
            let overwritten: Vec<u32> = self.rows.range(dest).map(|(index, _)| *index).collect();
            for index in overwritten {
                self.rows.remove(&index);
            }
        }

        for mut row in moving {
            let Some(target) = shift.target(row.index()) else {
                continue;
            };
            row.set_index(target);
            for cell in row.cells_mut() {
                if let Some(range) = cell.array_formula_range() {
                    cell.set_array_range(shift.axis.translate(&range, shift.delta));
                }
            }
            self.rows.insert(target, row);
        }
    }

    fn move_columns(&mut self, shift: &Shift) {
        for row in self.rows.values_mut() {
            let band: Vec<u32> = row
                .cells_in(shift.first..=shift.last)
                .map(Cell::col)
                .collect();
            let moving: Vec<Cell> = band.iter().filter_map(|c| row.take_cell(*c)).collect();
            for mut cell in moving {
                let Some(target) = shift.target(cell.col()) else {
                    continue;
                };
                cell.set_address(CellRef::new(row.index(), target));
                if let Some(range) = cell.array_formula_range() {
                    cell.set_array_range(shift.axis.translate(&range, shift.delta));
                }
                row.insert_cell(cell);
            }
        }

        let band: Vec<u32> = self
            .columns
            .range(shift.first..=shift.last)
            .map(|(col, _)| *col)
            .collect();
        let moving: Vec<(u32, ColumnProps)> = band
            .iter()
            .filter_map(|c| self.columns.remove(c).map(|props| (*c, props)))
            .collect();
        if let Some(dest) = shift.destination_in_grid() {
            self.columns.retain(|col, _| !dest.contains(col));
        }
        for (col, props) in moving {
            if let Some(target) = shift.target(col) {
                self.columns.insert(target, props);
            }
        }
    }
}

fn check_row(row: u32) -> Result<(), SheetError> {
    if row >= EXCEL_MAX_ROWS {
        return Err(SheetError::RowOutOfBounds(row));
    }
    Ok(())
}

fn check_col(col: u32) -> Result<(), SheetError> {
    if col >= EXCEL_MAX_COLS {
        return Err(SheetError::ColumnOutOfBounds(col));
    }
    Ok(())
}

fn check_cell(cell: CellRef) -> Result<(), SheetError> {
    check_row(cell.row)?;
    check_col(cell.col)
}

fn ensure_row_outside_arrays(row: &Row) -> Result<(), SheetError> {
    match row
        .cells()
        .filter_map(Cell::array_formula_range)
        .find(|range| !range.is_single_cell())
    {
        Some(array) => Err(SheetError::RowInArrayFormula {
            row: row.index(),
            array,
        }),
        None => Ok(()),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Axis {
    Rows,
    Columns,
}

impl Axis {
    fn span(self, range: &Range) -> (u32, u32) {
        match self {
            Axis::Rows => (range.start.row, range.end.row),
            Axis::Columns => (range.start.col, range.end.col),
        }
    }

    fn coord(self, cell: CellRef) -> u32 {
        match self {
            Axis::Rows => cell.row,
            Axis::Columns => cell.col,
        }
    }

    fn with_coord(self, cell: CellRef, value: u32) -> CellRef {
        match self {
            Axis::Rows => CellRef::new(value, cell.col),
            Axis::Columns => CellRef::new(cell.row, value),
        }
    }

    /// The whole row or column at `index`.
    fn line(self, index: u32) -> Range {
        match self {
            Axis::Rows => Range::new(
                CellRef::new(index, 0),
                CellRef::new(index, EXCEL_MAX_COLS - 1),
            ),
            Axis::Columns => Range::new(
                CellRef::new(0, index),
                CellRef::new(EXCEL_MAX_ROWS - 1, index),
            ),
        }
    }

    fn limit(self) -> u32 {
        match self {
            Axis::Rows => EXCEL_MAX_ROWS,
            Axis::Columns => EXCEL_MAX_COLS,
        }
    }

    fn translate(self, range: &Range, delta: i64) -> Option<Range> {
        match self {
            Axis::Rows => range.translate(delta, 0),
            Axis::Columns => range.translate(0, delta),
        }
    }
}

/// A band `first..=last` on one axis moving by `delta`.
struct Shift {
    axis: Axis,
    first: u32,
    last: u32,
    delta: i64,
}

enum Placement {
    Stay,
    Move(Range),
    Discard,
}

impl Placement {
    fn apply(self, range: Range) -> Option<Range> {
        match self {
            Placement::Stay => Some(range),
            Placement::Move(moved) => Some(moved),
            Placement::Discard => None,
        }
    }
}

impl Shift {
    fn in_band(&self, coord: u32) -> bool {
        (self.first..=self.last).contains(&coord)
    }

    /// Target of a coordinate inside the band; `None` when pushed below 0.
    fn target(&self, coord: u32) -> Option<u32> {
        u32::try_from(i64::from(coord) + self.delta).ok()
    }

    /// Destination span of the band, clipped at 0 (may be empty).
    fn destination(&self) -> (i64, i64) {
        (
            (i64::from(self.first) + self.delta).max(0),
            i64::from(self.last) + self.delta,
        )
    }

    /// Destination span intersected with the grid, if not empty.
    fn destination_in_grid(&self) -> Option<RangeInclusive<u32>> {
        let (lo, hi) = self.destination();
        let hi = hi.min(i64::from(self.axis.limit()) - 1);
        if hi < 0 || lo > hi {
            return None;
        }
        Some(lo as u32..=hi as u32)
    }

    fn place(&self, what: &'static str, range: Range) -> Result<Placement, SheetError> {
        let (a, b) = self.axis.span(&range);
        if b < self.first || a > self.last {
            let (dest_lo, dest_hi) = self.destination();
            if i64::from(a) <= dest_hi && i64::from(b) >= dest_lo {
                return Err(SheetError::ShiftCollision { what, at: range });
            }
            return Ok(Placement::Stay);
        }
        if a < self.first || b > self.last {
            return Err(SheetError::ShiftSplitsRange { what, range });
        }
        if i64::from(b) + self.delta < 0 {
            return Ok(Placement::Discard);
        }
        self.axis
            .translate(&range, self.delta)
            .map(Placement::Move)
            .ok_or(SheetError::ShiftOutOfBounds { what, range })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(a1: &str) -> CellRef {
        CellRef::from_a1(a1).unwrap()
    }

    fn range(a1: &str) -> Range {
        Range::from_a1(a1).unwrap()
    }

    #[test]
    fn handles_follow_shifted_cells_and_go_stale_on_removal() {
        let mut sheet = Worksheet::new(1, "Sheet1");
        sheet.set_value(at("B2"), 1.0).unwrap();
        let handle = sheet.cell_handle(at("B2")).unwrap();

        sheet.shift_rows(1, 1, 3).unwrap();
        assert_eq!(sheet.resolve_cell(handle).unwrap().address(), at("B5"));

        sheet.remove_cell(at("B5")).unwrap();
        assert_eq!(sheet.resolve_cell(handle), Err(SheetError::StaleHandle));
    }

    #[test]
    fn replaced_cells_invalidate_handles() {
        let mut sheet = Worksheet::new(1, "Sheet1");
        sheet.set_value(at("A1"), 1.0).unwrap();
        let handle = sheet.cell_handle(at("A1")).unwrap();
        sheet.create_cell(at("A1")).unwrap();
        assert_eq!(sheet.resolve_cell(handle), Err(SheetError::StaleHandle));
    }

    #[test]
    fn rows_pushed_above_the_top_are_discarded() {
        let mut sheet = Worksheet::new(1, "Sheet1");
        for row in 0..3 {
            sheet.set_value(CellRef::new(row, 0), f64::from(row)).unwrap();
        }
        let first = sheet.row_handle(0).unwrap();
        sheet.shift_rows(0, 2, -1).unwrap();

        assert_eq!(sheet.physical_number_of_rows(), 2);
        assert_eq!(sheet.cell(at("A1")).unwrap().value(), &CellValue::Number(1.0));
        assert_eq!(sheet.resolve_row(first), Err(SheetError::StaleHandle));
    }

    #[test]
    fn merged_region_overlap_is_rejected_without_change() {
        let mut sheet = Worksheet::new(1, "Sheet1");
        sheet.add_merged_region(range("A1:B2")).unwrap();
        let err = sheet.add_merged_region(range("B2:C3")).unwrap_err();
        assert_eq!(
            err,
            SheetError::MergedRegionOverlap {
                existing: range("A1:B2"),
                new: range("B2:C3"),
            }
        );
        assert_eq!(sheet.merged_regions(), &[range("A1:B2")]);
        assert!(matches!(
            sheet.add_merged_region(range("D4")),
            Err(SheetError::MergedRegionTooSmall(_))
        ));
    }
}
