use std::collections::HashSet;

use crate::cell::format_number;
use crate::eval::FormulaEvaluator;
use crate::names::{
    validate_defined_name, DefinedName, DefinedNameError, DefinedNameId, DefinedNameScope,
};
use crate::table::{validate_table_name, Table, TableError};
use crate::value::{RichText, StringValue};
use crate::{
    ArgbColor, Cell, CellRef, CellValue, Color, MediaStore, PictureFormat, Range,
    RangeParseError, SharedStringTable, SheetArea, SheetError, SheetVisibility, StyleRegistry,
    ThemePalette, Worksheet, WorksheetId,
};

/// Maximum sheet name length in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const INVALID_SHEET_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Errors raised by sheet-name validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SheetNameError {
    #[error("sheet name cannot be empty")]
    Empty,
    #[error("sheet name is {len} characters; the limit is {MAX_SHEET_NAME_LEN}")]
    TooLong { len: usize },
    #[error("sheet name contains invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("sheet name cannot begin or end with an apostrophe")]
    QuotedEdge,
    #[error("a sheet named '{0}' already exists")]
    Duplicate(String),
}

/// Errors raised by workbook-level sheet operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum WorkbookError {
    #[error("sheet not found: {0}")]
    SheetNotFound(WorksheetId),
    #[error("sheet index {0} is out of range")]
    SheetIndexOutOfRange(usize),
    #[error(transparent)]
    SheetName(#[from] SheetNameError),
    #[error("a workbook must keep at least one visible sheet")]
    LastVisibleSheet,
    #[error("sheet order must list every sheet exactly once")]
    InvalidSheetOrder,
    #[error("sheet {0} is hidden and cannot be made active")]
    HiddenActiveSheet(WorksheetId),
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

/// Errors raised while resolving a reference string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// The text is neither an area reference nor a valid name.
    #[error("invalid reference: {0}")]
    Parse(#[from] RangeParseError),
    /// The text is a well-formed name that is not defined.
    #[error("name not found: {0}")]
    NameNotFound(String),
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
    #[error("name '{0}' does not refer to a cell area")]
    NotAnArea(String),
}

/// A reference resolved to a concrete sheet area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedArea {
    /// `None` when the reference carried no sheet and no scope applied.
    pub sheet: Option<WorksheetId>,
    pub range: Range,
}

/// Validate a worksheet name (without checking uniqueness).
pub fn validate_sheet_name(name: &str) -> Result<(), SheetNameError> {
    if name.is_empty() {
        return Err(SheetNameError::Empty);
    }
    let len = name.chars().count();
    if len > MAX_SHEET_NAME_LEN {
        return Err(SheetNameError::TooLong { len });
    }
    if let Some(ch) = name.chars().find(|c| INVALID_SHEET_NAME_CHARS.contains(c)) {
        return Err(SheetNameError::InvalidCharacter(ch));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(SheetNameError::QuotedEdge);
    }
    Ok(())
}

/// Excel compares sheet names case-insensitively across Unicode.
fn sheet_name_eq(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// A workbook: ordered sheets plus the shared registries cells point into.
#[derive(Clone, Debug)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    /// Cell formats and their component tables.
    pub styles: StyleRegistry,
    /// `None` in inline-string mode.
    shared_strings: Option<SharedStringTable>,
    /// Theme colors used to resolve theme-relative colors.
    pub theme: ThemePalette,
    defined_names: Vec<DefinedName>,
    /// Workbook-wide picture list.
    pub media: MediaStore,
    active_sheet: Option<WorksheetId>,
    first_visible_tab: usize,
    next_sheet_id: WorksheetId,
    next_defined_name_id: DefinedNameId,
    next_table_id: u32,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// An empty workbook with a shared string table.
    pub fn new() -> Self {
        Self {
            sheets: Vec::new(),
            styles: StyleRegistry::new(),
            shared_strings: Some(SharedStringTable::new()),
            theme: ThemePalette::default(),
            defined_names: Vec::new(),
            media: MediaStore::default(),
            active_sheet: None,
            first_visible_tab: 0,
            next_sheet_id: 1,
            next_defined_name_id: 1,
            next_table_id: 1,
        }
    }

    /// An empty workbook that stores every string inline.
    pub fn with_inline_strings() -> Self {
        Self {
            shared_strings: None,
            ..Self::new()
        }
    }

    // ---- strings ------------------------------------------------------------

    pub fn shared_strings(&self) -> Option<&SharedStringTable> {
        self.shared_strings.as_ref()
    }

    pub fn shared_strings_mut(&mut self) -> Option<&mut SharedStringTable> {
        self.shared_strings.as_mut()
    }

    /// Switch on the shared string table (no-op when already enabled).
    pub fn enable_shared_strings(&mut self) -> &mut SharedStringTable {
        self.shared_strings.get_or_insert_with(SharedStringTable::new)
    }

    /// Replace the shared string table; `None` switches to inline mode.
    ///
    /// Cells already holding shared indices keep them, so callers loading a
    /// package install the table before populating sheets.
    pub fn set_shared_strings(&mut self, table: Option<SharedStringTable>) {
        self.shared_strings = table;
    }

    /// Set a string cell, interning the text when the table is enabled and
    /// storing it inline otherwise.
    pub fn set_cell_string(
        &mut self,
        sheet: WorksheetId,
        cell: CellRef,
        text: impl Into<RichText>,
    ) -> Result<&mut Cell, WorkbookError> {
        let strings = self.shared_strings.as_mut();
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.id() == sheet)
            .ok_or(WorkbookError::SheetNotFound(sheet))?;
        Ok(sheet.set_string(cell, text, strings)?)
    }

    /// Text of a string cell, shared entries resolved.
    pub fn cell_text(&self, sheet: WorksheetId, cell: CellRef) -> Option<&RichText> {
        self.sheet(sheet)?
            .cell_text(cell, self.shared_strings.as_ref())
    }

    // ---- sheets -------------------------------------------------------------

    /// Append a new empty sheet. Names are unique case-insensitively.
    pub fn create_sheet(&mut self, name: &str) -> Result<WorksheetId, WorkbookError> {
        self.check_new_sheet_name(name, None)?;
        let id = self.next_sheet_id;
        self.next_sheet_id += 1;
        self.sheets.push(Worksheet::new(id, name));
        if self.active_sheet.is_none() {
            self.active_sheet = Some(id);
        }
        Ok(id)
    }

    fn check_new_sheet_name(
        &self,
        name: &str,
        except: Option<WorksheetId>,
    ) -> Result<(), SheetNameError> {
        validate_sheet_name(name)?;
        if self
            .sheets
            .iter()
            .any(|s| Some(s.id()) != except && sheet_name_eq(s.name(), name))
        {
            return Err(SheetNameError::Duplicate(name.to_string()));
        }
        Ok(())
    }

    pub fn sheet(&self, id: WorksheetId) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.id() == id)
    }

    pub fn sheet_mut(&mut self, id: WorksheetId) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|s| s.id() == id)
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    /// Case-insensitive lookup by name.
    pub fn sheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| sheet_name_eq(s.name(), name))
    }

    pub fn sheet_index(&self, id: WorksheetId) -> Option<usize> {
        self.sheets.iter().position(|s| s.id() == id)
    }

    /// Sheets in tab order.
    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> impl Iterator<Item = &mut Worksheet> {
        self.sheets.iter_mut()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Rename a sheet. Formula text referring to the old name is left as is.
    pub fn rename_sheet(&mut self, id: WorksheetId, new_name: &str) -> Result<(), WorkbookError> {
        self.check_new_sheet_name(new_name, Some(id))?;
        let sheet = self
            .sheet_mut(id)
            .ok_or(WorkbookError::SheetNotFound(id))?;
        sheet.set_name(new_name.to_string());
        Ok(())
    }

    /// Reorder sheets; `order` lists every sheet id exactly once.
    pub fn set_sheet_order(&mut self, order: &[WorksheetId]) -> Result<(), WorkbookError> {
        let unique: HashSet<WorksheetId> = order.iter().copied().collect();
        if order.len() != self.sheets.len()
            || unique.len() != order.len()
            || self.sheets.iter().any(|s| !unique.contains(&s.id()))
        {
            return Err(WorkbookError::InvalidSheetOrder);
        }
        let mut sheets = std::mem::take(&mut self.sheets);
        sheets.sort_by_key(|s| order.iter().position(|id| *id == s.id()));
        self.sheets = sheets;
        Ok(())
    }

    /// Remove a sheet together with its sheet-scoped names.
    pub fn remove_sheet(&mut self, id: WorksheetId) -> Result<Worksheet, WorkbookError> {
        let index = self
            .sheet_index(id)
            .ok_or(WorkbookError::SheetNotFound(id))?;
        let leaves_only_hidden = !self.sheets[index].is_hidden()
            && self.sheets.len() > 1
            && self
                .sheets
                .iter()
                .filter(|s| s.id() != id)
                .all(Worksheet::is_hidden);
        if leaves_only_hidden {
            return Err(WorkbookError::LastVisibleSheet);
        }

        let sheet = self.sheets.remove(index);
        self.defined_names
            .retain(|n| n.scope != DefinedNameScope::Sheet(id));
        if self.active_sheet == Some(id) {
            self.active_sheet = self.nearest_visible(index);
        }
        if self.first_visible_tab >= self.sheets.len() {
            self.first_visible_tab = self.sheets.len().saturating_sub(1);
        }
        log::debug!("removed sheet '{}' (id {id})", sheet.name());
        Ok(sheet)
    }

    /// First visible sheet at or after `index`, else the nearest before it.
    fn nearest_visible(&self, index: usize) -> Option<WorksheetId> {
        self.sheets
            .iter()
            .skip(index)
            .chain(self.sheets.iter().take(index).rev())
            .find(|s| !s.is_hidden())
            .map(Worksheet::id)
    }

    /// Copy a sheet to the end of the tab list under `"Name (2)"`.
    ///
    /// Cells get fresh identities, sheet-scoped names are copied, and tables
    /// are copied under new workbook-unique names.
    pub fn clone_sheet(&mut self, id: WorksheetId) -> Result<WorksheetId, WorkbookError> {
        let source = self.sheet(id).ok_or(WorkbookError::SheetNotFound(id))?;
        let name = self.unique_clone_name(source.name());
        let new_id = self.next_sheet_id;
        let mut copy = source.duplicate(new_id, name);
        let tables: Vec<Table> = source.tables().to_vec();
        self.next_sheet_id += 1;

        for mut table in tables {
            table.id = self.next_table_id;
            self.next_table_id += 1;
            table.name = self.unique_table_name(&table.name);
            table.display_name = table.name.clone();
            if let Err(err) = copy.insert_table(table) {
                log::warn!("dropping table while cloning sheet {id}: {err}");
            }
        }

        let scoped: Vec<DefinedName> = self
            .defined_names
            .iter()
            .filter(|n| n.scope == DefinedNameScope::Sheet(id))
            .cloned()
            .collect();
        for mut name in scoped {
            name.id = self.next_defined_name_id;
            self.next_defined_name_id += 1;
            name.scope = DefinedNameScope::Sheet(new_id);
            self.defined_names.push(name);
        }

        log::debug!("cloned sheet {id} as '{}' (id {new_id})", copy.name());
        self.sheets.push(copy);
        Ok(new_id)
    }

    fn unique_clone_name(&self, base: &str) -> String {
        let stem = base
            .strip_suffix(')')
            .and_then(|rest| rest.rsplit_once(" ("))
            .filter(|(_, n)| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            .map_or(base, |(stem, _)| stem);
        (2u32..)
            .map(|n| {
                let suffix = format!(" ({n})");
                let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
                let truncated: String = stem.chars().take(room).collect();
                format!("{truncated}{suffix}")
            })
            .find(|candidate| self.sheet_by_name(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    // ---- visibility & tabs --------------------------------------------------

    /// Set a sheet's visibility. The last visible sheet cannot be hidden; a
    /// hidden active sheet hands the active tab to its nearest visible peer.
    pub fn set_sheet_visibility(
        &mut self,
        id: WorksheetId,
        visibility: SheetVisibility,
    ) -> Result<(), WorkbookError> {
        let index = self
            .sheet_index(id)
            .ok_or(WorkbookError::SheetNotFound(id))?;
        if visibility != SheetVisibility::Visible
            && !self.sheets[index].is_hidden()
            && self
                .sheets
                .iter()
                .filter(|s| s.id() != id)
                .all(Worksheet::is_hidden)
        {
            return Err(WorkbookError::LastVisibleSheet);
        }
        self.sheets[index].set_visibility(visibility);
        if visibility != SheetVisibility::Visible && self.active_sheet == Some(id) {
            self.active_sheet = self.nearest_visible(index);
        }
        Ok(())
    }

    /// Boolean convenience over [`Workbook::set_sheet_visibility`] by tab index.
    pub fn set_sheet_hidden(&mut self, index: usize, hidden: bool) -> Result<(), WorkbookError> {
        let id = self
            .sheets
            .get(index)
            .map(Worksheet::id)
            .ok_or(WorkbookError::SheetIndexOutOfRange(index))?;
        let visibility = if hidden {
            SheetVisibility::Hidden
        } else {
            SheetVisibility::Visible
        };
        self.set_sheet_visibility(id, visibility)
    }

    pub fn sheet_visibility(&self, index: usize) -> Option<SheetVisibility> {
        self.sheets.get(index).map(Worksheet::visibility)
    }

    pub fn active_sheet(&self) -> Option<WorksheetId> {
        self.active_sheet
    }

    /// Tab index of the active sheet.
    pub fn active_sheet_index(&self) -> Option<usize> {
        self.sheet_index(self.active_sheet?)
    }

    pub fn set_active_sheet(&mut self, id: WorksheetId) -> Result<(), WorkbookError> {
        let sheet = self.sheet(id).ok_or(WorkbookError::SheetNotFound(id))?;
        if sheet.is_hidden() {
            return Err(WorkbookError::HiddenActiveSheet(id));
        }
        self.active_sheet = Some(id);
        Ok(())
    }

    /// Index of the leftmost tab shown in the tab bar.
    pub fn first_visible_tab(&self) -> usize {
        self.first_visible_tab
    }

    pub fn set_first_visible_tab(&mut self, index: usize) -> Result<(), WorkbookError> {
        if index >= self.sheets.len() {
            return Err(WorkbookError::SheetIndexOutOfRange(index));
        }
        self.first_visible_tab = index;
        Ok(())
    }

    // ---- defined names ------------------------------------------------------

    /// Create a defined name; `(name, scope)` pairs are unique case-insensitively.
    pub fn create_defined_name(
        &mut self,
        scope: DefinedNameScope,
        name: &str,
        refers_to: &str,
    ) -> Result<DefinedNameId, DefinedNameError> {
        let name = name.trim();
        validate_defined_name(name)?;
        if let DefinedNameScope::Sheet(sheet_id) = scope {
            if self.sheet(sheet_id).is_none() {
                return Err(DefinedNameError::SheetNotFound(sheet_id));
            }
        }
        if self.defined_name(scope, name).is_some() {
            return Err(DefinedNameError::DuplicateName(name.to_string()));
        }

        let id = self.next_defined_name_id;
        self.next_defined_name_id += 1;
        self.defined_names.push(DefinedName {
            id,
            name: name.to_string(),
            scope,
            refers_to: normalize_refers_to(refers_to),
            comment: None,
            hidden: false,
        });
        Ok(id)
    }

    pub fn rename_defined_name(
        &mut self,
        id: DefinedNameId,
        new_name: &str,
    ) -> Result<(), DefinedNameError> {
        let new_name = new_name.trim();
        validate_defined_name(new_name)?;
        let idx = self
            .defined_names
            .iter()
            .position(|n| n.id == id)
            .ok_or(DefinedNameError::DefinedNameNotFound(id))?;
        let scope = self.defined_names[idx].scope;
        if self
            .defined_names
            .iter()
            .any(|n| n.id != id && n.scope == scope && n.name.eq_ignore_ascii_case(new_name))
        {
            return Err(DefinedNameError::DuplicateName(new_name.to_string()));
        }
        self.defined_names[idx].name = new_name.to_string();
        Ok(())
    }

    pub fn delete_defined_name(
        &mut self,
        id: DefinedNameId,
    ) -> Result<DefinedName, DefinedNameError> {
        let idx = self
            .defined_names
            .iter()
            .position(|n| n.id == id)
            .ok_or(DefinedNameError::DefinedNameNotFound(id))?;
        Ok(self.defined_names.remove(idx))
    }

    /// Case-insensitive lookup in exactly `scope`.
    pub fn defined_name(&self, scope: DefinedNameScope, name: &str) -> Option<&DefinedName> {
        self.defined_names
            .iter()
            .find(|n| n.scope == scope && n.name.eq_ignore_ascii_case(name))
    }

    pub fn defined_name_mut(&mut self, id: DefinedNameId) -> Option<&mut DefinedName> {
        self.defined_names.iter_mut().find(|n| n.id == id)
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    /// Resolve `text` as an area reference or a defined name.
    ///
    /// Names are looked up in the sheet scope of `context` first, then at
    /// workbook scope. Unqualified areas resolve to `context`.
    pub fn resolve_reference(
        &self,
        text: &str,
        context: Option<WorksheetId>,
    ) -> Result<ResolvedArea, ReferenceError> {
        let text = text.trim();
        let text = text.strip_prefix('=').unwrap_or(text);
        match SheetArea::parse(text) {
            Ok(area) => self.area_to_resolved(area, context),
            Err(parse_err) => {
                if validate_defined_name(text).is_err() {
                    return Err(ReferenceError::Parse(parse_err));
                }
                let name = context
                    .and_then(|id| self.defined_name(DefinedNameScope::Sheet(id), text))
                    .or_else(|| self.defined_name(DefinedNameScope::Workbook, text))
                    .ok_or_else(|| ReferenceError::NameNotFound(text.to_string()))?;
                let area = SheetArea::parse(&name.refers_to)
                    .map_err(|_| ReferenceError::NotAnArea(name.name.clone()))?;
                let context = match name.scope {
                    DefinedNameScope::Sheet(id) => Some(id),
                    DefinedNameScope::Workbook => context,
                };
                self.area_to_resolved(area, context)
            }
        }
    }

    fn area_to_resolved(
        &self,
        area: SheetArea,
        context: Option<WorksheetId>,
    ) -> Result<ResolvedArea, ReferenceError> {
        let sheet = match area.sheet {
            Some(name) => Some(
                self.sheet_by_name(&name)
                    .map(Worksheet::id)
                    .ok_or(ReferenceError::SheetNotFound(name))?,
            ),
            None => context,
        };
        Ok(ResolvedArea {
            sheet,
            range: area.range,
        })
    }

    // ---- media & colors -----------------------------------------------------

    /// Register a picture; the returned index is never reused.
    pub fn add_picture(&mut self, bytes: Vec<u8>, format: PictureFormat) -> usize {
        self.media.add_picture(bytes, format)
    }

    /// Resolve a color through this workbook's indexed and theme palettes.
    pub fn resolve_color(&self, color: &Color) -> Option<ArgbColor> {
        color.resolve(&self.styles.palette, &self.theme)
    }

    // ---- tables -------------------------------------------------------------

    /// Create a table over `range` on `sheet`. With a header row, column
    /// names come from the header cells.
    pub fn create_table(
        &mut self,
        sheet: WorksheetId,
        name: &str,
        range: Range,
        has_header: bool,
    ) -> Result<&Table, TableError> {
        let name = name.trim();
        self.check_table_name(name, None)?;
        if range.height() <= u32::from(has_header) {
            return Err(TableError::InvalidRange);
        }
        let mut table = Table::new(self.next_table_id, name, range, has_header);
        let ws = self.sheet(sheet).ok_or(TableError::SheetNotFound(sheet))?;
        if has_header {
            table.set_column_names(self.header_texts(ws, range));
        }
        self.add_table(sheet, table)
    }

    /// Attach a fully built table (used when loading packages).
    pub fn add_table(&mut self, sheet: WorksheetId, table: Table) -> Result<&Table, TableError> {
        self.check_table_name(&table.name, None)?;
        let name = table.name.clone();
        self.next_table_id = self.next_table_id.max(table.id + 1);
        let ws = self
            .sheet_mut(sheet)
            .ok_or(TableError::SheetNotFound(sheet))?;
        ws.insert_table(table)?;
        ws.table(&name).ok_or(TableError::TableNotFound(name))
    }

    /// Re-read column names from the table's header row.
    pub fn update_table_headers(&mut self, name: &str) -> Result<(), TableError> {
        let (sheet_id, range, has_header) = self
            .find_table(name)
            .map(|(ws, t)| (ws.id(), t.range, t.header_row_count > 0))
            .ok_or_else(|| TableError::TableNotFound(name.to_string()))?;
        if !has_header {
            return Ok(());
        }
        let ws = self
            .sheet(sheet_id)
            .ok_or(TableError::SheetNotFound(sheet_id))?;
        let names = self.header_texts(ws, range);
        let table = self
            .sheet_mut(sheet_id)
            .and_then(|ws| ws.table_mut(name))
            .ok_or_else(|| TableError::TableNotFound(name.to_string()))?;
        table.set_column_names(names);
        Ok(())
    }

    /// Move or resize a table. Column names are re-read from the header row
    /// when the table has one.
    pub fn set_table_range(&mut self, name: &str, range: Range) -> Result<(), TableError> {
        self.edit_table(name, |table| table.set_range(range))?;
        self.update_table_headers(name)
    }

    /// Add a column definition at `index`, widening the table by one column.
    pub fn insert_table_column(
        &mut self,
        name: &str,
        index: usize,
        column_name: Option<&str>,
    ) -> Result<(), TableError> {
        self.edit_table(name, |table| table.insert_column(index, column_name))
    }

    /// Grow or shrink a table to `count` data rows.
    pub fn set_table_data_row_count(&mut self, name: &str, count: u32) -> Result<(), TableError> {
        self.edit_table(name, |table| table.set_data_row_count(count))
    }

    /// Apply `edit` to a copy of the table and keep it only when the result
    /// still fits its sheet.
    fn edit_table(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut Table) -> Result<(), TableError>,
    ) -> Result<(), TableError> {
        let (sheet_id, mut edited) = self
            .find_table(name)
            .map(|(ws, t)| (ws.id(), t.clone()))
            .ok_or_else(|| TableError::TableNotFound(name.to_string()))?;
        edit(&mut edited)?;
        let ws = self
            .sheet_mut(sheet_id)
            .ok_or(TableError::SheetNotFound(sheet_id))?;
        ws.check_table_range(edited.range, Some(edited.id))?;
        let table = ws
            .table_mut(name)
            .ok_or_else(|| TableError::TableNotFound(name.to_string()))?;
        log::debug!("table {name}: {} -> {}", table.range, edited.range);
        *table = edited;
        Ok(())
    }

    fn header_texts(&self, sheet: &Worksheet, range: Range) -> Vec<Option<String>> {
        (range.start.col..=range.end.col)
            .map(|col| {
                let cell = sheet.cell(CellRef::new(range.start.row, col))?;
                match cell.value() {
                    CellValue::String(StringValue::Inline(text)) => {
                        Some(text.plain_text().to_string())
                    }
                    CellValue::String(StringValue::Shared(_)) => sheet
                        .cell_text(cell.address(), self.shared_strings.as_ref())
                        .map(|t| t.plain_text().to_string()),
                    CellValue::Number(n) => Some(format_number(*n)),
                    CellValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
                    CellValue::Error(e) => Some(e.as_str().to_string()),
                    CellValue::Blank => None,
                }
            })
            .collect()
    }

    pub fn find_table(&self, name: &str) -> Option<(&Worksheet, &Table)> {
        self.sheets
            .iter()
            .find_map(|ws| ws.table(name).map(|t| (ws, t)))
    }

    pub fn remove_table(&mut self, name: &str) -> Result<Table, TableError> {
        self.sheets
            .iter_mut()
            .find_map(|ws| ws.remove_table(name))
            .ok_or_else(|| TableError::TableNotFound(name.to_string()))
    }

    /// Table names share the workbook-scope namespace with defined names.
    fn check_table_name(&self, name: &str, except: Option<u32>) -> Result<(), TableError> {
        validate_table_name(name)?;
        let clash_table = self
            .sheets
            .iter()
            .flat_map(Worksheet::tables)
            .any(|t| Some(t.id) != except && t.name.eq_ignore_ascii_case(name));
        if clash_table || self.defined_name(DefinedNameScope::Workbook, name).is_some() {
            return Err(TableError::DuplicateName);
        }
        Ok(())
    }

    fn unique_table_name(&self, base: &str) -> String {
        (2u32..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.check_table_name(candidate, None).is_ok())
            .unwrap_or_else(|| base.to_string())
    }

    // ---- evaluation ---------------------------------------------------------

    /// Run `evaluator` over every formula cell and array anchor, storing the
    /// results as cached values. Returns the number of formulas evaluated.
    pub fn recalculate(&mut self, evaluator: &mut dyn FormulaEvaluator) -> usize {
        let jobs: Vec<(WorksheetId, CellRef, String, Option<Range>)> = self
            .sheets
            .iter()
            .flat_map(|ws| {
                ws.iter_cells().filter_map(move |cell| {
                    let formula = cell.formula()?;
                    Some((
                        ws.id(),
                        cell.address(),
                        formula.to_string(),
                        cell.array_formula_range(),
                    ))
                })
            })
            .collect();

        for (sheet_id, anchor, formula, array_range) in &jobs {
            let result = evaluator.evaluate(self, *sheet_id, *anchor, formula, *array_range);
            let Some(ws) = self.sheet_mut(*sheet_id) else {
                continue;
            };
            let target = array_range.unwrap_or_else(|| Range::single(*anchor));
            for at in target.cells() {
                let value = result.value_at(
                    (at.row - target.start.row) as usize,
                    (at.col - target.start.col) as usize,
                );
                if let Some(cell) = ws.cell_mut(at) {
                    cell.set_cached_value(value);
                }
            }
        }
        jobs.len()
    }
}

fn normalize_refers_to(refers_to: &str) -> String {
    let trimmed = refers_to.trim();
    trimmed.strip_prefix('=').unwrap_or(trimmed).to_string()
}
