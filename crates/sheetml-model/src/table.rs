use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellRef, Range, WorksheetId};

/// Errors that can occur when creating or mutating a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table name cannot be empty")]
    EmptyName,
    #[error("table name exceeds Excel's 255 character limit")]
    NameTooLong,
    #[error("table name must start with a letter, '_' or '\\'")]
    InvalidStartChar,
    #[error("table name contains invalid character '{ch}'")]
    InvalidChar { ch: char },
    #[error("table name conflicts with a cell or range reference")]
    ConflictsWithCellReference,
    #[error("table name is reserved")]
    ReservedName,
    #[error("table name already exists in workbook")]
    DuplicateName,
    #[error("worksheet not found: {0}")]
    SheetNotFound(WorksheetId),
    #[error("table not found: {0}")]
    TableNotFound(String),
    #[error("table range is too small for header/totals row settings")]
    InvalidRange,
    #[error("table range {new} overlaps table {existing}")]
    Overlap { existing: String, new: Range },
    #[error("table already has a column named {0:?}")]
    DuplicateColumnName(String),
    #[error("column index {index} is past the table's {len} columns")]
    ColumnIndexOutOfRange { index: usize, len: usize },
}

/// Validate an Excel table name (ListObject name).
///
/// - Names are non-empty, <= 255 chars.
/// - First character must be a letter, `_` or `\`.
/// - Remaining characters may be letters, digits, `_`, or `.`.
/// - Names may not look like A1 or R1C1 references (e.g. `A1`, `R1C1`).
/// - Names may not be reserved (`R`, `C`, `TRUE`, `FALSE`).
///
/// Workbook-wide uniqueness is enforced by [`crate::Workbook`] APIs.
pub fn validate_table_name(name: &str) -> Result<(), TableError> {
    let name = name.trim();
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(TableError::EmptyName);
    };
    if name.chars().count() > 255 {
        return Err(TableError::NameTooLong);
    }
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(TableError::InvalidStartChar);
    }
    if let Some(ch) = chars.find(|ch| !(ch.is_alphanumeric() || *ch == '_' || *ch == '.')) {
        return Err(TableError::InvalidChar { ch });
    }

    if ["R", "C", "TRUE", "FALSE"]
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
    {
        return Err(TableError::ReservedName);
    }
    if Range::from_a1(name).is_ok() || looks_like_r1c1_reference(name) {
        return Err(TableError::ConflictsWithCellReference);
    }
    Ok(())
}

/// `R<n>`, `C<n>` and `R<n>C<n>` (case-insensitive).
fn looks_like_r1c1_reference(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if let Some(rest) = upper.strip_prefix('C') {
        return digits(rest);
    }
    let Some(rest) = upper.strip_prefix('R') else {
        return false;
    };
    match rest.split_once('C') {
        Some((row, col)) => digits(row) && digits(col),
        None => digits(rest),
    }
}

/// Visual style binding of a table (`tableStyleInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStyleInfo {
    pub name: String,
    pub show_first_column: bool,
    pub show_last_column: bool,
    pub show_row_stripes: bool,
    pub show_column_stripes: bool,
}

impl Default for TableStyleInfo {
    fn default() -> Self {
        Self {
            name: "TableStyleMedium2".to_string(),
            show_first_column: false,
            show_last_column: false,
            show_row_stripes: true,
            show_column_stripes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: u32,
    pub name: String,
}

/// A structured range on a worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Workbook-unique id (`table/@id`).
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub range: Range,
    pub header_row_count: u32,
    pub totals_row_count: u32,
    pub columns: Vec<TableColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TableStyleInfo>,
    #[serde(default)]
    pub auto_filter: bool,
}

impl Table {
    /// A table over `range` with default `ColumnN` names.
    pub fn new(id: u32, name: impl Into<String>, range: Range, has_header: bool) -> Self {
        let name = name.into();
        let columns = (1..=range.width())
            .map(|n| TableColumn {
                id: n,
                name: format!("Column{n}"),
            })
            .collect();
        Self {
            id,
            display_name: name.clone(),
            name,
            range,
            header_row_count: u32::from(has_header),
            totals_row_count: 0,
            columns,
            style: Some(TableStyleInfo::default()),
            auto_filter: has_header,
        }
    }

    /// Replace column names, keeping them unique the way Excel does
    /// (`Amount`, `Amount2`, ...). Blank names become `ColumnN`.
    pub fn set_column_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut used: HashSet<String> = HashSet::new();
        for (idx, (column, name)) in self.columns.iter_mut().zip(names).enumerate() {
            let base = name
                .map(Into::into)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Column{}", idx + 1));
            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.to_lowercase()) {
                candidate = format!("{base}{n}");
                n += 1;
            }
            column.name = candidate;
        }
    }

    /// Move or resize the table. Columns are dropped from the right or added
    /// as `ColumnN` to match the new width.
    pub fn set_range(&mut self, new_range: Range) -> Result<(), TableError> {
        if new_range.height() <= self.header_row_count + self.totals_row_count {
            return Err(TableError::InvalidRange);
        }
        let new_width = new_range.width() as usize;
        if new_width < self.columns.len() {
            self.columns.truncate(new_width);
        } else {
            let mut next_id = self.columns.iter().map(|c| c.id).max().unwrap_or(0) + 1;
            while self.columns.len() < new_width {
                let n = self.columns.len() + 1;
                self.columns.push(TableColumn {
                    id: next_id,
                    name: format!("Column{n}"),
                });
                next_id += 1;
            }
        }
        self.range = new_range;
        Ok(())
    }

    /// Insert a column definition at `index` and widen the range by one
    /// column on the right. Cell contents are not moved. Without a name the
    /// column is called `ColumnN` (suffixed until unique).
    pub fn insert_column(&mut self, index: usize, name: Option<&str>) -> Result<(), TableError> {
        let len = self.columns.len();
        if index > len {
            return Err(TableError::ColumnIndexOutOfRange { index, len });
        }
        let end = self
            .range
            .end
            .col
            .checked_add(1)
            .ok_or(TableError::InvalidRange)?;
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) if self.column_index(name).is_some() => {
                return Err(TableError::DuplicateColumnName(name.to_string()))
            }
            Some(name) => name.to_string(),
            None => {
                let base = format!("Column{}", index + 1);
                std::iter::once(base.clone())
                    .chain((2u32..).map(|n| format!("{base}{n}")))
                    .find(|candidate| self.column_index(candidate).is_none())
                    .unwrap_or(base)
            }
        };
        let id = self.columns.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        self.columns.insert(index, TableColumn { id, name });
        self.range.end.col = end;
        Ok(())
    }

    /// Resize so the table holds `count` data rows between its header and
    /// totals rows. The top-left corner stays put.
    pub fn set_data_row_count(&mut self, count: u32) -> Result<(), TableError> {
        let height = self
            .header_row_count
            .checked_add(self.totals_row_count)
            .and_then(|h| h.checked_add(count))
            .ok_or(TableError::InvalidRange)?;
        if count == 0 {
            return Err(TableError::InvalidRange);
        }
        let end_row = self.range.start.row + height - 1;
        self.set_range(Range::new(
            self.range.start,
            CellRef::new(end_row, self.range.end.col),
        ))
    }

    /// Rows between the header and totals rows.
    pub fn data_range(&self) -> Option<Range> {
        let r = self.range;
        let start_row = r.start.row.checked_add(self.header_row_count)?;
        let end_row = r.end.row.checked_sub(self.totals_row_count)?;
        if start_row > end_row {
            return None;
        }
        Some(Range::new(
            CellRef::new(start_row, r.start.col),
            CellRef::new(end_row, r.end.col),
        ))
    }

    pub fn header_range(&self) -> Option<Range> {
        if self.header_row_count == 0 {
            return None;
        }
        let r = self.range;
        let header_end = r.start.row + self.header_row_count - 1;
        Some(Range::new(r.start, CellRef::new(header_end, r.end.col)))
    }

    /// 0-based offset of the column called `name` (case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<u32> {
        self.columns
            .iter()
            .position(|c| c.name.to_lowercase() == name.to_lowercase())
            .map(|idx| idx as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_follow_excel_rules() {
        assert!(validate_table_name("Sales_2024").is_ok());
        assert!(validate_table_name("_tbl.data").is_ok());
        assert_eq!(validate_table_name(""), Err(TableError::EmptyName));
        assert_eq!(validate_table_name("1abc"), Err(TableError::InvalidStartChar));
        assert_eq!(
            validate_table_name("has space"),
            Err(TableError::InvalidChar { ch: ' ' })
        );
        assert_eq!(
            validate_table_name("AB12"),
            Err(TableError::ConflictsWithCellReference)
        );
        assert_eq!(
            validate_table_name("r2c3"),
            Err(TableError::ConflictsWithCellReference)
        );
        assert_eq!(validate_table_name("TRUE"), Err(TableError::ReservedName));
    }

    #[test]
    fn duplicate_column_names_get_suffixes() {
        let range = Range::from_a1("A1:C4").unwrap();
        let mut table = Table::new(1, "T", range, true);
        table.set_column_names([Some("Amount"), Some("amount"), None]);
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Amount", "amount2", "Column3"]);
        assert_eq!(table.column_index("AMOUNT2"), Some(1));
        assert_eq!(table.data_range(), Some(Range::from_a1("A2:C4").unwrap()));
    }
}
