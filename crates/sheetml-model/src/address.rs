use core::fmt;

use serde::{Deserialize, Serialize};

use crate::cell::{EXCEL_MAX_COLS, EXCEL_MAX_ROWS};

/// A reference to a single cell within a worksheet.
///
/// Rows and columns are **0-indexed**:
/// - `row = 0` is Excel row `1`
/// - `col = 0` is Excel column `A`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    /// 0-indexed row.
    pub row: u32,
    /// 0-indexed column.
    pub col: u32,
}

impl CellRef {
    /// Construct a new [`CellRef`] without bounds validation.
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Construct a [`CellRef`], rejecting coordinates outside the sheet grid.
    pub fn checked(row: u32, col: u32) -> Result<Self, A1ParseError> {
        if col >= EXCEL_MAX_COLS {
            return Err(A1ParseError::InvalidColumn);
        }
        if row >= EXCEL_MAX_ROWS {
            return Err(A1ParseError::InvalidRow);
        }
        Ok(Self { row, col })
    }

    /// Returns true if the reference lies inside the sheet grid.
    #[inline]
    pub const fn is_in_bounds(self) -> bool {
        self.row < EXCEL_MAX_ROWS && self.col < EXCEL_MAX_COLS
    }

    /// Convert to Excel A1 notation (e.g. `A1`, `BC32`).
    pub fn to_a1(self) -> String {
        format!("{}{}", col_to_name(self.col), self.row + 1)
    }

    /// Parse an Excel A1-style reference (e.g. `A1`, `$B$2`).
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }

        // Accept optional `$` markers.
        let mut idx = 0usize;
        let bytes = s.as_bytes();
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let col_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
            idx += 1;
        }

        if idx == col_start {
            return Err(A1ParseError::MissingColumn);
        }

        let col_str = &s[col_start..idx];
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let row_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }

        if idx == row_start {
            return Err(A1ParseError::MissingRow);
        }
        if idx != bytes.len() {
            return Err(A1ParseError::TrailingCharacters);
        }

        let col = column_index_from_name(col_str)?;
        let row_1_based: u32 = s[row_start..idx]
            .parse()
            .map_err(|_| A1ParseError::InvalidRow)?;
        if row_1_based == 0 || row_1_based > EXCEL_MAX_ROWS {
            return Err(A1ParseError::InvalidRow);
        }

        Ok(Self {
            row: row_1_based - 1,
            col,
        })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

impl core::str::FromStr for CellRef {
    type Err = A1ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_a1(s)
    }
}

/// A rectangular region within a worksheet.
///
/// The range is inclusive and always normalized such that:
/// - `start.row <= end.row`
/// - `start.col <= end.col`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    /// Construct a new range, normalizing coordinates if needed.
    pub const fn new(a: CellRef, b: CellRef) -> Self {
        let start_row = if a.row <= b.row { a.row } else { b.row };
        let end_row = if a.row <= b.row { b.row } else { a.row };
        let start_col = if a.col <= b.col { a.col } else { b.col };
        let end_col = if a.col <= b.col { b.col } else { a.col };
        Self {
            start: CellRef::new(start_row, start_col),
            end: CellRef::new(end_row, end_col),
        }
    }

    /// A range covering exactly one cell.
    pub const fn single(cell: CellRef) -> Self {
        Self {
            start: cell,
            end: cell,
        }
    }

    /// Returns true if `cell` lies within this range.
    #[inline]
    pub const fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    /// Returns true if `other` lies entirely within this range.
    #[inline]
    pub const fn contains_range(&self, other: &Range) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    /// Returns true if the two ranges share at least one cell.
    #[inline]
    pub const fn intersects(&self, other: &Range) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Number of columns in the range.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Number of rows in the range.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Total number of cells covered by the range.
    #[inline]
    pub const fn cell_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns true if the range is exactly one cell.
    #[inline]
    pub const fn is_single_cell(&self) -> bool {
        self.start.row == self.end.row && self.start.col == self.end.col
    }

    /// Iterate every cell of the range in row-major order.
    pub fn cells(&self) -> RangeIter {
        RangeIter {
            range: *self,
            next: Some(self.start),
        }
    }

    /// Move the range by a row/column delta.
    ///
    /// Returns `None` when any corner would leave the sheet grid.
    pub fn translate(&self, row_delta: i64, col_delta: i64) -> Option<Range> {
        let shift = |cell: CellRef| -> Option<CellRef> {
            let row = u32::try_from(i64::from(cell.row) + row_delta).ok()?;
            let col = u32::try_from(i64::from(cell.col) + col_delta).ok()?;
            CellRef::checked(row, col).ok()
        };
        Some(Range::new(shift(self.start)?, shift(self.end)?))
    }

    /// Parse an Excel A1-style range like `A1:B2` or a single-cell reference like `C3`.
    pub fn from_a1(a1: &str) -> Result<Self, RangeParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(RangeParseError::Empty);
        }

        match s.split_once(':') {
            None => {
                let cell = CellRef::from_a1(s).map_err(RangeParseError::Cell)?;
                Ok(Range::new(cell, cell))
            }
            Some((a, b)) => {
                let start = CellRef::from_a1(a).map_err(RangeParseError::Cell)?;
                let end = CellRef::from_a1(b).map_err(RangeParseError::Cell)?;
                Ok(Range::new(start, end))
            }
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl core::str::FromStr for Range {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_a1(s)
    }
}

/// Row-major iterator over the cells of a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter {
    range: Range,
    next: Option<CellRef>,
}

impl Iterator for RangeIter {
    type Item = CellRef;

    fn next(&mut self) -> Option<CellRef> {
        let current = self.next?;
        self.next = if current.col < self.range.end.col {
            Some(CellRef::new(current.row, current.col + 1))
        } else if current.row < self.range.end.row {
            Some(CellRef::new(current.row + 1, self.range.start.col))
        } else {
            None
        };
        Some(current)
    }
}

/// A range optionally qualified by a sheet name (`Sheet1!A1:B2`, `'My Sheet'!C3`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetArea {
    pub sheet: Option<String>,
    pub range: Range,
}

impl SheetArea {
    /// Parse a possibly sheet-qualified area reference.
    pub fn parse(text: &str) -> Result<Self, RangeParseError> {
        let s = text.trim();
        let Some(bang) = s.rfind('!') else {
            return Ok(Self {
                sheet: None,
                range: Range::from_a1(s)?,
            });
        };

        let (sheet_part, range_part) = (&s[..bang], &s[bang + 1..]);
        let sheet = if let Some(quoted) = sheet_part
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            quoted.replace("''", "'")
        } else {
            sheet_part.to_string()
        };
        if sheet.is_empty() {
            return Err(RangeParseError::EmptySheetName);
        }

        Ok(Self {
            sheet: Some(sheet),
            range: Range::from_a1(range_part)?,
        })
    }
}

impl fmt::Display for SheetArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(name) if sheet_name_needs_quotes(name) => {
                write!(f, "'{}'!{}", name.replace('\'', "''"), self.range)
            }
            Some(name) => write!(f, "{name}!{}", self.range),
            None => write!(f, "{}", self.range),
        }
    }
}

fn sheet_name_needs_quotes(name: &str) -> bool {
    name.chars().any(|ch| !(ch.is_alphanumeric() || ch == '_' || ch == '.'))
        || name.chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

/// Errors that can occur when parsing an A1 cell reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum A1ParseError {
    Empty,
    MissingColumn,
    MissingRow,
    InvalidColumn,
    InvalidRow,
    TrailingCharacters,
}

impl fmt::Display for A1ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            A1ParseError::Empty => "empty A1 reference",
            A1ParseError::MissingColumn => "missing column in A1 reference",
            A1ParseError::MissingRow => "missing row in A1 reference",
            A1ParseError::InvalidColumn => "invalid column in A1 reference",
            A1ParseError::InvalidRow => "invalid row in A1 reference",
            A1ParseError::TrailingCharacters => "trailing characters in A1 reference",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for A1ParseError {}

/// Errors that can occur when parsing an A1 range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeParseError {
    Empty,
    EmptySheetName,
    Cell(A1ParseError),
}

impl fmt::Display for RangeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeParseError::Empty => f.write_str("empty A1 range"),
            RangeParseError::EmptySheetName => f.write_str("empty sheet name in area reference"),
            RangeParseError::Cell(e) => write!(f, "invalid cell reference in range: {e}"),
        }
    }
}

impl std::error::Error for RangeParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RangeParseError::Cell(e) => Some(e),
            _ => None,
        }
    }
}

impl From<A1ParseError> for RangeParseError {
    fn from(value: A1ParseError) -> Self {
        RangeParseError::Cell(value)
    }
}

/// Convert a 0-based column index to its letters (`0 -> "A"`, `26 -> "AA"`).
pub fn column_name(col: u32) -> String {
    col_to_name(col)
}

fn col_to_name(col: u32) -> String {
    // Excel columns are 1-based in A1 notation. We store 0-based internally.
    let mut n = col as u64 + 1;
    let mut out = Vec::<u8>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Parse column letters (case-insensitive) into a 0-based column index.
pub fn column_index_from_name(s: &str) -> Result<u32, A1ParseError> {
    if s.is_empty() {
        return Err(A1ParseError::MissingColumn);
    }
    let mut col: u32 = 0;
    for b in s.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(A1ParseError::InvalidColumn);
        }
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(v))
            .ok_or(A1ParseError::InvalidColumn)?;
        if col > EXCEL_MAX_COLS {
            return Err(A1ParseError::InvalidColumn);
        }
    }
    Ok(col - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_roundtrip() {
        let c = CellRef::new(0, 0);
        assert_eq!(c.to_a1(), "A1");
        assert_eq!(CellRef::from_a1("A1").unwrap(), c);
        assert_eq!(CellRef::from_a1("$A$1").unwrap(), c);

        let c2 = CellRef::new(31, 54); // BC32
        assert_eq!(c2.to_a1(), "BC32");
        assert_eq!(CellRef::from_a1("bc32").unwrap(), c2);
    }

    #[test]
    fn a1_range_parsing() {
        let r = Range::from_a1("A1:B2").unwrap();
        assert_eq!(r.start, CellRef::new(0, 0));
        assert_eq!(r.end, CellRef::new(1, 1));

        let single = Range::from_a1("C3").unwrap();
        assert!(single.is_single_cell());
        assert_eq!(single.start, CellRef::new(2, 2));

        assert_eq!(Range::from_a1("C4:C4").unwrap().to_string(), "C4");
        assert_eq!(Range::from_a1("C6:C4").unwrap().to_string(), "C4:C6");
    }

    #[test]
    fn a1_bounds_are_excel_compatible() {
        assert!(CellRef::from_a1("XFD1048576").is_ok());
        assert_eq!(CellRef::from_a1("XFE1"), Err(A1ParseError::InvalidColumn));
        assert_eq!(CellRef::from_a1("A1048577"), Err(A1ParseError::InvalidRow));
        assert_eq!(CellRef::from_a1("A0"), Err(A1ParseError::InvalidRow));
        assert_eq!(
            CellRef::checked(0, EXCEL_MAX_COLS),
            Err(A1ParseError::InvalidColumn)
        );
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert_eq!(CellRef::from_a1(""), Err(A1ParseError::Empty));
        assert_eq!(CellRef::from_a1("12"), Err(A1ParseError::MissingColumn));
        assert_eq!(CellRef::from_a1("AB"), Err(A1ParseError::MissingRow));
        assert_eq!(
            CellRef::from_a1("A1B"),
            Err(A1ParseError::TrailingCharacters)
        );
        assert!(Range::from_a1("A1:").is_err());
    }

    #[test]
    fn range_geometry() {
        let a = Range::from_a1("B2:D4").unwrap();
        let b = Range::from_a1("D4:E5").unwrap();
        let c = Range::from_a1("E1:F1").unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_range(&Range::from_a1("C3").unwrap()));
        assert_eq!(a.cell_count(), 9);

        let cells: Vec<String> = Range::from_a1("A1:B2")
            .unwrap()
            .cells()
            .map(|c| c.to_a1())
            .collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);

        assert_eq!(a.translate(1, -1).unwrap().to_string(), "A3:C5");
        assert!(a.translate(-2, 0).is_none());
    }

    #[test]
    fn sheet_area_parsing() {
        let area = SheetArea::parse("'My Sheet'!$A$1:$B$3").unwrap();
        assert_eq!(area.sheet.as_deref(), Some("My Sheet"));
        assert_eq!(area.range.to_string(), "A1:B3");
        assert_eq!(area.to_string(), "'My Sheet'!A1:B3");

        let plain = SheetArea::parse("Sheet1!C4").unwrap();
        assert_eq!(plain.to_string(), "Sheet1!C4");

        assert_eq!(
            SheetArea::parse("!A1"),
            Err(RangeParseError::EmptySheetName)
        );
    }
}
