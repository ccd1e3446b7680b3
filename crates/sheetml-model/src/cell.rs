use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::value::{RichText, StringValue};
use crate::{CellRef, CellValue, ErrorValue, Range};

/// Excel-compatible maximum rows per worksheet (1,048,576).
pub const EXCEL_MAX_ROWS: u32 = 1_048_576;

/// Excel-compatible maximum columns per worksheet (16,384).
pub const EXCEL_MAX_COLS: u32 = 16_384;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity for cells and rows; never reused.
pub(crate) fn next_serial() -> u64 {
    NEXT_SERIAL.fetch_add(1, Ordering::Relaxed)
}

/// The observable type of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Blank,
    Numeric,
    String,
    Boolean,
    Error,
    Formula,
}

impl CellType {
    /// Type of a plain (non-formula) value.
    pub fn of_value(value: &CellValue) -> Self {
        match value {
            CellValue::Blank => CellType::Blank,
            CellValue::Number(_) => CellType::Numeric,
            CellValue::String(_) => CellType::String,
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::Error(_) => CellType::Error,
        }
    }
}

/// Errors raised by cell-level mutators.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    #[error("cell {cell} is part of multi-cell array formula {range}; you cannot change part of an array")]
    PartOfArrayFormula { cell: CellRef, range: Range },
    #[error("formula text must not be empty")]
    EmptyFormula,
    #[error("use set_formula to make a cell a formula cell")]
    FormulaNeedsText,
    #[error("column index {0} is outside the sheet grid")]
    ColumnOutOfBounds(u32),
}

/// A single worksheet cell.
///
/// A formula cell keeps the formula text (without a leading `=`) plus the
/// cached result in `value`. Members of a multi-cell array group all carry the
/// group range; only the top-left cell carries the formula text.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    address: CellRef,
    serial: u64,
    value: CellValue,
    formula: Option<String>,
    array_range: Option<Range>,
    style_id: u32,
}

impl Cell {
    pub(crate) fn new(address: CellRef) -> Self {
        Self {
            address,
            serial: next_serial(),
            value: CellValue::Blank,
            formula: None,
            array_range: None,
            style_id: 0,
        }
    }

    pub fn address(&self) -> CellRef {
        self.address
    }

    pub fn row(&self) -> u32 {
        self.address.row
    }

    pub fn col(&self) -> u32 {
        self.address.col
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn set_address(&mut self, address: CellRef) {
        self.address = address;
    }

    /// A copy of this cell with a fresh identity, placed at `address`.
    pub(crate) fn duplicate_at(&self, address: CellRef) -> Self {
        Self {
            address,
            serial: next_serial(),
            ..self.clone()
        }
    }

    pub fn cell_type(&self) -> CellType {
        if self.formula.is_some() || self.array_range.is_some() {
            CellType::Formula
        } else {
            CellType::of_value(&self.value)
        }
    }

    /// Type of the cached value (for formula cells) or the value itself.
    pub fn cached_result_type(&self) -> CellType {
        CellType::of_value(&self.value)
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn style_id(&self) -> u32 {
        self.style_id
    }

    /// Style changes are allowed on every cell, array members included.
    pub fn set_style_id(&mut self, style_id: u32) {
        self.style_id = style_id;
    }

    pub fn array_formula_range(&self) -> Option<Range> {
        self.array_range
    }

    pub fn is_part_of_array_formula_group(&self) -> bool {
        self.array_range.is_some()
    }

    /// True for the top-left cell of an array group (the one holding the text).
    pub fn is_array_formula_anchor(&self) -> bool {
        self.array_range
            .is_some_and(|range| range.start == self.address)
    }

    /// Replace the cell's value with a plain (non-formula) value.
    ///
    /// Any formula is dropped. Fails on members of a multi-cell array group;
    /// use [`crate::Worksheet::set_value`] to dissolve such a group.
    pub fn set_value(&mut self, value: impl Into<CellValue>) -> Result<(), CellError> {
        self.ensure_not_in_multi_cell_array()?;
        self.value = value.into();
        self.formula = None;
        self.array_range = None;
        Ok(())
    }

    /// Set (or with `None`, remove) the formula text. A leading `=` is dropped.
    ///
    /// Removing the formula keeps the cached value as a plain value.
    pub fn set_formula(&mut self, formula: Option<&str>) -> Result<(), CellError> {
        let normalized = match formula {
            Some(text) => {
                let text = text.trim();
                let text = text.strip_prefix('=').unwrap_or(text).trim();
                if text.is_empty() {
                    return Err(CellError::EmptyFormula);
                }
                Some(text.to_string())
            }
            None => None,
        };
        self.ensure_not_in_multi_cell_array()?;
        self.array_range = None;
        self.formula = normalized;
        Ok(())
    }

    /// Clear value and formula.
    pub fn set_blank(&mut self) -> Result<(), CellError> {
        self.set_value(CellValue::Blank)
    }

    /// Record the evaluated result of a formula without touching the formula.
    ///
    /// Array members accept cached results; each holds its own slice of the
    /// group's result.
    pub fn set_cached_value(&mut self, value: impl Into<CellValue>) {
        self.value = value.into();
    }

    /// Convert the cell to `cell_type`, carrying the current value over where
    /// a sensible conversion exists.
    ///
    /// Strings produced from other types are stored inline.
    pub fn set_cell_type(&mut self, cell_type: CellType) -> Result<(), CellError> {
        let converted = match cell_type {
            CellType::Formula if self.cell_type() == CellType::Formula => return Ok(()),
            CellType::Formula => return Err(CellError::FormulaNeedsText),
            CellType::Blank => CellValue::Blank,
            CellType::Numeric => CellValue::Number(self.value.as_number().unwrap_or(0.0)),
            CellType::Boolean => CellValue::Boolean(match &self.value {
                CellValue::Boolean(b) => *b,
                CellValue::Number(n) => *n != 0.0,
                _ => false,
            }),
            CellType::Error => CellValue::Error(self.value.as_error().unwrap_or(ErrorValue::NA)),
            CellType::String => match &self.value {
                CellValue::String(s) => CellValue::String(s.clone()),
                CellValue::Blank => CellValue::inline_text(""),
                CellValue::Number(n) => CellValue::inline_text(format_number(*n)),
                CellValue::Boolean(b) => {
                    CellValue::inline_text(if *b { "TRUE" } else { "FALSE" })
                }
                CellValue::Error(e) => CellValue::inline_text(e.as_str()),
            },
        };
        self.set_value(converted)
    }

    /// Set an inline string value.
    pub fn set_inline_string(&mut self, text: impl Into<RichText>) -> Result<(), CellError> {
        self.set_value(CellValue::String(StringValue::Inline(text.into())))
    }

    pub(crate) fn clear_array_membership(&mut self) {
        self.array_range = None;
    }

    pub(crate) fn join_array_group(&mut self, range: Range, formula: Option<String>) {
        self.array_range = Some(range);
        self.formula = formula;
    }

    pub(crate) fn set_array_range(&mut self, range: Option<Range>) {
        self.array_range = range;
    }

    pub(crate) fn replace_formula_unchecked(&mut self, formula: Option<String>) {
        self.formula = formula;
    }

    pub(crate) fn ensure_not_in_multi_cell_array(&self) -> Result<(), CellError> {
        match self.array_range {
            Some(range) if !range.is_single_cell() => Err(CellError::PartOfArrayFormula {
                cell: self.address,
                range,
            }),
            _ => Ok(()),
        }
    }
}

/// Render a number the way a cell shows it in General format (`1`, `2.5`).
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_text_drops_leading_equals() {
        let mut cell = Cell::new(CellRef::new(0, 0));
        cell.set_value(3.0).unwrap();
        cell.set_formula(Some("=SUM(B1:B3)")).unwrap();
        assert_eq!(cell.formula(), Some("SUM(B1:B3)"));
        assert_eq!(cell.cell_type(), CellType::Formula);
        assert_eq!(cell.cached_result_type(), CellType::Numeric);

        cell.set_formula(None).unwrap();
        assert_eq!(cell.cell_type(), CellType::Numeric);
        assert_eq!(cell.value(), &CellValue::Number(3.0));
    }

    #[test]
    fn plain_value_clears_formula() {
        let mut cell = Cell::new(CellRef::new(2, 2));
        cell.set_formula(Some("1+1")).unwrap();
        cell.set_value(true).unwrap();
        assert_eq!(cell.formula(), None);
        assert_eq!(cell.cell_type(), CellType::Boolean);
    }

    #[test]
    fn multi_cell_array_members_reject_edits() {
        let range = Range::from_a1("C4:C6").unwrap();
        let mut member = Cell::new(CellRef::from_a1("C5").unwrap());
        member.join_array_group(range, None);

        assert!(matches!(
            member.set_value(1.0),
            Err(CellError::PartOfArrayFormula { .. })
        ));
        assert!(member.set_formula(Some("1")).is_err());
        member.set_style_id(3);
        assert_eq!(member.style_id(), 3);
        assert!(!member.is_array_formula_anchor());
    }

    #[test]
    fn set_cell_type_converts_values() {
        let mut cell = Cell::new(CellRef::new(0, 0));
        cell.set_value(2.0).unwrap();
        cell.set_cell_type(CellType::String).unwrap();
        assert_eq!(cell.value(), &CellValue::inline_text("2"));
        cell.set_cell_type(CellType::Blank).unwrap();
        assert_eq!(cell.cell_type(), CellType::Blank);
        assert_eq!(
            cell.set_cell_type(CellType::Formula),
            Err(CellError::FormulaNeedsText)
        );
    }
}
