//! Seam for an external formula evaluator.
//!
//! The model never evaluates formulas itself. [`crate::Workbook::recalculate`]
//! walks every formula cell and array-group anchor, hands the formula to a
//! [`FormulaEvaluator`], and stores the returned values as cached results.

use crate::{CellRef, CellValue, ErrorValue, Range, Workbook, WorksheetId};

/// Result of evaluating one formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// A single value. For an array group it is broadcast to every member.
    Scalar(CellValue),
    /// Row-major values for an array group. Positions the array does not
    /// cover become `#N/A`.
    Array(Vec<Vec<CellValue>>),
}

impl Evaluation {
    /// Value for offset `(row, col)` within the target range.
    pub(crate) fn value_at(&self, row: usize, col: usize) -> CellValue {
        match self {
            Evaluation::Scalar(value) => value.clone(),
            Evaluation::Array(rows) => rows
                .get(row)
                .and_then(|r| r.get(col))
                .cloned()
                .unwrap_or(CellValue::Error(ErrorValue::NA)),
        }
    }
}

/// A pluggable formula engine.
pub trait FormulaEvaluator {
    /// Evaluate `formula` (stored without a leading `=`) at `anchor`.
    ///
    /// `array_range` is the group range when the formula belongs to an array
    /// group, including single-cell groups.
    fn evaluate(
        &mut self,
        workbook: &Workbook,
        sheet: WorksheetId,
        anchor: CellRef,
        formula: &str,
        array_range: Option<Range>,
    ) -> Evaluation;
}

impl<F> FormulaEvaluator for F
where
    F: FnMut(&Workbook, WorksheetId, CellRef, &str, Option<Range>) -> Evaluation,
{
    fn evaluate(
        &mut self,
        workbook: &Workbook,
        sheet: WorksheetId,
        anchor: CellRef,
        formula: &str,
        array_range: Option<Range>,
    ) -> Evaluation {
        self(workbook, sheet, anchor, formula, array_range)
    }
}
