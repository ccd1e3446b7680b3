use serde::{Deserialize, Serialize};

pub use crate::rich_text::RichText;
use crate::shared_strings::SharedStringTable;
use crate::ErrorValue;

/// How a string cell stores its text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StringValue {
    /// Index into the workbook shared string table.
    Shared(u32),
    /// Text carried on the cell itself (`t="inlineStr"`).
    Inline(RichText),
}

impl StringValue {
    /// Resolve to rich text, consulting the shared table for shared entries.
    pub fn resolve<'a>(&'a self, strings: Option<&'a SharedStringTable>) -> Option<&'a RichText> {
        match self {
            StringValue::Inline(text) => Some(text),
            StringValue::Shared(idx) => strings.and_then(|table| table.get(*idx)),
        }
    }
}

/// Stored value of a cell, or the cached result of its formula.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Empty / unset cell value.
    #[default]
    Blank,
    /// IEEE-754 double precision number.
    Number(f64),
    /// Shared or inline string.
    String(StringValue),
    /// Boolean.
    Boolean(bool),
    /// Excel error value.
    Error(ErrorValue),
}

impl CellValue {
    /// Returns true if the value is [`CellValue::Blank`].
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Inline string value from plain text.
    pub fn inline_text(text: impl Into<RichText>) -> Self {
        CellValue::String(StringValue::Inline(text.into()))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<ErrorValue> {
        match self {
            CellValue::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(f64::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<ErrorValue> for CellValue {
    fn from(value: ErrorValue) -> Self {
        CellValue::Error(value)
    }
}

impl From<StringValue> for CellValue {
    fn from(value: StringValue) -> Self {
        CellValue::String(value)
    }
}
