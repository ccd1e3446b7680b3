use core::fmt;

use serde::{Deserialize, Serialize};

use crate::WorksheetId;

/// Identifier for a defined name.
pub type DefinedNameId = u32;

/// Maximum length of a defined name in characters (Excel-compatible).
pub const EXCEL_DEFINED_NAME_MAX_LEN: usize = 255;

/// Built-in defined name for a sheet's print area.
pub const XLNM_PRINT_AREA: &str = "_xlnm.Print_Area";
/// Built-in defined name for a sheet's print titles.
pub const XLNM_PRINT_TITLES: &str = "_xlnm.Print_Titles";
/// Built-in defined name for a sheet's autofilter database range.
pub const XLNM_FILTER_DATABASE: &str = "_xlnm._FilterDatabase";

fn is_false(v: &bool) -> bool {
    !*v
}

/// Scope of a defined name.
///
/// Sheet scopes hold the sheet's stable id, so reordering sheets never
/// re-targets a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "worksheet_id", rename_all = "snake_case")]
pub enum DefinedNameScope {
    Workbook,
    Sheet(WorksheetId),
}

/// A workbook- or sheet-scoped defined name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinedName {
    pub id: DefinedNameId,
    pub name: String,
    pub scope: DefinedNameScope,
    /// Definition, stored **without** a leading `=` (`Sheet1!$A$1:$B$4`).
    pub refers_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

/// Excel-compatible validation errors for defined names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinedNameValidationError {
    Empty,
    TooLong { len: usize, max: usize },
    InvalidStartCharacter(char),
    InvalidCharacter { ch: char, index: usize },
    LooksLikeCellReference,
}

impl fmt::Display for DefinedNameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("defined name cannot be empty"),
            Self::TooLong { len, max } => write!(f, "defined name is too long ({len} > {max})"),
            Self::InvalidStartCharacter(ch) => {
                write!(f, "invalid first character '{ch}' in defined name")
            }
            Self::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at index {index}")
            }
            Self::LooksLikeCellReference => {
                f.write_str("defined name cannot look like a cell reference (e.g. A1 or R1C1)")
            }
        }
    }
}

impl std::error::Error for DefinedNameValidationError {}

/// Errors raised by workbook defined-name operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefinedNameError {
    #[error("sheet not found: {0}")]
    SheetNotFound(WorksheetId),
    #[error("defined name not found: {0}")]
    DefinedNameNotFound(DefinedNameId),
    #[error("defined name '{0}' already exists in this scope")]
    DuplicateName(String),
    #[error(transparent)]
    InvalidName(#[from] DefinedNameValidationError),
}

/// Column letters (1-3) followed by a row number, e.g. `A1`, `XFD99`.
fn looks_like_a1(name: &str) -> bool {
    let letters = name.bytes().take_while(u8::is_ascii_alphabetic).count();
    let rest = &name.as_bytes()[letters..];
    (1..=3).contains(&letters) && !rest.is_empty() && rest.iter().all(u8::is_ascii_digit)
}

fn looks_like_r1c1(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    if upper == "R" || upper == "C" {
        return true;
    }
    let Some(rest) = upper.strip_prefix('R') else {
        return false;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    rest.strip_prefix('C')
        .is_some_and(|cols| cols.bytes().all(|b| b.is_ascii_digit()))
}

/// Validate an Excel-compatible defined name.
///
/// - must not be empty, and at most [`EXCEL_DEFINED_NAME_MAX_LEN`] characters
/// - must start with a letter, `_`, or `\`
/// - remaining characters may be letters, digits, `_`, `.` or `\`
/// - must not read as an A1 or R1C1 cell reference
///
/// Built-in names such as [`XLNM_PRINT_AREA`] pass these rules.
pub fn validate_defined_name(name: &str) -> Result<(), DefinedNameValidationError> {
    let name = name.trim();
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(DefinedNameValidationError::Empty);
    };

    let len = name.chars().count();
    if len > EXCEL_DEFINED_NAME_MAX_LEN {
        return Err(DefinedNameValidationError::TooLong {
            len,
            max: EXCEL_DEFINED_NAME_MAX_LEN,
        });
    }
    if looks_like_a1(name) || looks_like_r1c1(name) {
        return Err(DefinedNameValidationError::LooksLikeCellReference);
    }
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(DefinedNameValidationError::InvalidStartCharacter(first));
    }
    for (offset, ch) in chars.enumerate() {
        if !(ch.is_alphanumeric() || matches!(ch, '_' | '.' | '\\')) {
            return Err(DefinedNameValidationError::InvalidCharacter {
                ch,
                index: offset + 1,
            });
        }
    }
    Ok(())
}
