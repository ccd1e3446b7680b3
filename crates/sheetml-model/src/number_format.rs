//! Number format ids and codes.
//!
//! SpreadsheetML reserves ids below [`FIRST_CUSTOM_NUM_FMT_ID`] for built-in
//! formats; only 0..=49 have a locale-independent code. Workbook-defined codes
//! are allocated upward from 164.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// First id available for workbook-defined number formats.
pub const FIRST_CUSTOM_NUM_FMT_ID: u16 = 164;

/// Built-in number format codes, indexed by id (0..=49).
///
/// Ids 23..=36 are locale-dependent and have no portable code; they are kept
/// as `reserved-0xNN` placeholders so lookups by id stay total.
pub const BUILTIN_FORMATS: [&str; 50] = [
    "General",
    "0",
    "0.00",
    "#,##0",
    "#,##0.00",
    "\"$\"#,##0_);(\"$\"#,##0)",
    "\"$\"#,##0_);[Red](\"$\"#,##0)",
    "\"$\"#,##0.00_);(\"$\"#,##0.00)",
    "\"$\"#,##0.00_);[Red](\"$\"#,##0.00)",
    "0%",
    "0.00%",
    "0.00E+00",
    "# ?/?",
    "# ??/??",
    "m/d/yy",
    "d-mmm-yy",
    "d-mmm",
    "mmm-yy",
    "h:mm AM/PM",
    "h:mm:ss AM/PM",
    "h:mm",
    "h:mm:ss",
    "m/d/yy h:mm",
    "reserved-0x17",
    "reserved-0x18",
    "reserved-0x19",
    "reserved-0x1A",
    "reserved-0x1B",
    "reserved-0x1C",
    "reserved-0x1D",
    "reserved-0x1E",
    "reserved-0x1F",
    "reserved-0x20",
    "reserved-0x21",
    "reserved-0x22",
    "reserved-0x23",
    "reserved-0x24",
    "#,##0_);(#,##0)",
    "#,##0_);[Red](#,##0)",
    "#,##0.00_);(#,##0.00)",
    "#,##0.00_);[Red](#,##0.00)",
    "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)",
    "_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)",
    "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)",
    "_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)",
    "mm:ss",
    "[h]:mm:ss",
    "mm:ss.0",
    "##0.0E+0",
    "@",
];

/// Built-in code for `id`, if it has a portable one.
pub fn builtin_format_code(id: u16) -> Option<&'static str> {
    let code = BUILTIN_FORMATS.get(id as usize)?;
    (!code.starts_with("reserved-")).then_some(*code)
}

/// Built-in id whose code matches `code` exactly.
pub fn builtin_format_id(code: &str) -> Option<u16> {
    BUILTIN_FORMATS
        .iter()
        .position(|c| *c == code && !c.starts_with("reserved-"))
        .map(|idx| idx as u16)
}

/// Number format codes known to a workbook.
///
/// Holds workbook-defined codes (ids >= 164) plus explicit overrides of
/// built-in ids. Overrides are only created by [`NumberFormatTable::put`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormatTable {
    entries: BTreeMap<u16, String>,
}

impl NumberFormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code for `id`: explicit entries first, then the built-in table.
    pub fn get(&self, id: u16) -> Option<&str> {
        self.entries
            .get(&id)
            .map(String::as_str)
            .or_else(|| builtin_format_code(id))
    }

    pub fn contains(&self, id: u16) -> bool {
        self.get(id).is_some()
    }

    /// Id for `code`, allocating the lowest free custom id when unknown.
    ///
    /// An exact built-in match returns the built-in id unless that id has been
    /// overridden to a different code. `None` once every custom id is taken.
    pub fn intern(&mut self, code: &str) -> Option<u16> {
        if let Some(id) = self.id_of(code) {
            return Some(id);
        }
        let id = self.first_free_custom_id()?;
        self.entries.insert(id, code.to_string());
        Some(id)
    }

    /// Existing id for `code`, without allocating.
    pub fn id_of(&self, code: &str) -> Option<u16> {
        if let Some((id, _)) = self.entries.iter().find(|(_, c)| c.as_str() == code) {
            return Some(*id);
        }
        builtin_format_id(code).filter(|id| !self.entries.contains_key(id))
    }

    /// Bind `id` to `code`, replacing any existing mapping (built-in or not).
    ///
    /// Every style that references `id` renders with the new code.
    pub fn put(&mut self, id: u16, code: impl Into<String>) {
        self.entries.insert(id, code.into());
    }

    /// Explicit entries (custom ids and overridden built-ins), ordered by id.
    pub fn explicit(&self) -> impl Iterator<Item = (u16, &str)> {
        self.entries.iter().map(|(id, code)| (*id, code.as_str()))
    }

    fn first_free_custom_id(&self) -> Option<u16> {
        (FIRST_CUSTOM_NUM_FMT_ID..=u16::MAX).find(|id| !self.entries.contains_key(id))
    }
}
