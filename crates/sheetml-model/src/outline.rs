use serde::{Deserialize, Serialize};

/// Maximum outline (grouping) depth for rows and columns.
pub const MAX_OUTLINE_LEVEL: u8 = 7;

/// Where summary rows/columns sit relative to their groups (`outlinePr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlinePr {
    pub summary_below: bool,
    pub summary_right: bool,
    pub show_outline_symbols: bool,
}

impl Default for OutlinePr {
    fn default() -> Self {
        Self {
            summary_below: true,
            summary_right: true,
            show_outline_symbols: true,
        }
    }
}

impl OutlinePr {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
