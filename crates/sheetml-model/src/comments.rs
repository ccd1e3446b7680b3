use serde::{Deserialize, Serialize};

use crate::rich_text::RichText;
use crate::CellRef;

fn default_cell_ref() -> CellRef {
    CellRef::new(0, 0)
}

/// A cell note (legacy comment).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default = "default_cell_ref")]
    pub cell_ref: CellRef,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: RichText,
    /// Shown permanently rather than on hover.
    #[serde(default)]
    pub visible: bool,
}

impl Comment {
    pub fn new(cell_ref: CellRef, author: impl Into<String>, text: impl Into<RichText>) -> Self {
        Self {
            cell_ref,
            author: author.into(),
            text: text.into(),
            visible: false,
        }
    }
}
