//! Page layout used when printing a worksheet.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn to_ooxml(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    /// `default` and unknown values print portrait.
    pub fn from_ooxml(value: &str) -> Self {
        match value {
            "landscape" => Orientation::Landscape,
            _ => Orientation::Portrait,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSize {
    /// OpenXML `ST_PaperSize` numeric code (e.g. `1` = Letter, `9` = A4).
    pub code: u16,
}

impl PaperSize {
    pub const LETTER: Self = Self { code: 1 };
    pub const A4: Self = Self { code: 9 };
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::LETTER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    /// Inches.
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

/// `pageSetup` plus the page flags of `sheetPr/pageSetUpPr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub orientation: Orientation,
    pub paper_size: PaperSize,
    /// Print scale in percent. Ignored while `fit_to_page` is set.
    pub scale: u16,
    /// Pages across; 0 leaves the width unconstrained.
    pub fit_to_width: u16,
    pub fit_to_height: u16,
    pub fit_to_page: bool,
    pub auto_page_breaks: bool,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            paper_size: PaperSize::LETTER,
            scale: 100,
            fit_to_width: 1,
            fit_to_height: 1,
            fit_to_page: false,
            auto_page_breaks: true,
        }
    }
}

/// `printOptions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintOptions {
    pub horizontal_centered: bool,
    pub vertical_centered: bool,
    /// Print cell grid lines.
    pub grid_lines: bool,
    /// Print row and column headings.
    pub headings: bool,
}

impl PrintOptions {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
