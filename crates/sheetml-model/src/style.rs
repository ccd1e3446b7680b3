use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::number_format::NumberFormatTable;
use crate::rich_text::Underline;
use crate::theme::{ArgbColor, IndexedPalette, ThemePalette, AUTOMATIC_COLOR_INDEX};

/// Which representation of a [`Color`] is authoritative.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ColorKind {
    /// Application default (`auto="1"`).
    Auto,
    /// Slot in the workbook's indexed palette; 64 means "automatic".
    Indexed(u16),
    /// Direct ARGB value.
    Rgb(ArgbColor),
    /// Theme color scheme index.
    Theme(u32),
}

/// A SpreadsheetML color: exactly one of auto / indexed / rgb / theme, plus an
/// optional tint that applies to rgb and theme colors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    kind: ColorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tint: Option<OrderedFloat<f64>>,
}

impl Default for Color {
    fn default() -> Self {
        Self::auto()
    }
}

impl Color {
    pub const fn auto() -> Self {
        Self {
            kind: ColorKind::Auto,
            tint: None,
        }
    }

    pub const fn indexed(index: u16) -> Self {
        Self {
            kind: ColorKind::Indexed(index),
            tint: None,
        }
    }

    pub const fn rgb(argb: ArgbColor) -> Self {
        Self {
            kind: ColorKind::Rgb(argb),
            tint: None,
        }
    }

    pub const fn theme(index: u32) -> Self {
        Self {
            kind: ColorKind::Theme(index),
            tint: None,
        }
    }

    /// Builder-style tint; ignored at resolve time for indexed/auto colors.
    pub fn with_tint(mut self, tint: f64) -> Self {
        self.set_tint(Some(tint));
        self
    }

    pub fn kind(&self) -> ColorKind {
        self.kind
    }

    pub fn tint(&self) -> Option<f64> {
        self.tint.map(|t| t.0)
    }

    pub fn set_auto(&mut self) {
        self.kind = ColorKind::Auto;
        self.tint = None;
    }

    pub fn set_indexed(&mut self, index: u16) {
        self.kind = ColorKind::Indexed(index);
        self.tint = None;
    }

    pub fn set_rgb(&mut self, argb: ArgbColor) {
        self.kind = ColorKind::Rgb(argb);
    }

    /// Set from 3 (RGB) or 4 (ARGB) bytes. Returns false if the length is wrong.
    pub fn set_rgb_bytes(&mut self, bytes: &[u8]) -> bool {
        match ArgbColor::from_bytes(bytes) {
            Some(argb) => {
                self.set_rgb(argb);
                true
            }
            None => false,
        }
    }

    pub fn set_theme(&mut self, index: u32) {
        self.kind = ColorKind::Theme(index);
    }

    /// Set the tint, clamped to `-1.0..=1.0`. `Some(0.0)` is stored as `None`.
    pub fn set_tint(&mut self, tint: Option<f64>) {
        self.tint = tint
            .map(|t| t.clamp(-1.0, 1.0))
            .filter(|t| *t != 0.0)
            .map(OrderedFloat);
    }

    pub fn indexed_slot(&self) -> Option<u16> {
        match self.kind {
            ColorKind::Indexed(i) => Some(i),
            _ => None,
        }
    }

    pub fn theme_slot(&self) -> Option<u32> {
        match self.kind {
            ColorKind::Theme(i) => Some(i),
            _ => None,
        }
    }

    /// The stored ARGB value when the color is direct RGB (untinted).
    pub fn argb(&self) -> Option<ArgbColor> {
        match self.kind {
            ColorKind::Rgb(argb) => Some(argb),
            _ => None,
        }
    }

    /// Stored RGB bytes (`[r, g, b]`) of a direct color.
    pub fn rgb_bytes(&self) -> Option<[u8; 3]> {
        self.argb().map(|c| [c.red(), c.green(), c.blue()])
    }

    /// Stored ARGB bytes (`[a, r, g, b]`) of a direct color.
    pub fn argb_bytes(&self) -> Option<[u8; 4]> {
        self.argb().map(|c| c.0.to_be_bytes())
    }

    /// Resolve to a concrete ARGB value.
    ///
    /// Indexed colors go through `palette` and never receive tint; slot 64 and
    /// `Auto` have no RGB.
    pub fn resolve(&self, palette: &IndexedPalette, theme: &ThemePalette) -> Option<ArgbColor> {
        let tint = self.tint().unwrap_or(0.0);
        match self.kind {
            ColorKind::Auto => None,
            ColorKind::Indexed(AUTOMATIC_COLOR_INDEX) => None,
            ColorKind::Indexed(index) => palette.get(index),
            ColorKind::Rgb(argb) => Some(argb.with_tint(tint)),
            ColorKind::Theme(index) => theme.by_index(index).map(|c| c.with_tint(tint)),
        }
    }
}

/// Font record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Font {
    pub name: String,
    /// Font size in 1/100 points (e.g. 1100 = 11pt).
    pub size_100pt: u16,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<Underline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size_100pt: 1100,
            bold: false,
            italic: false,
            strike: false,
            underline: None,
            color: Some(Color::theme(1)),
        }
    }
}

impl Font {
    pub fn size_points(&self) -> f32 {
        f32::from(self.size_100pt) / 100.0
    }

    pub fn set_size_points(&mut self, points: f32) {
        self.size_100pt = (points * 100.0).round().clamp(0.0, f32::from(u16::MAX)) as u16;
    }
}

/// Pattern fill types (`patternType`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPattern {
    #[default]
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray125,
    Gray0625,
}

impl FillPattern {
    const NAMES: [(FillPattern, &'static str); 19] = [
        (FillPattern::None, "none"),
        (FillPattern::Solid, "solid"),
        (FillPattern::MediumGray, "mediumGray"),
        (FillPattern::DarkGray, "darkGray"),
        (FillPattern::LightGray, "lightGray"),
        (FillPattern::DarkHorizontal, "darkHorizontal"),
        (FillPattern::DarkVertical, "darkVertical"),
        (FillPattern::DarkDown, "darkDown"),
        (FillPattern::DarkUp, "darkUp"),
        (FillPattern::DarkGrid, "darkGrid"),
        (FillPattern::DarkTrellis, "darkTrellis"),
        (FillPattern::LightHorizontal, "lightHorizontal"),
        (FillPattern::LightVertical, "lightVertical"),
        (FillPattern::LightDown, "lightDown"),
        (FillPattern::LightUp, "lightUp"),
        (FillPattern::LightGrid, "lightGrid"),
        (FillPattern::LightTrellis, "lightTrellis"),
        (FillPattern::Gray125, "gray125"),
        (FillPattern::Gray0625, "gray0625"),
    ];

    pub fn from_ooxml(value: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, name)| *name == value)
            .map(|(pattern, _)| *pattern)
    }

    pub fn to_ooxml(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(pattern, _)| *pattern == self)
            .map(|(_, name)| *name)
            .unwrap_or("none")
    }
}

/// Fill record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fill {
    #[serde(default)]
    pub pattern: FillPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<Color>,
}

impl Fill {
    pub fn pattern(pattern: FillPattern) -> Self {
        Self {
            pattern,
            ..Default::default()
        }
    }

    /// Solid fill in `color`.
    pub fn solid(color: Color) -> Self {
        Self {
            pattern: FillPattern::Solid,
            fg_color: Some(color),
            bg_color: Some(Color::indexed(AUTOMATIC_COLOR_INDEX)),
        }
    }
}

/// Border line style.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderStyle {
    const NAMES: [(BorderStyle, &'static str); 14] = [
        (BorderStyle::None, "none"),
        (BorderStyle::Thin, "thin"),
        (BorderStyle::Medium, "medium"),
        (BorderStyle::Dashed, "dashed"),
        (BorderStyle::Dotted, "dotted"),
        (BorderStyle::Thick, "thick"),
        (BorderStyle::Double, "double"),
        (BorderStyle::Hair, "hair"),
        (BorderStyle::MediumDashed, "mediumDashed"),
        (BorderStyle::DashDot, "dashDot"),
        (BorderStyle::MediumDashDot, "mediumDashDot"),
        (BorderStyle::DashDotDot, "dashDotDot"),
        (BorderStyle::MediumDashDotDot, "mediumDashDotDot"),
        (BorderStyle::SlantDashDot, "slantDashDot"),
    ];

    pub fn from_ooxml(value: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, name)| *name == value)
            .map(|(style, _)| *style)
    }

    pub fn to_ooxml(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(style, _)| *style == self)
            .map(|(_, name)| *name)
            .unwrap_or("none")
    }
}

/// One side of a border.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderEdge {
    #[serde(default)]
    pub style: BorderStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl BorderEdge {
    pub fn is_empty(&self) -> bool {
        self.style == BorderStyle::None && self.color.is_none()
    }
}

/// Border record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Border {
    #[serde(default)]
    pub left: BorderEdge,
    #[serde(default)]
    pub right: BorderEdge,
    #[serde(default)]
    pub top: BorderEdge,
    #[serde(default)]
    pub bottom: BorderEdge,
}

impl Border {
    /// The same edge on all four sides.
    pub fn all(style: BorderStyle, color: Option<Color>) -> Self {
        let edge = BorderEdge { style, color };
        Self {
            left: edge.clone(),
            right: edge.clone(),
            top: edge.clone(),
            bottom: edge,
        }
    }
}

/// Horizontal alignment options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        Some(match value {
            "general" => Self::General,
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            "fill" => Self::Fill,
            "justify" => Self::Justify,
            "centerContinuous" => Self::CenterContinuous,
            "distributed" => Self::Distributed,
            _ => return None,
        })
    }

    pub fn to_ooxml(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Fill => "fill",
            Self::Justify => "justify",
            Self::CenterContinuous => "centerContinuous",
            Self::Distributed => "distributed",
        }
    }
}

/// Vertical alignment options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
    Justify,
    Distributed,
}

impl VerticalAlignment {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        Some(match value {
            "top" => Self::Top,
            "center" => Self::Center,
            "bottom" => Self::Bottom,
            "justify" => Self::Justify,
            "distributed" => Self::Distributed,
            _ => return None,
        })
    }

    pub fn to_ooxml(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
            Self::Justify => "justify",
            Self::Distributed => "distributed",
        }
    }
}

/// Alignment flags of a cell format.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Alignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<HorizontalAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalAlignment>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub wrap_text: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shrink_to_fit: bool,
    #[serde(default, skip_serializing_if = "is_zero_u8")]
    pub indent: u8,
    /// Excel text rotation in degrees.
    ///
    /// - `0` = horizontal
    /// - `-90..=90` = rotated text
    /// - Excel also uses `255` for vertical stacked text (supported as-is).
    #[serde(default, skip_serializing_if = "is_zero_i16")]
    pub text_rotation: i16,
}

impl Alignment {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Cell protection flags; cells are locked and visible unless overridden.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellProtection {
    pub locked: bool,
    pub hidden: bool,
}

impl Default for CellProtection {
    fn default() -> Self {
        Self {
            locked: true,
            hidden: false,
        }
    }
}

/// A cell format (`cellXfs/xf`): component ids plus inline alignment and
/// protection. Cells reference these by index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRecord {
    #[serde(default)]
    pub num_fmt_id: u16,
    #[serde(default)]
    pub font_id: u32,
    #[serde(default)]
    pub fill_id: u32,
    #[serde(default)]
    pub border_id: u32,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub protection: CellProtection,
}

impl StyleRecord {
    pub fn with_num_fmt(mut self, num_fmt_id: u16) -> Self {
        self.num_fmt_id = num_fmt_id;
        self
    }

    pub fn with_font(mut self, font_id: u32) -> Self {
        self.font_id = font_id;
        self
    }

    pub fn with_fill(mut self, fill_id: u32) -> Self {
        self.fill_id = fill_id;
        self
    }

    pub fn with_border(mut self, border_id: u32) -> Self {
        self.border_id = border_id;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

fn non_empty_or<T: Clone>(items: Vec<T>, fallback: &[T]) -> Vec<T> {
    if items.is_empty() {
        fallback.to_vec()
    } else {
        items
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero_i16(v: &i16) -> bool {
    *v == 0
}

fn is_zero_u8(v: &u8) -> bool {
    *v == 0
}

/// Errors raised by [`StyleRegistry`] lookups and interning.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("unknown style index {0}")]
    UnknownStyle(u32),
    #[error("unknown font id {0}")]
    UnknownFont(u32),
    #[error("unknown fill id {0}")]
    UnknownFill(u32),
    #[error("unknown border id {0}")]
    UnknownBorder(u32),
    #[error("unknown number format id {0}")]
    UnknownNumberFormat(u16),
    #[error("number format code must not be empty")]
    EmptyFormatCode,
    #[error("every custom number format id is in use")]
    NumberFormatsExhausted,
}

/// Append-only, deduplicated arena of one kind of style component.
#[derive(Clone, Debug)]
struct Interned<T> {
    items: Vec<T>,
    index: HashMap<T, u32>,
}

impl<T: Clone + Eq + std::hash::Hash> Interned<T> {
    fn from_items(items: Vec<T>) -> Self {
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            // First occurrence wins so loaded duplicates keep their own ids.
            index.entry(item.clone()).or_insert(i as u32);
        }
        Self { items, index }
    }

    fn intern(&mut self, item: T) -> u32 {
        if let Some(id) = self.index.get(&item) {
            return *id;
        }
        let id = self.items.len() as u32;
        self.items.push(item.clone());
        self.index.insert(item, id);
        id
    }

    fn get(&self, id: u32) -> Option<&T> {
        self.items.get(id as usize)
    }
}

/// Workbook-wide, deduplicated formatting tables.
///
/// Every component table is append-only: an index handed out stays valid (and
/// keeps its meaning) for the lifetime of the registry. Index 0 of each table
/// is the default record.
#[derive(Clone, Debug)]
pub struct StyleRegistry {
    fonts: Interned<Font>,
    fills: Interned<Fill>,
    borders: Interned<Border>,
    cell_formats: Interned<StyleRecord>,
    number_formats: NumberFormatTable,
    /// Indexed color palette (`<colors><indexedColors>`).
    pub palette: IndexedPalette,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self {
            fonts: Interned::from_items(vec![Font::default()]),
            fills: Interned::from_items(vec![
                Fill::pattern(FillPattern::None),
                Fill::pattern(FillPattern::Gray125),
            ]),
            borders: Interned::from_items(vec![Border::default()]),
            cell_formats: Interned::from_items(vec![StyleRecord::default()]),
            number_formats: NumberFormatTable::new(),
            palette: IndexedPalette::default(),
        }
    }

    /// Rebuild a registry from tables as they appear in a styles part,
    /// preserving every index. Empty tables get their default record.
    pub fn from_parts(
        fonts: Vec<Font>,
        fills: Vec<Fill>,
        borders: Vec<Border>,
        cell_formats: Vec<StyleRecord>,
        number_formats: NumberFormatTable,
        palette: IndexedPalette,
    ) -> Result<Self, StyleError> {
        let defaults = Self::new();
        let registry = Self {
            fonts: Interned::from_items(non_empty_or(fonts, &defaults.fonts.items)),
            fills: Interned::from_items(non_empty_or(fills, &defaults.fills.items)),
            borders: Interned::from_items(non_empty_or(borders, &defaults.borders.items)),
            cell_formats: Interned::from_items(non_empty_or(
                cell_formats,
                &defaults.cell_formats.items,
            )),
            number_formats,
            palette,
        };
        for record in &registry.cell_formats.items {
            registry.validate(record)?;
        }
        Ok(registry)
    }

    /// Insert (or reuse) a cell format, returning its index.
    ///
    /// Component ids must already exist in their tables.
    pub fn intern_style(&mut self, record: StyleRecord) -> Result<u32, StyleError> {
        self.validate(&record)?;
        Ok(self.cell_formats.intern(record))
    }

    /// The cell format at `index`. Unknown indices are an error, never the default.
    pub fn resolve(&self, index: u32) -> Result<&StyleRecord, StyleError> {
        self.cell_formats
            .get(index)
            .ok_or(StyleError::UnknownStyle(index))
    }

    pub fn intern_font(&mut self, font: Font) -> u32 {
        self.fonts.intern(font)
    }

    pub fn intern_fill(&mut self, fill: Fill) -> u32 {
        self.fills.intern(fill)
    }

    pub fn intern_border(&mut self, border: Border) -> u32 {
        self.borders.intern(border)
    }

    pub fn font(&self, id: u32) -> Result<&Font, StyleError> {
        self.fonts.get(id).ok_or(StyleError::UnknownFont(id))
    }

    pub fn fill(&self, id: u32) -> Result<&Fill, StyleError> {
        self.fills.get(id).ok_or(StyleError::UnknownFill(id))
    }

    pub fn border(&self, id: u32) -> Result<&Border, StyleError> {
        self.borders.get(id).ok_or(StyleError::UnknownBorder(id))
    }

    /// Id for a number format code; built-in codes map to their reserved id,
    /// anything else gets the lowest free id at or above 164.
    pub fn intern_number_format(&mut self, code: &str) -> Result<u16, StyleError> {
        if code.is_empty() {
            return Err(StyleError::EmptyFormatCode);
        }
        self.number_formats
            .intern(code)
            .ok_or(StyleError::NumberFormatsExhausted)
    }

    /// Bind `id` to `code`, replacing a built-in mapping if necessary.
    ///
    /// Existing cell formats referencing `id` pick up the new code.
    pub fn put_format(&mut self, id: u16, code: &str) -> Result<(), StyleError> {
        if code.is_empty() {
            return Err(StyleError::EmptyFormatCode);
        }
        self.number_formats.put(id, code);
        Ok(())
    }

    pub fn number_format(&self, id: u16) -> Result<&str, StyleError> {
        self.number_formats
            .get(id)
            .ok_or(StyleError::UnknownNumberFormat(id))
    }

    pub fn number_formats(&self) -> &NumberFormatTable {
        &self.number_formats
    }

    /// Number format code of the cell format at `index`.
    pub fn format_code_of(&self, index: u32) -> Result<&str, StyleError> {
        let record = self.resolve(index)?;
        self.number_format(record.num_fmt_id)
    }

    pub fn fonts(&self) -> &[Font] {
        &self.fonts.items
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills.items
    }

    pub fn borders(&self) -> &[Border] {
        &self.borders.items
    }

    pub fn cell_formats(&self) -> &[StyleRecord] {
        &self.cell_formats.items
    }

    pub fn len(&self) -> usize {
        self.cell_formats.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_formats.items.is_empty()
    }

    fn validate(&self, record: &StyleRecord) -> Result<(), StyleError> {
        self.font(record.font_id)?;
        self.fill(record.fill_id)?;
        self.border(record.border_id)?;
        self.number_format(record.num_fmt_id)?;
        Ok(())
    }
}

impl Serialize for StyleRegistry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("StyleRegistry", 6)?;
        state.serialize_field("fonts", &self.fonts.items)?;
        state.serialize_field("fills", &self.fills.items)?;
        state.serialize_field("borders", &self.borders.items)?;
        state.serialize_field("cell_formats", &self.cell_formats.items)?;
        state.serialize_field("number_formats", &self.number_formats)?;
        state.serialize_field("palette", &self.palette)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for StyleRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default)]
            fonts: Vec<Font>,
            #[serde(default)]
            fills: Vec<Fill>,
            #[serde(default)]
            borders: Vec<Border>,
            #[serde(default)]
            cell_formats: Vec<StyleRecord>,
            #[serde(default)]
            number_formats: NumberFormatTable,
            #[serde(default)]
            palette: IndexedPalette,
        }

        let helper = Helper::deserialize(deserializer)?;
        StyleRegistry::from_parts(
            helper.fonts,
            helper.fills,
            helper.borders,
            helper.cell_formats,
            helper.number_formats,
            helper.palette,
        )
        .map_err(D::Error::custom)
    }
}
