use core::fmt;

use serde::{Deserialize, Serialize};

/// A packed `0xAARRGGBB` color value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgbColor(pub u32);

impl ArgbColor {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Uppercase 8-digit hex (`FF333300`), the form used by SpreadsheetML `rgb=`.
    pub fn to_hex(self) -> String {
        format!("{:08X}", self.0)
    }

    /// Parse 6 (RGB, opaque) or 8 (ARGB) hex digits, with or without `#`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        match hex.len() {
            6 => u32::from_str_radix(hex, 16).ok().map(|v| Self(0xFF00_0000 | v)),
            8 => u32::from_str_radix(hex, 16).ok().map(Self),
            _ => None,
        }
    }

    /// Build from 3 (RGB) or 4 (ARGB) bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [r, g, b] => Some(Self::from_rgb(r, g, b)),
            [a, r, g, b] => Some(Self(u32::from_be_bytes([a, r, g, b]))),
            _ => None,
        }
    }

    /// Lighten (`tint > 0`) or darken (`tint < 0`) each RGB channel.
    ///
    /// `tint` is clamped to `-1.0..=1.0`; alpha is preserved.
    pub fn with_tint(self, tint: f64) -> Self {
        let tint = tint.clamp(-1.0, 1.0);
        if tint == 0.0 {
            return self;
        }
        let apply = |channel: u8| -> u32 {
            let c = f64::from(channel);
            let out = if tint > 0.0 {
                c * (1.0 - tint) + 255.0 * tint
            } else {
                c * (1.0 + tint)
            };
            out.round().clamp(0.0, 255.0) as u32
        };
        Self(
            (self.alpha() as u32) << 24
                | apply(self.red()) << 16
                | apply(self.green()) << 8
                | apply(self.blue()),
        )
    }
}

impl fmt::Display for ArgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Indexed slot that means "automatic" (no palette entry).
pub const AUTOMATIC_COLOR_INDEX: u16 = 64;

/// SpreadsheetML default `indexedColors` palette (0..=63), encoded as ARGB.
pub const DEFAULT_INDEXED_PALETTE: [u32; 64] = [
    0xFF000000, 0xFFFFFFFF, 0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFF00, 0xFFFF00FF,
    0xFF00FFFF, 0xFF000000, 0xFFFFFFFF, 0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFF00,
    0xFFFF00FF, 0xFF00FFFF, 0xFF800000, 0xFF008000, 0xFF000080, 0xFF808000, 0xFF800080,
    0xFF008080, 0xFFC0C0C0, 0xFF808080, 0xFF9999FF, 0xFF993366, 0xFFFFFFCC, 0xFFCCFFFF,
    0xFF660066, 0xFFFF8080, 0xFF0066CC, 0xFFCCCCFF, 0xFF000080, 0xFFFF00FF, 0xFFFFFF00,
    0xFF00FFFF, 0xFF800080, 0xFF800000, 0xFF008080, 0xFF0000FF, 0xFF00CCFF, 0xFFCCFFFF,
    0xFFCCFFCC, 0xFFFFFF99, 0xFF99CCFF, 0xFFFF99CC, 0xFFCC99FF, 0xFFFFCC99, 0xFF3366FF,
    0xFF33CCCC, 0xFF99CC00, 0xFFFFCC00, 0xFFFF9900, 0xFFFF6600, 0xFF666699, 0xFF969696,
    0xFF003366, 0xFF339966, 0xFF003300, 0xFF333300, 0xFF993300, 0xFF993366, 0xFF333399,
    0xFF333333,
];

/// Default-palette lookup; `None` for 64 ("automatic") and above.
pub fn indexed_color_argb(index: u16) -> Option<u32> {
    DEFAULT_INDEXED_PALETTE.get(index as usize).copied()
}

/// The workbook's indexed color palette.
///
/// Starts as [`DEFAULT_INDEXED_PALETTE`]; files may override slots through
/// `<colors><indexedColors>` in the styles part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedPalette {
    colors: Vec<ArgbColor>,
}

impl Default for IndexedPalette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_INDEXED_PALETTE.iter().copied().map(ArgbColor).collect(),
        }
    }
}

impl IndexedPalette {
    /// Build a palette from explicit entries (as read from a styles part).
    pub fn from_colors(colors: Vec<ArgbColor>) -> Self {
        Self { colors }
    }

    /// Color stored in `index`, or `None` for automatic / unknown slots.
    pub fn get(&self, index: u16) -> Option<ArgbColor> {
        if index >= AUTOMATIC_COLOR_INDEX {
            return None;
        }
        self.colors.get(index as usize).copied()
    }

    /// Override a palette slot. Slots at or beyond 64 are not addressable.
    pub fn set(&mut self, index: u16, color: ArgbColor) -> bool {
        if index >= AUTOMATIC_COLOR_INDEX {
            return false;
        }
        let idx = index as usize;
        if idx >= self.colors.len() {
            self.colors.resize(idx + 1, ArgbColor(0xFF000000));
        }
        self.colors[idx] = color;
        true
    }

    pub fn colors(&self) -> &[ArgbColor] {
        &self.colors
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Theme color scheme slots, in SpreadsheetML `theme=` index order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeColorSlot {
    Lt1,
    Dk1,
    Lt2,
    Dk2,
    Accent1,
    Accent2,
    Accent3,
    Accent4,
    Accent5,
    Accent6,
    Hlink,
    FolHlink,
}

impl ThemeColorSlot {
    pub const ALL: [ThemeColorSlot; 12] = [
        ThemeColorSlot::Lt1,
        ThemeColorSlot::Dk1,
        ThemeColorSlot::Lt2,
        ThemeColorSlot::Dk2,
        ThemeColorSlot::Accent1,
        ThemeColorSlot::Accent2,
        ThemeColorSlot::Accent3,
        ThemeColorSlot::Accent4,
        ThemeColorSlot::Accent5,
        ThemeColorSlot::Accent6,
        ThemeColorSlot::Hlink,
        ThemeColorSlot::FolHlink,
    ];

    pub fn from_theme_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn theme_index(self) -> u32 {
        self as u32
    }

    /// Element name inside `<a:clrScheme>`.
    pub fn scheme_element(self) -> &'static str {
        match self {
            ThemeColorSlot::Lt1 => "lt1",
            ThemeColorSlot::Dk1 => "dk1",
            ThemeColorSlot::Lt2 => "lt2",
            ThemeColorSlot::Dk2 => "dk2",
            ThemeColorSlot::Accent1 => "accent1",
            ThemeColorSlot::Accent2 => "accent2",
            ThemeColorSlot::Accent3 => "accent3",
            ThemeColorSlot::Accent4 => "accent4",
            ThemeColorSlot::Accent5 => "accent5",
            ThemeColorSlot::Accent6 => "accent6",
            ThemeColorSlot::Hlink => "hlink",
            ThemeColorSlot::FolHlink => "folHlink",
        }
    }
}

/// Resolved theme color scheme (Office 2007-2010 defaults).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub lt1: ArgbColor,
    pub dk1: ArgbColor,
    pub lt2: ArgbColor,
    pub dk2: ArgbColor,
    pub accent1: ArgbColor,
    pub accent2: ArgbColor,
    pub accent3: ArgbColor,
    pub accent4: ArgbColor,
    pub accent5: ArgbColor,
    pub accent6: ArgbColor,
    pub hlink: ArgbColor,
    pub fol_hlink: ArgbColor,
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self {
            lt1: ArgbColor(0xFFFFFFFF),
            dk1: ArgbColor(0xFF000000),
            lt2: ArgbColor(0xFFEEECE1),
            dk2: ArgbColor(0xFF1F497D),
            accent1: ArgbColor(0xFF4F81BD),
            accent2: ArgbColor(0xFFC0504D),
            accent3: ArgbColor(0xFF9BBB59),
            accent4: ArgbColor(0xFF8064A2),
            accent5: ArgbColor(0xFF4BACC6),
            accent6: ArgbColor(0xFFF79646),
            hlink: ArgbColor(0xFF0000FF),
            fol_hlink: ArgbColor(0xFF800080),
        }
    }
}

impl ThemePalette {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn get(&self, slot: ThemeColorSlot) -> ArgbColor {
        match slot {
            ThemeColorSlot::Lt1 => self.lt1,
            ThemeColorSlot::Dk1 => self.dk1,
            ThemeColorSlot::Lt2 => self.lt2,
            ThemeColorSlot::Dk2 => self.dk2,
            ThemeColorSlot::Accent1 => self.accent1,
            ThemeColorSlot::Accent2 => self.accent2,
            ThemeColorSlot::Accent3 => self.accent3,
            ThemeColorSlot::Accent4 => self.accent4,
            ThemeColorSlot::Accent5 => self.accent5,
            ThemeColorSlot::Accent6 => self.accent6,
            ThemeColorSlot::Hlink => self.hlink,
            ThemeColorSlot::FolHlink => self.fol_hlink,
        }
    }

    pub fn set(&mut self, slot: ThemeColorSlot, color: ArgbColor) {
        let target = match slot {
            ThemeColorSlot::Lt1 => &mut self.lt1,
            ThemeColorSlot::Dk1 => &mut self.dk1,
            ThemeColorSlot::Lt2 => &mut self.lt2,
            ThemeColorSlot::Dk2 => &mut self.dk2,
            ThemeColorSlot::Accent1 => &mut self.accent1,
            ThemeColorSlot::Accent2 => &mut self.accent2,
            ThemeColorSlot::Accent3 => &mut self.accent3,
            ThemeColorSlot::Accent4 => &mut self.accent4,
            ThemeColorSlot::Accent5 => &mut self.accent5,
            ThemeColorSlot::Accent6 => &mut self.accent6,
            ThemeColorSlot::Hlink => &mut self.hlink,
            ThemeColorSlot::FolHlink => &mut self.fol_hlink,
        };
        *target = color;
    }

    pub fn by_index(&self, index: u32) -> Option<ArgbColor> {
        ThemeColorSlot::from_theme_index(index).map(|slot| self.get(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_math_lightens_and_darkens() {
        let base = ArgbColor(0xFF646464);
        assert_eq!(base.with_tint(0.0), base);
        // 100 * (1-0.5) + 255 * 0.5 = 177.5 -> 178
        assert_eq!(base.with_tint(0.5), ArgbColor(0xFFB2B2B2));
        // 100 * (1-0.5) = 50
        assert_eq!(base.with_tint(-0.5), ArgbColor(0xFF323232));
        assert_eq!(base.with_tint(1.0), ArgbColor(0xFFFFFFFF));
        assert_eq!(base.with_tint(-1.0), ArgbColor(0xFF000000));
        assert_eq!(base.with_tint(2.0), ArgbColor(0xFFFFFFFF));
    }

    #[test]
    fn hex_and_byte_forms() {
        assert_eq!(ArgbColor::from_rgb(0x33, 0x33, 0x00).to_hex(), "FF333300");
        assert_eq!(ArgbColor::from_hex("#123456"), Some(ArgbColor(0xFF123456)));
        assert_eq!(ArgbColor::from_hex("80123456"), Some(ArgbColor(0x80123456)));
        assert_eq!(ArgbColor::from_hex("12345"), None);
        assert_eq!(
            ArgbColor::from_bytes(&[0x10, 0x20, 0x30, 0x40]),
            Some(ArgbColor(0x10203040))
        );
    }

    #[test]
    fn palette_automatic_slot_has_no_color() {
        let palette = IndexedPalette::default();
        assert_eq!(palette.get(59), Some(ArgbColor(0xFF333300)));
        assert_eq!(palette.get(AUTOMATIC_COLOR_INDEX), None);
        assert_eq!(indexed_color_argb(64), None);
    }
}
