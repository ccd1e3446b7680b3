//! Page header/footer strings.
//!
//! SpreadsheetML encodes header/footer content as one string with `&`-escapes:
//! `&L`, `&C`, `&R` open the left/center/right sections, single letters insert
//! fields (`&P` page, `&N` pages, `&D` date, ...) or toggle formatting,
//! `&"Font,Style"` and `&12` change the font, and `&&` is a literal ampersand.

use serde::{Deserialize, Serialize};

/// Letters that form a complete field or formatting code after `&`.
const FIELD_CODES: &[char] = &[
    'P', 'N', 'D', 'T', 'F', 'Z', 'A', 'G', // page, pages, date, time, file, path, sheet, picture
    'B', 'I', 'S', 'U', 'E', 'X', 'Y', // bold, italic, strike, underline, double, super, sub
];

/// Remove every recognised field code from `text`.
///
/// `&&` survives as-is and unrecognised `&x` sequences are kept verbatim.
pub fn strip_fields(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch != '&' {
            out.push(ch);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some('&') => {
                out.push_str("&&");
                i += 2;
            }
            Some(code) if FIELD_CODES.contains(code) => i += 2,
            Some('"') => match chars[i + 2..].iter().position(|c| *c == '"') {
                Some(close) => i += close + 3,
                None => {
                    out.push('&');
                    i += 1;
                }
            },
            Some(d) if d.is_ascii_digit() => {
                i += 1;
                while chars.get(i).is_some_and(char::is_ascii_digit) {
                    i += 1;
                }
            }
            _ => {
                out.push('&');
                i += 1;
            }
        }
    }
    out
}

/// One header or footer split into its three sections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFooter {
    pub left: String,
    pub center: String,
    pub right: String,
}

impl HeaderFooter {
    /// Split a raw header/footer string. Text before any section marker
    /// belongs to the center section.
    pub fn parse(raw: &str) -> Self {
        let mut parsed = Self::default();
        let mut current = &mut parsed.center;
        let mut chars = raw.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '&' {
                current.push(ch);
                continue;
            }
            match chars.peek().copied() {
                Some('L') => {
                    chars.next();
                    current = &mut parsed.left;
                }
                Some('C') => {
                    chars.next();
                    current = &mut parsed.center;
                }
                Some('R') => {
                    chars.next();
                    current = &mut parsed.right;
                }
                Some('&') => {
                    chars.next();
                    current.push_str("&&");
                }
                _ => current.push('&'),
            }
        }
        parsed
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.center.is_empty() && self.right.is_empty()
    }

    /// Encode back into a raw string, omitting empty sections.
    pub fn to_raw(&self) -> String {
        let mut out = String::new();
        for (marker, text) in [("&L", &self.left), ("&C", &self.center), ("&R", &self.right)] {
            if !text.is_empty() {
                out.push_str(marker);
                out.push_str(text);
            }
        }
        out
    }
}

/// Header/footer configuration of a sheet (`<headerFooter>`), kept raw.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFooterSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odd_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odd_footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub even_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub even_footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_footer: Option<String>,
    #[serde(default)]
    pub different_odd_even: bool,
    #[serde(default)]
    pub different_first: bool,
}

impl HeaderFooterSettings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The default (odd-page) header, split into sections.
    pub fn header(&self) -> HeaderFooter {
        self.odd_header
            .as_deref()
            .map(HeaderFooter::parse)
            .unwrap_or_default()
    }

    pub fn footer(&self) -> HeaderFooter {
        self.odd_footer
            .as_deref()
            .map(HeaderFooter::parse)
            .unwrap_or_default()
    }

    pub fn set_header(&mut self, header: &HeaderFooter) {
        self.odd_header = (!header.is_empty()).then(|| header.to_raw());
    }

    pub fn set_footer(&mut self, footer: &HeaderFooter) {
        self.odd_footer = (!footer.is_empty()).then(|| footer.to_raw());
    }
}
