use serde::{Deserialize, Serialize};

use crate::Color;

/// Rich (multi-style) text representation.
///
/// The `text` field contains the full string content. `runs` contains style
/// overrides applied to ranges in `text`.
///
/// ## Indexing
/// Run `start`/`end` offsets are **Unicode scalar value** (`char`) indices into
/// `text` (not UTF-8 byte offsets).
///
/// Equality (and hashing) covers the text and every run, so two values only
/// share a string-table slot when both content and formatting agree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RichText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<RichTextRun>,
}

impl RichText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
        }
    }

    pub fn plain_text(&self) -> &str {
        &self.text
    }

    pub fn is_plain(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = (String, RichTextRunStyle)>) -> Self {
        let mut text = String::new();
        let mut runs = Vec::new();
        let mut cursor = 0usize;

        for (segment_text, style) in segments {
            let start = cursor;
            cursor += segment_text.chars().count();
            let end = cursor;
            text.push_str(&segment_text);
            runs.push(RichTextRun { start, end, style });
        }

        Self { text, runs }
    }

    /// Apply `style` to the `[start, end)` char span, splitting existing runs.
    pub fn apply_style(&mut self, start: usize, end: usize, style: RichTextRunStyle) {
        let len = self.char_len();
        let end = end.min(len);
        if start >= end {
            return;
        }

        let mut segments: Vec<RichTextRun> = Vec::new();
        if self.runs.is_empty() {
            segments.push(RichTextRun {
                start: 0,
                end: len,
                style: RichTextRunStyle::default(),
            });
        } else {
            segments.extend(self.runs.iter().cloned());
        }

        let mut out = Vec::with_capacity(segments.len() + 2);
        for run in segments {
            if run.end <= start || run.start >= end {
                out.push(run);
                continue;
            }
            if run.start < start {
                out.push(RichTextRun {
                    start: run.start,
                    end: start,
                    style: run.style.clone(),
                });
            }
            if run.end > end {
                out.push(RichTextRun {
                    start: end,
                    end: run.end,
                    style: run.style.clone(),
                });
            }
        }
        out.push(RichTextRun { start, end, style });
        out.sort_by_key(|run| run.start);
        self.runs = out;
    }

    pub fn slice_run_text(&self, run: &RichTextRun) -> &str {
        slice_by_char_range(&self.text, run.start, run.end)
    }

    /// Style in effect at `char_index`, if a run covers it.
    pub fn style_at(&self, char_index: usize) -> Option<&RichTextRunStyle> {
        self.runs
            .iter()
            .find(|run| run.start <= char_index && char_index < run.end)
            .map(|run| &run.style)
    }
}

impl From<&str> for RichText {
    fn from(value: &str) -> Self {
        RichText::new(value)
    }
}

impl From<String> for RichText {
    fn from(value: String) -> Self {
        RichText::new(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RichTextRun {
    pub start: usize,
    pub end: usize,
    pub style: RichTextRunStyle,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RichTextRunStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub strike: Option<bool>,
    pub underline: Option<Underline>,
    pub color: Option<Color>,
    pub font: Option<String>,
    /// Font size in 1/100 points (e.g. 1100 = 11pt), matching [`crate::Font`].
    pub size_100pt: Option<u16>,
}

impl RichTextRunStyle {
    pub fn is_empty(&self) -> bool {
        self.bold.is_none()
            && self.italic.is_none()
            && self.strike.is_none()
            && self.underline.is_none()
            && self.color.is_none()
            && self.font.is_none()
            && self.size_100pt.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Underline {
    Single,
    Double,
    SingleAccounting,
    DoubleAccounting,
    None,
}

impl Underline {
    pub fn from_ooxml(val: Option<&str>) -> Option<Self> {
        match val {
            None => Some(Underline::Single),
            Some("single") => Some(Underline::Single),
            Some("double") => Some(Underline::Double),
            Some("singleAccounting") => Some(Underline::SingleAccounting),
            Some("doubleAccounting") => Some(Underline::DoubleAccounting),
            Some("none") => Some(Underline::None),
            _ => None,
        }
    }

    pub fn to_ooxml(self) -> Option<&'static str> {
        match self {
            Underline::Single => None,
            Underline::Double => Some("double"),
            Underline::SingleAccounting => Some("singleAccounting"),
            Underline::DoubleAccounting => Some("doubleAccounting"),
            Underline::None => Some("none"),
        }
    }
}

fn slice_by_char_range(text: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }

    let mut start_byte = None;
    let mut end_byte = None;

    for (i, (byte_idx, _ch)) in text.char_indices().enumerate() {
        if i == start {
            start_byte = Some(byte_idx);
        }
        if i == end {
            end_byte = Some(byte_idx);
            break;
        }
    }

    let start_byte = start_byte.unwrap_or(text.len());
    let end_byte = end_byte.unwrap_or(text.len());

    &text[start_byte..end_byte]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_segments_builds_runs_with_char_indices() {
        let rt = RichText::from_segments(vec![
            ("Hi ".to_string(), RichTextRunStyle::default()),
            (
                "世界".to_string(),
                RichTextRunStyle {
                    bold: Some(true),
                    ..Default::default()
                },
            ),
        ]);

        assert_eq!(rt.text, "Hi 世界");
        assert_eq!(rt.runs.len(), 2);
        assert_eq!(rt.runs[0].start, 0);
        assert_eq!(rt.runs[0].end, 3);
        assert_eq!(rt.runs[1].start, 3);
        assert_eq!(rt.runs[1].end, 5);
        assert_eq!(rt.slice_run_text(&rt.runs[1]), "世界");
    }

    #[test]
    fn apply_style_splits_the_covering_run() {
        let mut rt = RichText::new("Apache POI");
        let bold = RichTextRunStyle {
            bold: Some(true),
            ..Default::default()
        };
        rt.apply_style(0, 6, bold.clone());

        assert_eq!(rt.runs.len(), 2);
        assert_eq!(rt.slice_run_text(&rt.runs[0]), "Apache");
        assert_eq!(rt.slice_run_text(&rt.runs[1]), " POI");
        assert_eq!(rt.style_at(2), Some(&bold));
        assert_eq!(rt.style_at(8), Some(&RichTextRunStyle::default()));
    }

    #[test]
    fn formatting_participates_in_equality() {
        let plain = RichText::new("x");
        let mut styled = RichText::new("x");
        styled.apply_style(
            0,
            1,
            RichTextRunStyle {
                italic: Some(true),
                ..Default::default()
            },
        );
        assert_ne!(plain, styled);
        assert_eq!(plain, RichText::from("x"));
    }
}
