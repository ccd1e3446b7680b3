//! Rich text as it appears in `<si>`, `<is>` and comment `<text>` elements.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use sheetml_model::{RichText, RichTextRunStyle, Underline};

use crate::color::{color_from_attrs, push_color};
use crate::xml::{attr_value, escape_attr, parse_xml_bool, push_text_element};
use crate::XlsxError;

/// Append the children of a rich-text container (`<t>` or a list of `<r>`).
pub(crate) fn push_rich_text(out: &mut String, text: &RichText) {
    if text.is_plain() {
        push_text_element(out, "t", &text.text);
        return;
    }

    let mut runs: Vec<_> = text.runs.iter().collect();
    runs.sort_by_key(|run| run.start);
    let total = text.char_len();
    let mut cursor = 0;
    for run in runs {
        let start = run.start.max(cursor);
        let end = run.end.min(total);
        if start >= end {
            continue;
        }
        if cursor < start {
            push_run(out, None, slice_chars(&text.text, cursor, start));
        }
        push_run(out, Some(&run.style), slice_chars(&text.text, start, end));
        cursor = end;
    }
    if cursor < total {
        push_run(out, None, slice_chars(&text.text, cursor, total));
    }
}

fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| text.char_indices().nth(n).map_or(text.len(), |(i, _)| i);
    &text[byte_at(start)..byte_at(end)]
}

fn push_run(out: &mut String, style: Option<&RichTextRunStyle>, text: &str) {
    out.push_str("<r>");
    if let Some(style) = style.filter(|s| !s.is_empty()) {
        out.push_str("<rPr>");
        if let Some(font) = &style.font {
            out.push_str(&format!(r#"<rFont val="{}"/>"#, escape_attr(font)));
        }
        push_flag(out, "b", style.bold);
        push_flag(out, "i", style.italic);
        push_flag(out, "strike", style.strike);
        if let Some(color) = &style.color {
            push_color(out, "color", color);
        }
        if let Some(size) = style.size_100pt {
            out.push_str(&format!(r#"<sz val="{}"/>"#, f64::from(size) / 100.0));
        }
        if let Some(underline) = style.underline {
            match underline.to_ooxml() {
                Some(val) => out.push_str(&format!(r#"<u val="{val}"/>"#)),
                None => out.push_str("<u/>"),
            }
        }
        out.push_str("</rPr>");
    }
    push_text_element(out, "t", text);
    out.push_str("</r>");
}

fn push_flag(out: &mut String, tag: &str, value: Option<bool>) {
    match value {
        Some(true) => out.push_str(&format!("<{tag}/>")),
        Some(false) => out.push_str(&format!(r#"<{tag} val="0"/>"#)),
        None => {}
    }
}

/// Parse rich text up to the closing tag whose local name is `end`.
///
/// Phonetic runs (`<rPh>`) are skipped; they are not part of the displayed
/// string.
pub(crate) fn parse_rich_text<R: BufRead>(
    reader: &mut Reader<R>,
    end: &[u8],
) -> Result<RichText, XlsxError> {
    let mut buf = Vec::new();
    let mut skip = Vec::new();
    let mut segments: Vec<(String, RichTextRunStyle)> = Vec::new();
    let mut run_style: Option<RichTextRunStyle> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"rPh" => {
                let name = e.name().as_ref().to_vec();
                reader.read_to_end_into(QName(&name), &mut skip)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"r" => {
                run_style = Some(RichTextRunStyle::default());
            }
            Event::End(e) if e.local_name().as_ref() == b"r" => {
                run_style = None;
            }
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                let text = read_text(reader, b"t")?;
                segments.push((text, run_style.clone().unwrap_or_default()));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"t" => {
                segments.push((String::new(), run_style.clone().unwrap_or_default()));
            }
            Event::Start(e) | Event::Empty(e) if run_style.is_some() => {
                if let Some(style) = run_style.as_mut() {
                    apply_run_property(style, &e)?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => {
                return Err(XlsxError::Invalid(format!(
                    "unterminated <{}> element",
                    String::from_utf8_lossy(end)
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if segments.iter().all(|(_, style)| style.is_empty()) {
        let text: String = segments.into_iter().map(|(t, _)| t).collect();
        return Ok(RichText::new(text));
    }
    let mut rich = RichText::from_segments(segments);
    rich.runs.retain(|run| !run.style.is_empty() && run.start < run.end);
    Ok(rich)
}

fn apply_run_property(style: &mut RichTextRunStyle, e: &BytesStart<'_>) -> Result<(), XlsxError> {
    let val = attr_value(e, b"val")?;
    let flag = || val.as_deref().map_or(true, parse_xml_bool);
    match e.local_name().as_ref() {
        b"b" => style.bold = Some(flag()),
        b"i" => style.italic = Some(flag()),
        b"strike" => style.strike = Some(flag()),
        b"u" => style.underline = Underline::from_ooxml(val.as_deref()),
        b"rFont" => style.font = val.clone(),
        b"sz" => {
            style.size_100pt = val
                .as_deref()
                .and_then(|v| v.parse::<f64>().ok())
                .map(|points| (points * 100.0).round().clamp(0.0, f64::from(u16::MAX)) as u16);
        }
        b"color" => {
            let mut attrs: Vec<(Vec<u8>, String)> = Vec::new();
            for attr in e.attributes() {
                let attr = attr?;
                attrs.push((
                    attr.key.local_name().as_ref().to_vec(),
                    attr.unescape_value()?.into_owned(),
                ));
            }
            style.color = color_from_attrs(|name| {
                attrs
                    .iter()
                    .find(|(k, _)| k.as_slice() == name.as_bytes())
                    .map(|(_, v)| v.clone())
            });
        }
        _ => {}
    }
    Ok(())
}

/// Concatenated text content up to the closing tag whose local name is `end`.
pub(crate) fn read_text<R: BufRead>(reader: &mut Reader<R>, end: &[u8]) -> Result<String, XlsxError> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t.into_inner())),
            Event::End(e) if e.local_name().as_ref() == end => break,
            Event::Eof => {
                return Err(XlsxError::Invalid(format!(
                    "unterminated <{}> element",
                    String::from_utf8_lossy(end)
                )))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use sheetml_model::{Color, RichTextRun};

    fn parse(xml: &str) -> RichText {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            if let Event::Start(e) = reader.read_event_into(&mut buf).unwrap() {
                if e.local_name().as_ref() == b"si" {
                    break;
                }
            }
            buf.clear();
        }
        parse_rich_text(&mut reader, b"si").unwrap()
    }

    #[test]
    fn plain_text_stays_plain() {
        let text = parse(r#"<si><t xml:space="preserve"> a &amp; b</t></si>"#);
        assert_eq!(text, RichText::new(" a & b"));
    }

    #[test]
    fn runs_round_trip() {
        let text = RichText {
            text: "Hello world".to_string(),
            runs: vec![RichTextRun {
                start: 6,
                end: 11,
                style: RichTextRunStyle {
                    bold: Some(true),
                    color: Some(Color::theme(4)),
                    size_100pt: Some(1400),
                    ..Default::default()
                },
            }],
        };
        let mut xml = String::from("<si>");
        push_rich_text(&mut xml, &text);
        xml.push_str("</si>");
        assert_eq!(
            xml,
            r#"<si><r><t xml:space="preserve">Hello </t></r><r><rPr><b/><color theme="4"/><sz val="14"/></rPr><t>world</t></r></si>"#
        );
        assert_eq!(parse(&xml), text);
    }

    #[test]
    fn phonetic_runs_are_not_text() {
        let text = parse("<si><t>漢字</t><rPh sb=\"0\" eb=\"2\"><t>かんじ</t></rPh></si>");
        assert_eq!(text.plain_text(), "漢字");
    }
}
