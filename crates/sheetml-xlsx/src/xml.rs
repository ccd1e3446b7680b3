//! Small helpers shared by the part writers and readers.

use std::fmt::Display;

use quick_xml::events::BytesStart;

use crate::XlsxError;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
pub(crate) const SPREADSHEETML_NS: &str =
    "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const DRAWINGML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;").replace('\'', "&apos;")
}

pub(crate) fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) || s.contains('\n')
}

/// Append ` name="value"` with the value escaped.
pub(crate) fn push_attr(out: &mut String, name: &str, value: impl Display) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(&value.to_string()));
    out.push('"');
}

/// Append `<name>text</name>`, preserving edge whitespace.
pub(crate) fn push_text_element(out: &mut String, name: &str, text: &str) {
    out.push('<');
    out.push_str(name);
    if needs_space_preserve(text) {
        out.push_str(r#" xml:space="preserve""#);
    }
    out.push('>');
    out.push_str(&escape_text(text));
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

pub(crate) fn parse_xml_bool(val: &str) -> bool {
    matches!(val, "1" | "true" | "TRUE" | "True")
}

/// Unescaped value of the attribute whose local name is `local`.
pub(crate) fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, XlsxError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Numeric text for a `<v>` element; `None` for NaN and infinities.
pub(crate) fn format_f64(value: f64) -> Option<String> {
    value.is_finite().then(|| value.to_string())
}
