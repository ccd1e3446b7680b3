//! `[Content_Types].xml`.

use std::collections::BTreeMap;

use crate::xml::{push_attr, XML_DECLARATION};

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub(crate) const CT_XML: &str = "application/xml";
pub(crate) const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub(crate) const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub(crate) const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub(crate) const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
pub(crate) const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
pub(crate) const CT_TABLE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml";
pub(crate) const CT_COMMENTS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml";

/// Collects `<Default>` (by extension) and `<Override>` (by part) entries.
#[derive(Debug)]
pub(crate) struct ContentTypesWriter {
    defaults: BTreeMap<String, String>,
    overrides: Vec<(String, String)>,
}

impl ContentTypesWriter {
    pub fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), CT_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), CT_XML.to_string());
        Self {
            defaults,
            overrides: Vec::new(),
        }
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .entry(extension.to_ascii_lowercase())
            .or_insert_with(|| content_type.to_string());
    }

    /// `part` is a package part name without the leading `/`.
    pub fn add_override(&mut self, part: &str, content_type: &str) {
        self.overrides
            .push((format!("/{part}"), content_type.to_string()));
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str(XML_DECLARATION);
        out.push_str(&format!(r#"<Types xmlns="{CONTENT_TYPES_NS}">"#));
        for (extension, content_type) in &self.defaults {
            out.push_str("<Default");
            push_attr(&mut out, "Extension", extension);
            push_attr(&mut out, "ContentType", content_type);
            out.push_str("/>");
        }
        for (part, content_type) in &self.overrides {
            out.push_str("<Override");
            push_attr(&mut out, "PartName", part);
            push_attr(&mut out, "ContentType", content_type);
            out.push_str("/>");
        }
        out.push_str("</Types>");
        out
    }
}
