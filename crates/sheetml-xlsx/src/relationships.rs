use roxmltree::Document;

use crate::xml::{push_attr, XML_DECLARATION};
use crate::XlsxError;

const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const REL_TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_TYPE_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub(crate) const REL_TYPE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub(crate) const REL_TYPE_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub(crate) const REL_TYPE_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
pub(crate) const REL_TYPE_TABLE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";
pub(crate) const REL_TYPE_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub(crate) const REL_TYPE_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub type_: String,
    pub target: String,
    pub target_mode: Option<String>,
}

impl Relationship {
    pub fn is_external(&self) -> bool {
        self.target_mode
            .as_deref()
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("External"))
    }
}

pub(crate) fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>, XlsxError> {
    let xml = std::str::from_utf8(xml)?;
    let doc = Document::parse(xml)?;

    let mut rels = Vec::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        if node.tag_name().name() != "Relationship" {
            continue;
        }

        let Some(id) = node.attribute("Id") else {
            log::warn!("skipping relationship without an Id");
            continue;
        };
        rels.push(Relationship {
            id: id.to_string(),
            type_: node.attribute("Type").unwrap_or_default().to_string(),
            target: node.attribute("Target").unwrap_or_default().to_string(),
            target_mode: node.attribute("TargetMode").map(str::to_string),
        });
    }

    Ok(rels)
}

/// Builder for a `.rels` part with sequential `rIdN` ids.
#[derive(Debug, Default)]
pub(crate) struct RelationshipsWriter {
    rels: Vec<Relationship>,
}

impl RelationshipsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Add an internal relationship and return its id.
    pub fn add(&mut self, type_: &str, target: impl Into<String>) -> String {
        self.push(type_, target.into(), None)
    }

    pub fn add_external(&mut self, type_: &str, target: impl Into<String>) -> String {
        self.push(type_, target.into(), Some("External".to_string()))
    }

    fn push(&mut self, type_: &str, target: String, target_mode: Option<String>) -> String {
        let id = format!("rId{}", self.rels.len() + 1);
        self.rels.push(Relationship {
            id: id.clone(),
            type_: type_.to_string(),
            target,
            target_mode,
        });
        id
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str(XML_DECLARATION);
        out.push_str(&format!(r#"<Relationships xmlns="{PACKAGE_RELATIONSHIPS_NS}">"#));
        for rel in &self.rels {
            out.push_str("<Relationship");
            push_attr(&mut out, "Id", &rel.id);
            push_attr(&mut out, "Type", &rel.type_);
            push_attr(&mut out, "Target", &rel.target);
            if let Some(mode) = &rel.target_mode {
                push_attr(&mut out, "TargetMode", mode);
            }
            out.push_str("/>");
        }
        out.push_str("</Relationships>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn written_relationships_parse_back() {
        let mut writer = RelationshipsWriter::new();
        assert_eq!(writer.add(REL_TYPE_TABLE, "../tables/table1.xml"), "rId1");
        assert_eq!(
            writer.add_external(REL_TYPE_HYPERLINK, "https://example.com/?a=1&b=2"),
            "rId2"
        );

        let rels = parse_relationships(writer.to_xml().as_bytes()).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].target, "../tables/table1.xml");
        assert!(!rels[0].is_external());
        assert_eq!(rels[1].target, "https://example.com/?a=1&b=2");
        assert!(rels[1].is_external());
    }
}
