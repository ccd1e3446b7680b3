//! The workbook part (`xl/workbook.xml`): sheet list, tab state and defined names.

use roxmltree::Document;
use sheetml_model::{DefinedNameScope, SheetVisibility, Workbook};

use crate::xml::{
    escape_text, parse_xml_bool, push_attr, RELATIONSHIPS_NS, SPREADSHEETML_NS, XML_DECLARATION,
};
use crate::XlsxError;

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";

/// One `<sheet>` entry in tab order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub sheet_id: Option<u32>,
    pub visibility: SheetVisibility,
    pub rel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefinedNameEntry {
    pub name: String,
    /// Tab index of the owning sheet for sheet-scoped names.
    pub local_sheet_id: Option<usize>,
    pub hidden: bool,
    pub comment: Option<String>,
    pub refers_to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WorkbookXml {
    pub sheets: Vec<SheetEntry>,
    pub active_tab: usize,
    pub first_sheet: usize,
    pub defined_names: Vec<DefinedNameEntry>,
}

/// Render `workbook.xml`; `sheet_rel_ids[i]` is the relationship id of tab `i`.
pub(crate) fn write_workbook_xml(workbook: &Workbook, sheet_rel_ids: &[String]) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push_str(&format!(
        r#"<workbook xmlns="{SPREADSHEETML_NS}" xmlns:r="{RELATIONSHIPS_NS}">"#
    ));

    out.push_str("<bookViews><workbookView");
    if let Some(active) = workbook.active_sheet_index().filter(|i| *i > 0) {
        push_attr(&mut out, "activeTab", active);
    }
    if workbook.first_visible_tab() > 0 {
        push_attr(&mut out, "firstSheet", workbook.first_visible_tab());
    }
    out.push_str("/></bookViews>");

    out.push_str("<sheets>");
    for (sheet, rel_id) in workbook.sheets().iter().zip(sheet_rel_ids) {
        out.push_str("<sheet");
        push_attr(&mut out, "name", sheet.name());
        push_attr(&mut out, "sheetId", sheet.id());
        if let Some(state) = sheet.visibility().to_ooxml() {
            push_attr(&mut out, "state", state);
        }
        push_attr(&mut out, "r:id", rel_id);
        out.push_str("/>");
    }
    out.push_str("</sheets>");

    let mut names = String::new();
    for name in workbook.defined_names() {
        let local_sheet_id = match name.scope {
            DefinedNameScope::Workbook => None,
            DefinedNameScope::Sheet(id) => match workbook.sheet_index(id) {
                Some(index) => Some(index),
                None => {
                    log::warn!("dropping defined name {} scoped to a missing sheet", name.name);
                    continue;
                }
            },
        };
        names.push_str("<definedName");
        push_attr(&mut names, "name", &name.name);
        if let Some(index) = local_sheet_id {
            push_attr(&mut names, "localSheetId", index);
        }
        if name.hidden {
            push_attr(&mut names, "hidden", 1);
        }
        if let Some(comment) = &name.comment {
            push_attr(&mut names, "comment", comment);
        }
        names.push('>');
        names.push_str(&escape_text(&name.refers_to));
        names.push_str("</definedName>");
    }
    if !names.is_empty() {
        out.push_str("<definedNames>");
        out.push_str(&names);
        out.push_str("</definedNames>");
    }

    out.push_str("</workbook>");
    out
}

pub(crate) fn parse_workbook_xml(xml: &[u8]) -> Result<WorkbookXml, XlsxError> {
    let xml = std::str::from_utf8(xml)?;
    let doc = Document::parse(xml)?;
    let mut parsed = WorkbookXml::default();
    let mut seen_view = false;

    for node in doc.descendants().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "workbookView" => {
                // Only the first view carries the tab state Excel shows.
                if !seen_view {
                    seen_view = true;
                    parsed.active_tab = node
                        .attribute("activeTab")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                    parsed.first_sheet = node
                        .attribute("firstSheet")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                }
            }
            "sheet" => {
                let Some(name) = node.attribute("name") else {
                    log::warn!("skipping <sheet> without a name");
                    continue;
                };
                let rel_id = node
                    .attribute((RELATIONSHIPS_NS, "id"))
                    .or_else(|| {
                        node.attributes()
                            .find(|a| a.name() == "id" && a.namespace().is_some())
                            .map(|a| a.value())
                    })
                    .map(str::to_string);
                parsed.sheets.push(SheetEntry {
                    name: name.to_string(),
                    sheet_id: node.attribute("sheetId").and_then(|v| v.parse().ok()),
                    visibility: SheetVisibility::from_ooxml(node.attribute("state")),
                    rel_id,
                });
            }
            "definedName" => {
                let Some(name) = node.attribute("name") else {
                    continue;
                };
                parsed.defined_names.push(DefinedNameEntry {
                    name: name.to_string(),
                    local_sheet_id: node.attribute("localSheetId").and_then(|v| v.parse().ok()),
                    hidden: node.attribute("hidden").is_some_and(parse_xml_bool),
                    comment: node.attribute("comment").map(str::to_string),
                    refers_to: node.text().unwrap_or_default().trim().to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(parsed)
}
