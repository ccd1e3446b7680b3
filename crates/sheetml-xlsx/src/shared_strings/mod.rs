//! Shared strings table (`xl/sharedStrings.xml`).

use quick_xml::events::Event;
use quick_xml::Reader;
use sheetml_model::{RichText, SharedStringTable};

use crate::rich_text::{parse_rich_text, push_rich_text};
use crate::xml::{attr_value, SPREADSHEETML_NS, XML_DECLARATION};
use crate::XlsxError;

pub(crate) const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

pub(crate) fn write_shared_strings_xml(table: &SharedStringTable) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push_str(&format!(
        r#"<sst xmlns="{SPREADSHEETML_NS}" count="{}" uniqueCount="{}">"#,
        table.count(),
        table.unique_count()
    ));
    for entry in table.entries() {
        out.push_str("<si>");
        push_rich_text(&mut out, entry);
        out.push_str("</si>");
    }
    out.push_str("</sst>");
    out
}

/// Parse the table, keeping entry order (cells refer to entries by index).
pub(crate) fn parse_shared_strings_xml(xml: &[u8]) -> Result<SharedStringTable, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut entries: Vec<RichText> = Vec::new();
    let mut count: Option<u64> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sst" => {
                count = attr_value(&e, b"count")?.and_then(|v| v.parse().ok());
            }
            Event::Start(e) if e.local_name().as_ref() == b"si" => {
                entries.push(parse_rich_text(&mut reader, b"si")?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                entries.push(RichText::default());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!("parsed {} shared strings", entries.len());
    let count = count.unwrap_or(entries.len() as u64);
    Ok(SharedStringTable::from_entries(entries, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn counts_and_order_survive_a_round_trip() {
        let mut table = SharedStringTable::new();
        table.intern("beta");
        table.intern("alpha");
        table.intern("beta");
        table.intern(" padded ");

        let xml = write_shared_strings_xml(&table);
        assert!(xml.contains(r#"count="4" uniqueCount="3""#));

        let back = parse_shared_strings_xml(xml.as_bytes()).unwrap();
        assert_eq!(back.entries(), table.entries());
        assert_eq!(back.count(), 4);
        assert_eq!(back.get(2).map(RichText::plain_text), Some(" padded "));
    }

    #[test]
    fn empty_items_keep_their_slot() {
        let xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si/><si><t>x</t></si></sst>"#;
        let table = parse_shared_strings_xml(xml.as_bytes()).unwrap();
        assert_eq!(table.unique_count(), 2);
        assert_eq!(table.get(1).map(RichText::plain_text), Some("x"));
        assert_eq!(table.count(), 2);
    }
}
