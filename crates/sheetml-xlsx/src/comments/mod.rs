//! Legacy cell notes (`xl/commentsN.xml`).
//!
//! Only the comments part itself is handled; the VML drawing that positions
//! note boxes is not written, so the `visible` flag does not survive a save.

use quick_xml::events::Event;
use quick_xml::Reader;
use sheetml_model::{CellRef, Comment};

use crate::rich_text::{parse_rich_text, push_rich_text, read_text};
use crate::xml::{attr_value, push_attr, push_text_element, SPREADSHEETML_NS, XML_DECLARATION};
use crate::XlsxError;

pub(crate) fn comments_part_name(n: usize) -> String {
    format!("xl/comments{n}.xml")
}

pub(crate) fn write_comments_xml<'a>(comments: impl IntoIterator<Item = &'a Comment>) -> String {
    let comments: Vec<&Comment> = comments.into_iter().collect();
    let mut authors: Vec<&str> = Vec::new();
    for comment in &comments {
        if !authors.contains(&comment.author.as_str()) {
            authors.push(&comment.author);
        }
    }

    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push_str(&format!(r#"<comments xmlns="{SPREADSHEETML_NS}"><authors>"#));
    for author in &authors {
        push_text_element(&mut out, "author", author);
    }
    out.push_str("</authors><commentList>");
    for comment in &comments {
        let author_id = authors
            .iter()
            .position(|a| *a == comment.author)
            .unwrap_or(0);
        out.push_str("<comment");
        push_attr(&mut out, "ref", comment.cell_ref);
        push_attr(&mut out, "authorId", author_id);
        out.push_str("><text>");
        push_rich_text(&mut out, &comment.text);
        out.push_str("</text></comment>");
    }
    out.push_str("</commentList></comments>");
    out
}

pub(crate) fn parse_comments_xml(xml: &[u8]) -> Result<Vec<Comment>, XlsxError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut authors: Vec<String> = Vec::new();
    let mut comments = Vec::new();
    let mut current: Option<Comment> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"author" => {
                authors.push(read_text(&mut reader, b"author")?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"author" => {
                authors.push(String::new());
            }
            Event::Start(e) if e.local_name().as_ref() == b"comment" => {
                let cell_ref = attr_value(&e, b"ref")?.and_then(|r| CellRef::from_a1(&r).ok());
                let author = attr_value(&e, b"authorId")?
                    .and_then(|id| id.parse::<usize>().ok())
                    .and_then(|id| authors.get(id).cloned())
                    .unwrap_or_default();
                match cell_ref {
                    Some(cell_ref) => current = Some(Comment::new(cell_ref, author, "")),
                    None => log::warn!("skipping comment with a missing or malformed ref"),
                }
            }
            Event::Start(e) if e.local_name().as_ref() == b"text" => {
                let text = parse_rich_text(&mut reader, b"text")?;
                if let Some(comment) = current.as_mut() {
                    comment.text = text;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"comment" => {
                comments.extend(current.take());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(comments)
}
