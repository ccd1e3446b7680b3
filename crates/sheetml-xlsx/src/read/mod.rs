//! Decode a package into a [`Workbook`].
//!
//! Parts are located through relationships. Dangling references inside parts
//! (unknown styles, out-of-range shared strings, missing targets) are logged
//! and dropped; structural failures (bad XML, missing workbook) are errors.

mod worksheet;

use sheetml_model::{
    DefinedNameScope, PictureFormat, SheetVisibility, Workbook, WorkbookError, WorksheetId,
};

use crate::comments::parse_comments_xml;
use crate::path::{rels_part_for, resolve_target, trailing_number};
use crate::relationships::{
    parse_relationships, Relationship, REL_TYPE_COMMENTS, REL_TYPE_OFFICE_DOCUMENT,
    REL_TYPE_SHARED_STRINGS, REL_TYPE_STYLES, REL_TYPE_THEME,
};
use crate::shared_strings::{parse_shared_strings_xml, SHARED_STRINGS_PART};
use crate::styles::{parse_styles_xml, STYLES_PART};
use crate::tables::parse_table;
use crate::theme::{parse_theme_palette, THEME_PART};
use crate::workbook::{parse_workbook_xml, DefinedNameEntry, WORKBOOK_PART};
use crate::{XlsxError, XlsxPackage, XlsxReadOptions};

use worksheet::{read_worksheet_xml, SheetContext};

/// Parse `.xlsx` bytes with default limits.
pub fn read_workbook_from_bytes(bytes: &[u8]) -> Result<Workbook, XlsxError> {
    read_workbook_from_bytes_with_options(bytes, &XlsxReadOptions::default())
}

pub fn read_workbook_from_bytes_with_options(
    bytes: &[u8],
    options: &XlsxReadOptions,
) -> Result<Workbook, XlsxError> {
    let package = XlsxPackage::from_bytes_with_options(bytes, options)?;
    read_workbook_from_package(&package)
}

/// Rebuild the workbook model from an already inflated package.
pub fn read_workbook_from_package(package: &XlsxPackage) -> Result<Workbook, XlsxError> {
    let workbook_part = find_workbook_part(package)?;
    let workbook_xml = parse_workbook_xml(
        package
            .part(&workbook_part)
            .ok_or_else(|| XlsxError::MissingPart(workbook_part.clone()))?,
    )?;
    let rels = read_rels(package, &workbook_part)?;

    let mut workbook = Workbook::with_inline_strings();

    if let Some(part) = related_part(package, &workbook_part, &rels, REL_TYPE_STYLES, STYLES_PART)
    {
        workbook.styles = parse_styles_xml(part)?;
    }
    if let Some(part) = related_part(package, &workbook_part, &rels, REL_TYPE_THEME, THEME_PART) {
        workbook.theme = parse_theme_palette(part)?;
    }
    if let Some(part) = related_part(
        package,
        &workbook_part,
        &rels,
        REL_TYPE_SHARED_STRINGS,
        SHARED_STRINGS_PART,
    ) {
        workbook.set_shared_strings(Some(parse_shared_strings_xml(part)?));
    }

    let style_count = workbook.styles.cell_formats().len();
    let shared_string_count = workbook.shared_strings().map(|t| t.unique_count());
    let mut visibility: Vec<(WorksheetId, SheetVisibility)> = Vec::new();

    for entry in &workbook_xml.sheets {
        let id = workbook.create_sheet(&entry.name)?;
        visibility.push((id, entry.visibility));

        let target = entry
            .rel_id
            .as_deref()
            .and_then(|rel_id| rels.iter().find(|rel| rel.id == rel_id))
            .map(|rel| resolve_target(&workbook_part, &rel.target));
        let Some(part) = target
            .as_deref()
            .and_then(|name| package.resolve_part_name(name))
            .map(str::to_string)
        else {
            log::warn!("sheet {:?} has no worksheet part; leaving it empty", entry.name);
            continue;
        };
        let Some(xml) = package.part(&part) else {
            continue;
        };

        let sheet_rels = read_rels(package, &part)?;
        let ctx = SheetContext {
            rels: &sheet_rels,
            shared_string_count,
            style_count,
        };
        let sheet = workbook
            .sheet_mut(id)
            .ok_or(WorkbookError::SheetNotFound(id))?;
        let links = read_worksheet_xml(xml, sheet, &ctx)?;

        for rel in sheet_rels.iter().filter(|r| r.type_ == REL_TYPE_COMMENTS) {
            let Some(bytes) = internal_part(package, &part, rel) else {
                continue;
            };
            for comment in parse_comments_xml(bytes)? {
                if let Err(err) = sheet.set_comment(comment) {
                    log::warn!("{}: skipping comment: {err}", sheet.name());
                }
            }
        }

        for rel_id in &links.table_rel_ids {
            let Some(rel) = sheet_rels.iter().find(|rel| &rel.id == rel_id) else {
                log::warn!("{}: table relationship {rel_id} is missing", entry.name);
                continue;
            };
            let Some(bytes) = internal_part(package, &part, rel) else {
                continue;
            };
            let table = parse_table(std::str::from_utf8(bytes)?)?;
            if let Err(err) = workbook.add_table(id, table) {
                log::warn!("{}: skipping table: {err}", entry.name);
            }
        }
    }

    for (id, state) in visibility {
        if state == SheetVisibility::Visible {
            continue;
        }
        if let Err(err) = workbook.set_sheet_visibility(id, state) {
            log::warn!("keeping sheet {id} visible: {err}");
        }
    }

    if let Some(id) = workbook.sheet_at(workbook_xml.active_tab).map(|s| s.id()) {
        if let Err(err) = workbook.set_active_sheet(id) {
            log::warn!("ignoring active tab {}: {err}", workbook_xml.active_tab);
        }
    }
    if workbook_xml.first_sheet > 0 {
        if let Err(err) = workbook.set_first_visible_tab(workbook_xml.first_sheet) {
            log::warn!("ignoring first visible tab: {err}");
        }
    }

    for entry in &workbook_xml.defined_names {
        add_defined_name(&mut workbook, entry);
    }

    read_media(package, &mut workbook);

    log::debug!(
        "read workbook with {} sheets and {} defined names",
        workbook.sheet_count(),
        workbook.defined_names().len()
    );
    Ok(workbook)
}

fn find_workbook_part(package: &XlsxPackage) -> Result<String, XlsxError> {
    let root_rels = read_rels(package, "")?;
    let from_rels = root_rels
        .iter()
        .find(|rel| rel.type_ == REL_TYPE_OFFICE_DOCUMENT)
        .map(|rel| resolve_target("", &rel.target))
        .and_then(|name| package.resolve_part_name(&name).map(str::to_string));
    match from_rels {
        Some(part) => Ok(part),
        None => package
            .resolve_part_name(WORKBOOK_PART)
            .map(str::to_string)
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_PART.to_string())),
    }
}

fn read_rels(package: &XlsxPackage, part: &str) -> Result<Vec<Relationship>, XlsxError> {
    match package.part(&rels_part_for(part)) {
        Some(bytes) => parse_relationships(bytes),
        None => Ok(Vec::new()),
    }
}

fn internal_part<'a>(
    package: &'a XlsxPackage,
    source: &str,
    rel: &Relationship,
) -> Option<&'a [u8]> {
    if rel.is_external() {
        return None;
    }
    let name = resolve_target(source, &rel.target);
    let part = package.part(&name);
    if part.is_none() {
        log::warn!("relationship {} points at missing part {name}", rel.id);
    }
    part
}

/// Part linked from the workbook by `rel_type`, falling back to its usual name.
fn related_part<'a>(
    package: &'a XlsxPackage,
    workbook_part: &str,
    rels: &[Relationship],
    rel_type: &str,
    default_part: &str,
) -> Option<&'a [u8]> {
    match rels.iter().find(|rel| rel.type_ == rel_type) {
        Some(rel) => internal_part(package, workbook_part, rel),
        None => package.part(default_part),
    }
}

fn add_defined_name(workbook: &mut Workbook, entry: &DefinedNameEntry) {
    let scope = match entry.local_sheet_id {
        None => DefinedNameScope::Workbook,
        Some(index) => match workbook.sheet_at(index) {
            Some(sheet) => DefinedNameScope::Sheet(sheet.id()),
            None => {
                log::warn!(
                    "skipping defined name {:?} scoped to missing sheet index {index}",
                    entry.name
                );
                return;
            }
        },
    };

    match workbook.create_defined_name(scope, &entry.name, &entry.refers_to) {
        Ok(id) => {
            if let Some(name) = workbook.defined_name_mut(id) {
                name.hidden = entry.hidden;
                name.comment = entry.comment.clone();
            }
        }
        Err(err) => log::warn!("skipping defined name {:?}: {err}", entry.name),
    }
}

/// Pictures under `xl/media/`, registered in part-number order.
fn read_media(package: &XlsxPackage, workbook: &mut Workbook) {
    let mut media: Vec<(u32, &str, PictureFormat)> = Vec::new();
    for name in package.part_names() {
        let Some(file) = name.strip_prefix("xl/media/") else {
            continue;
        };
        let Some((_, extension)) = file.rsplit_once('.') else {
            continue;
        };
        let Some(format) = PictureFormat::from_extension(extension) else {
            log::warn!("skipping media part {name} with unknown format");
            continue;
        };
        let number =
            trailing_number(name, "xl/media/image", &format!(".{extension}")).unwrap_or(u32::MAX);
        media.push((number, name, format));
    }
    media.sort_by_key(|&(number, name, _)| (number, name));

    for (_, name, format) in media {
        if let Some(bytes) = package.part(name) {
            workbook.add_picture(bytes.to_vec(), format);
        }
    }
}
