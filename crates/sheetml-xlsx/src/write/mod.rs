//! Encode a [`Workbook`] into a fresh package.
//!
//! Every part is generated from the model; nothing from a previously loaded
//! package is carried over.

mod worksheet;

use sheetml_model::Workbook;

use crate::comments::{comments_part_name, write_comments_xml};
use crate::content_types::{
    ContentTypesWriter, CONTENT_TYPES_PART, CT_COMMENTS, CT_SHARED_STRINGS, CT_STYLES, CT_TABLE,
    CT_THEME, CT_WORKBOOK, CT_WORKSHEET,
};
use crate::path::rels_part_for;
use crate::relationships::{
    RelationshipsWriter, REL_TYPE_COMMENTS, REL_TYPE_OFFICE_DOCUMENT, REL_TYPE_SHARED_STRINGS,
    REL_TYPE_STYLES, REL_TYPE_TABLE, REL_TYPE_THEME, REL_TYPE_WORKSHEET,
};
use crate::shared_strings::{write_shared_strings_xml, SHARED_STRINGS_PART};
use crate::styles::{write_styles_xml, STYLES_PART};
use crate::tables::{table_part_name, write_table_xml};
use crate::theme::{write_theme_xml, THEME_PART};
use crate::workbook::{write_workbook_xml, WORKBOOK_PART};
use crate::{XlsxError, XlsxPackage, XlsxWriteOptions};

use worksheet::write_worksheet_xml;

fn worksheet_part_name(n: usize) -> String {
    format!("xl/worksheets/sheet{n}.xml")
}

/// Serialize `workbook` as `.xlsx` bytes with default options.
pub fn write_workbook_to_bytes(workbook: &Workbook) -> Result<Vec<u8>, XlsxError> {
    write_workbook_to_bytes_with_options(workbook, &XlsxWriteOptions::default())
}

pub fn write_workbook_to_bytes_with_options(
    workbook: &Workbook,
    options: &XlsxWriteOptions,
) -> Result<Vec<u8>, XlsxError> {
    write_workbook_to_package(workbook)?.write_to_bytes_with_options(options)
}

/// Build the in-memory package for `workbook`.
pub fn write_workbook_to_package(workbook: &Workbook) -> Result<XlsxPackage, XlsxError> {
    let mut package = XlsxPackage::new();
    let mut content_types = ContentTypesWriter::new();
    let mut workbook_rels = RelationshipsWriter::new();
    let mut sheet_rel_ids = Vec::with_capacity(workbook.sheet_count());
    let mut table_count = 0usize;
    let mut comments_count = 0usize;

    content_types.add_override(WORKBOOK_PART, CT_WORKBOOK);

    for (index, sheet) in workbook.sheets().iter().enumerate() {
        let part = worksheet_part_name(index + 1);
        sheet_rel_ids.push(workbook_rels.add(
            REL_TYPE_WORKSHEET,
            format!("worksheets/sheet{}.xml", index + 1),
        ));
        content_types.add_override(&part, CT_WORKSHEET);

        let mut sheet_rels = RelationshipsWriter::new();
        let mut table_rel_ids = Vec::new();
        for table in sheet.tables() {
            table_count += 1;
            let table_part = table_part_name(table_count);
            package.set_part(table_part.clone(), write_table_xml(table)?.into_bytes());
            content_types.add_override(&table_part, CT_TABLE);
            table_rel_ids.push(sheet_rels.add(
                REL_TYPE_TABLE,
                format!("../tables/table{table_count}.xml"),
            ));
        }

        if sheet.comments().next().is_some() {
            comments_count += 1;
            let comments_part = comments_part_name(comments_count);
            package.set_part(
                comments_part.clone(),
                write_comments_xml(sheet.comments()).into_bytes(),
            );
            content_types.add_override(&comments_part, CT_COMMENTS);
            sheet_rels.add(REL_TYPE_COMMENTS, format!("../comments{comments_count}.xml"));
        }

        let xml = write_worksheet_xml(
            sheet,
            workbook.shared_strings(),
            &mut sheet_rels,
            &table_rel_ids,
        );
        if !sheet_rels.is_empty() {
            package.set_part(rels_part_for(&part), sheet_rels.to_xml().into_bytes());
        }
        package.set_part(part, xml.into_bytes());
    }

    workbook_rels.add(REL_TYPE_STYLES, "styles.xml");
    package.set_part(STYLES_PART, write_styles_xml(&workbook.styles).into_bytes());
    content_types.add_override(STYLES_PART, CT_STYLES);

    workbook_rels.add(REL_TYPE_THEME, "theme/theme1.xml");
    package.set_part(THEME_PART, write_theme_xml(&workbook.theme).into_bytes());
    content_types.add_override(THEME_PART, CT_THEME);

    if let Some(shared_strings) = workbook.shared_strings() {
        workbook_rels.add(REL_TYPE_SHARED_STRINGS, "sharedStrings.xml");
        package.set_part(
            SHARED_STRINGS_PART,
            write_shared_strings_xml(shared_strings).into_bytes(),
        );
        content_types.add_override(SHARED_STRINGS_PART, CT_SHARED_STRINGS);
    }

    // Pictures are renumbered densely; tombstoned slots are skipped.
    for (n, (_, picture)) in workbook.media.iter().enumerate() {
        let extension = picture.format.extension();
        content_types.add_default(extension, picture.format.content_type());
        package.set_part(
            format!("xl/media/image{}.{extension}", n + 1),
            picture.bytes.clone(),
        );
    }

    package.set_part(
        WORKBOOK_PART,
        write_workbook_xml(workbook, &sheet_rel_ids).into_bytes(),
    );
    package.set_part(
        rels_part_for(WORKBOOK_PART),
        workbook_rels.to_xml().into_bytes(),
    );

    let mut root_rels = RelationshipsWriter::new();
    root_rels.add(REL_TYPE_OFFICE_DOCUMENT, WORKBOOK_PART);
    package.set_part(rels_part_for(""), root_rels.to_xml().into_bytes());
    package.set_part(CONTENT_TYPES_PART, content_types.to_xml().into_bytes());

    log::debug!(
        "wrote package with {} sheets, {table_count} tables and {} parts",
        workbook.sheet_count(),
        package.part_names().count()
    );
    Ok(package)
}
