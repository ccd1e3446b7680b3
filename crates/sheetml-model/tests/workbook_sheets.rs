use pretty_assertions::assert_eq;
use sheetml_model::{
    CellRef, CellValue, DefinedNameError, DefinedNameScope, PictureFormat, Range,
    ReferenceError, ResolvedArea, SheetNameError, SheetVisibility, StringValue, Workbook,
    WorkbookError, XLNM_PRINT_AREA,
};

#[test]
fn sheet_names_are_unique_case_insensitively() {
    let mut wb = Workbook::new();
    let data = wb.create_sheet("Data").unwrap();
    assert_eq!(
        wb.create_sheet("DATA"),
        Err(WorkbookError::SheetName(SheetNameError::Duplicate(
            "DATA".to_string()
        )))
    );
    assert_eq!(wb.sheet_by_name("data").map(|s| s.id()), Some(data));
    let other = wb.create_sheet("Other").unwrap();
    assert!(wb.rename_sheet(other, "dAtA").is_err());
    wb.rename_sheet(data, "data").unwrap();
    assert_eq!(wb.sheet(data).unwrap().name(), "data");
}

#[test]
fn hiding_keeps_one_visible_sheet_and_moves_the_active_tab() {
    let mut wb = Workbook::new();
    let a = wb.create_sheet("A").unwrap();
    let b = wb.create_sheet("B").unwrap();
    assert_eq!(wb.active_sheet(), Some(a));

    wb.set_sheet_hidden(0, true).unwrap();
    assert_eq!(wb.sheet_visibility(0), Some(SheetVisibility::Hidden));
    assert_eq!(wb.active_sheet(), Some(b));
    assert_eq!(
        wb.set_sheet_visibility(b, SheetVisibility::VeryHidden),
        Err(WorkbookError::LastVisibleSheet)
    );
    assert_eq!(
        wb.set_active_sheet(a),
        Err(WorkbookError::HiddenActiveSheet(a))
    );

    wb.set_sheet_visibility(a, SheetVisibility::VeryHidden).unwrap();
    assert_eq!(wb.sheet_visibility(0), Some(SheetVisibility::VeryHidden));
    wb.set_sheet_hidden(0, false).unwrap();
    assert_eq!(wb.sheet_visibility(0), Some(SheetVisibility::Visible));
}

#[test]
fn clone_sheet_copies_cells_and_scoped_names() {
    let mut wb = Workbook::new();
    let src = wb.create_sheet("Report").unwrap();
    wb.set_cell_string(src, CellRef::new(0, 0), "Region").unwrap();
    wb.sheet_mut(src)
        .unwrap()
        .set_value(CellRef::new(1, 0), 12.5)
        .unwrap();
    wb.create_defined_name(DefinedNameScope::Sheet(src), XLNM_PRINT_AREA, "=Report!$A$1:$A$2")
        .unwrap();
    wb.create_table(src, "Sales", Range::from_a1("A1:A2").unwrap(), true)
        .unwrap();

    let copy = wb.clone_sheet(src).unwrap();
    assert_eq!(wb.sheet(copy).unwrap().name(), "Report (2)");
    assert_eq!(
        wb.cell_text(copy, CellRef::new(0, 0)).map(|t| t.plain_text()),
        Some("Region")
    );
    assert_eq!(
        wb.sheet(copy).unwrap().cell(CellRef::new(1, 0)).unwrap().value(),
        &CellValue::Number(12.5)
    );
    assert!(wb
        .defined_name(DefinedNameScope::Sheet(copy), XLNM_PRINT_AREA)
        .is_some());
    assert_eq!(wb.sheet(copy).unwrap().tables()[0].name, "Sales_2");

    // Editing the copy leaves the source alone.
    wb.sheet_mut(copy)
        .unwrap()
        .set_value(CellRef::new(1, 0), 1.0)
        .unwrap();
    assert_eq!(
        wb.sheet(src).unwrap().cell(CellRef::new(1, 0)).unwrap().value(),
        &CellValue::Number(12.5)
    );
}

#[test]
fn removing_a_sheet_drops_its_names_and_repoints_the_active_sheet() {
    let mut wb = Workbook::new();
    let a = wb.create_sheet("A").unwrap();
    let b = wb.create_sheet("B").unwrap();
    wb.create_defined_name(DefinedNameScope::Sheet(a), "Local", "A!$A$1")
        .unwrap();
    wb.create_defined_name(DefinedNameScope::Workbook, "Global", "B!$A$1")
        .unwrap();

    wb.remove_sheet(a).unwrap();
    assert_eq!(wb.active_sheet(), Some(b));
    assert_eq!(wb.defined_names().len(), 1);
    assert_eq!(wb.remove_sheet(a).unwrap_err(), WorkbookError::SheetNotFound(a));
}

#[test]
fn sheet_order_must_be_a_permutation() {
    let mut wb = Workbook::new();
    let a = wb.create_sheet("A").unwrap();
    let b = wb.create_sheet("B").unwrap();
    let c = wb.create_sheet("C").unwrap();
    assert_eq!(
        wb.set_sheet_order(&[a, a, b]),
        Err(WorkbookError::InvalidSheetOrder)
    );
    wb.set_sheet_order(&[c, a, b]).unwrap();
    let names: Vec<&str> = wb.sheets().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["C", "A", "B"]);
    assert_eq!(wb.sheet_index(a), Some(1));
}

#[test]
fn defined_names_are_unique_per_scope() {
    let mut wb = Workbook::new();
    let s = wb.create_sheet("Sheet1").unwrap();
    wb.create_defined_name(DefinedNameScope::Workbook, "Rate", "Sheet1!$B$1")
        .unwrap();
    assert_eq!(
        wb.create_defined_name(DefinedNameScope::Workbook, "RATE", "Sheet1!$B$2"),
        Err(DefinedNameError::DuplicateName("RATE".to_string()))
    );
    wb.create_defined_name(DefinedNameScope::Sheet(s), "Rate", "Sheet1!$C$1")
        .unwrap();
    assert!(matches!(
        wb.create_defined_name(DefinedNameScope::Workbook, "A1", "1"),
        Err(DefinedNameError::InvalidName(_))
    ));
    assert_eq!(
        wb.create_defined_name(DefinedNameScope::Sheet(99), "X", "1"),
        Err(DefinedNameError::SheetNotFound(99))
    );
}

#[test]
fn references_distinguish_bad_syntax_from_unknown_names() {
    let mut wb = Workbook::new();
    let s = wb.create_sheet("Sheet1").unwrap();
    let t = wb.create_sheet("Totals").unwrap();
    wb.create_defined_name(DefinedNameScope::Workbook, "Rate", "Totals!$B$1")
        .unwrap();
    wb.create_defined_name(DefinedNameScope::Sheet(s), "Rate", "$C$1:$C$4")
        .unwrap();

    let c1_c4 = Range::from_a1("C1:C4").unwrap();
    assert_eq!(
        wb.resolve_reference("Rate", Some(s)),
        Ok(ResolvedArea {
            sheet: Some(s),
            range: c1_c4,
        })
    );
    assert_eq!(
        wb.resolve_reference("=rate", None).unwrap().sheet,
        Some(t)
    );
    assert_eq!(
        wb.resolve_reference("Missing", None),
        Err(ReferenceError::NameNotFound("Missing".to_string()))
    );
    assert!(matches!(
        wb.resolve_reference("A1:", None),
        Err(ReferenceError::Parse(_))
    ));
    assert_eq!(
        wb.resolve_reference("Nope!A1", None),
        Err(ReferenceError::SheetNotFound("Nope".to_string()))
    );
}

#[test]
fn inline_string_mode_never_needs_a_table() {
    let mut wb = Workbook::with_inline_strings();
    let s = wb.create_sheet("Sheet1").unwrap();
    let cell = wb.set_cell_string(s, CellRef::new(0, 0), "hello").unwrap();
    assert!(matches!(
        cell.value(),
        CellValue::String(StringValue::Inline(_))
    ));
    assert!(wb.shared_strings().is_none());

    wb.enable_shared_strings();
    wb.set_cell_string(s, CellRef::new(0, 1), "hello").unwrap();
    wb.set_cell_string(s, CellRef::new(0, 2), "hello").unwrap();
    let strings = wb.shared_strings().unwrap();
    assert_eq!(strings.unique_count(), 1);
    assert_eq!(strings.count(), 2);
    assert_eq!(
        wb.cell_text(s, CellRef::new(0, 2)).map(|t| t.plain_text()),
        Some("hello")
    );
}

#[test]
fn media_indices_are_stable() {
    let mut wb = Workbook::new();
    let first = wb.add_picture(vec![0x89, b'P', b'N', b'G'], PictureFormat::Png);
    let second = wb.add_picture(vec![0xFF, 0xD8], PictureFormat::Jpeg);
    wb.media.remove(first);
    let third = wb.add_picture(vec![1], PictureFormat::Gif);
    assert_eq!((first, second, third), (0, 1, 2));
    assert!(wb.media.get(first).is_none());
}
