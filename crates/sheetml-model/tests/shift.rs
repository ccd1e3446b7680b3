use pretty_assertions::assert_eq;
use sheetml_model::{
    CellRef, CellValue, Comment, Hyperlink, HyperlinkTarget, Range, SheetError, Worksheet,
};

fn at(a1: &str) -> CellRef {
    CellRef::from_a1(a1).unwrap()
}

fn range(a1: &str) -> Range {
    Range::from_a1(a1).unwrap()
}

/// Four rows, `A{n}` holding `n`, and a merged region over rows 2-3.
fn four_row_sheet() -> Worksheet {
    let mut sheet = Worksheet::new(1, "Sheet1");
    for row in 0..4u32 {
        sheet
            .set_value(CellRef::new(row, 0), f64::from(row + 1))
            .unwrap();
        sheet
            .set_value(CellRef::new(row, 1), f64::from(row + 1) * 10.0)
            .unwrap();
    }
    sheet.add_merged_region(range("C2:D3")).unwrap();
    sheet
}

#[test]
fn shift_rows_moves_cells_and_merged_regions() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    for row in 0..4u32 {
        sheet.set_value(CellRef::new(row, 0), f64::from(row)).unwrap();
    }
    sheet.add_merged_region(range("B2:C3")).unwrap();

    sheet.shift_rows(1, 3, 1).unwrap();

    assert_eq!(sheet.merged_regions(), &[range("B3:C4")]);
    assert!(sheet.row(1).is_none());
    assert_eq!(sheet.last_row_num(), Some(4));
    for row in sheet.rows() {
        for cell in row.cells() {
            assert_eq!(cell.row(), row.index());
            assert_eq!(sheet.cell(cell.address()).unwrap().address(), cell.address());
        }
    }
    assert_eq!(sheet.cell(at("A5")).unwrap().value(), &CellValue::Number(3.0));
}

#[test]
fn collision_with_content_outside_the_band_is_rejected_atomically() {
    let mut sheet = four_row_sheet();
    let before = sheet.clone();

    let err = sheet.shift_rows(0, 1, 2).unwrap_err();
    assert_eq!(
        err,
        SheetError::ShiftCollision {
            what: "cell",
            at: Range::single(at("A3")),
        }
    );
    assert_eq!(sheet.merged_regions(), before.merged_regions());
    for (a, b) in sheet.iter_cells().zip(before.iter_cells()) {
        assert_eq!(a.address(), b.address());
        assert_eq!(a.value(), b.value());
    }
}

#[test]
fn splitting_a_merged_region_is_rejected() {
    let mut sheet = four_row_sheet();
    let err = sheet.shift_rows(2, 3, 5).unwrap_err();
    assert_eq!(
        err,
        SheetError::ShiftSplitsRange {
            what: "merged region",
            range: range("C2:D3"),
        }
    );
    assert_eq!(sheet.cell(at("A3")).unwrap().value(), &CellValue::Number(3.0));
}

#[test]
fn shifting_past_the_last_row_is_rejected() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet.set_value(at("A1048575"), 1.0).unwrap();
    assert!(matches!(
        sheet.shift_rows(1_048_574, 1_048_574, 2),
        Err(SheetError::ShiftOutOfBounds { .. })
    ));
    assert!(matches!(
        sheet.shift_rows(3, 1, 1),
        Err(SheetError::InvalidShiftBand { first: 3, last: 1 })
    ));
}

#[test]
fn empty_destination_rows_are_overwritten() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet.set_value(at("A1"), 1.0).unwrap();
    sheet.row_mut_or_create(2).unwrap().set_hidden(true);

    sheet.shift_rows(0, 0, 2).unwrap();
    let row = sheet.row(2).unwrap();
    assert!(!row.is_hidden());
    assert_eq!(row.cell(0).unwrap().value(), &CellValue::Number(1.0));
}

#[test]
fn shift_columns_moves_cells_comments_and_links() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet.set_value(at("B1"), 1.0).unwrap();
    sheet.set_value(at("B5"), 2.0).unwrap();
    sheet.set_value(at("A1"), 3.0).unwrap();
    sheet.set_column_width(1, 20.0).unwrap();
    sheet
        .set_comment(Comment::new(at("B5"), "ann", "check"))
        .unwrap();
    sheet
        .add_hyperlink(Hyperlink::new(
            range("B1"),
            HyperlinkTarget::Url("https://example.com".into()),
        ))
        .unwrap();
    sheet.set_array_formula("1", range("B2:B3")).unwrap();

    sheet.shift_columns(1, 1, 2).unwrap();

    assert!(sheet.cell(at("B1")).is_none());
    assert_eq!(sheet.cell(at("D1")).unwrap().value(), &CellValue::Number(1.0));
    assert_eq!(sheet.cell(at("D5")).unwrap().address(), at("D5"));
    assert_eq!(sheet.cell(at("A1")).unwrap().value(), &CellValue::Number(3.0));
    assert_eq!(sheet.column_width(3), 20.0);
    assert!(sheet.comment(at("D5")).is_some());
    assert!(sheet.hyperlink_at(at("D1")).is_some());
    assert_eq!(
        sheet.first_cell_in_array_formula(at("D3")).unwrap().address(),
        at("D2")
    );
    assert_eq!(sheet.array_formulas(), vec![(range("D2:D3"), "1")]);
}

#[test]
fn rows_shifted_off_the_top_are_discarded_with_their_comments() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet.set_value(at("A1"), 1.0).unwrap();
    sheet.set_value(at("A3"), 3.0).unwrap();
    sheet.set_comment(Comment::new(at("A1"), "a", "gone")).unwrap();

    sheet.shift_rows(0, 2, -1).unwrap();

    assert_eq!(sheet.physical_number_of_rows(), 1);
    assert_eq!(sheet.cell(at("A2")).unwrap().value(), &CellValue::Number(3.0));
    assert_eq!(sheet.comments().count(), 0);
}

#[test]
fn handles_survive_shifts_and_fail_after_removal() {
    let mut sheet = four_row_sheet();
    let cell = sheet.cell_handle(at("A4")).unwrap();
    let row = sheet.row_handle(3).unwrap();

    sheet.shift_rows(3, 3, 3).unwrap();
    assert_eq!(sheet.resolve_cell(cell).unwrap().address(), at("A7"));
    assert_eq!(sheet.resolve_row(row).unwrap().index(), 6);

    sheet.resolve_cell_mut(cell).unwrap().set_value(99.0).unwrap();
    assert_eq!(sheet.cell(at("A7")).unwrap().value(), &CellValue::Number(99.0));

    sheet.remove_row(6).unwrap();
    assert_eq!(sheet.resolve_cell(cell).unwrap_err(), SheetError::StaleHandle);
    assert_eq!(sheet.resolve_row(row).unwrap_err(), SheetError::StaleHandle);
}

#[test]
fn page_breaks_follow_shifted_rows_and_columns() {
    let mut sheet = four_row_sheet();
    sheet.set_row_break(2).unwrap();
    sheet.shift_rows(1, 3, 1).unwrap();
    assert_eq!(sheet.row_breaks().collect::<Vec<_>>(), vec![3]);

    // A break sitting in the destination is overwritten.
    let mut sheet = four_row_sheet();
    sheet.set_row_break(0).unwrap();
    sheet.set_row_break(5).unwrap();
    sheet.shift_rows(0, 0, 5).unwrap();
    assert_eq!(sheet.row_breaks().collect::<Vec<_>>(), vec![5]);

    // Column breaks pushed past column A are dropped, the rest move.
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet.set_column_break(0).unwrap();
    sheet.set_column_break(3).unwrap();
    sheet.set_column_break(9).unwrap();
    sheet.shift_columns(0, 3, -2).unwrap();
    assert_eq!(sheet.column_breaks().collect::<Vec<_>>(), vec![1, 9]);
}
