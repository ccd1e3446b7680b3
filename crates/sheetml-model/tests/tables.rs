use pretty_assertions::assert_eq;
use sheetml_model::{CellRef, DefinedNameScope, Range, TableError, Workbook};

fn range(a1: &str) -> Range {
    Range::from_a1(a1).unwrap()
}

fn workbook_with_headers() -> (Workbook, u32) {
    let mut wb = Workbook::new();
    let sheet = wb.create_sheet("Sheet1").unwrap();
    wb.set_cell_string(sheet, CellRef::new(0, 0), "Amount").unwrap();
    wb.set_cell_string(sheet, CellRef::new(0, 1), "amount").unwrap();
    (wb, sheet)
}

#[test]
fn header_cells_name_the_columns() {
    let (mut wb, sheet) = workbook_with_headers();
    wb.sheet_mut(sheet)
        .unwrap()
        .set_value(CellRef::new(0, 3), 2024.0)
        .unwrap();

    let table = wb.create_table(sheet, "Sales", range("A1:D5"), true).unwrap();
    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Amount", "amount2", "Column3", "2024"]);
    assert_eq!(table.data_range(), Some(range("A2:D5")));
    assert_eq!(table.column_index("AMOUNT"), Some(0));
}

#[test]
fn table_names_are_workbook_unique() {
    let (mut wb, sheet) = workbook_with_headers();
    wb.create_table(sheet, "Sales", range("A1:B3"), true).unwrap();
    assert_eq!(
        wb.create_table(sheet, "SALES", range("D1:E3"), true).unwrap_err(),
        TableError::DuplicateName
    );

    wb.create_defined_name(DefinedNameScope::Workbook, "Rates", "Sheet1!$A$1")
        .unwrap();
    assert_eq!(
        wb.create_table(sheet, "Rates", range("D1:E3"), true).unwrap_err(),
        TableError::DuplicateName
    );
    assert_eq!(
        wb.create_table(sheet, "1st", range("D1:E3"), true).unwrap_err(),
        TableError::InvalidStartChar
    );
}

#[test]
fn overlapping_and_degenerate_ranges_are_rejected() {
    let (mut wb, sheet) = workbook_with_headers();
    wb.create_table(sheet, "Sales", range("A1:B3"), true).unwrap();
    assert_eq!(
        wb.create_table(sheet, "Costs", range("B3:C6"), true).unwrap_err(),
        TableError::Overlap {
            existing: "Sales".to_string(),
            new: range("B3:C6"),
        }
    );
    assert_eq!(
        wb.create_table(sheet, "Costs", range("D1:E1"), true).unwrap_err(),
        TableError::InvalidRange
    );
    wb.create_table(sheet, "Costs", range("D1:E1"), false).unwrap();
}

#[test]
fn headers_refresh_and_tables_can_be_removed() {
    let (mut wb, sheet) = workbook_with_headers();
    wb.create_table(sheet, "Sales", range("A1:B3"), true).unwrap();
    wb.set_cell_string(sheet, CellRef::new(0, 1), "Units").unwrap();
    wb.update_table_headers("sales").unwrap();

    let (ws, table) = wb.find_table("Sales").unwrap();
    assert_eq!(ws.id(), sheet);
    assert_eq!(table.columns[1].name, "Units");

    let removed = wb.remove_table("Sales").unwrap();
    assert_eq!(removed.range, range("A1:B3"));
    assert!(wb.find_table("Sales").is_none());
    assert_eq!(
        wb.update_table_headers("Sales"),
        Err(TableError::TableNotFound("Sales".to_string()))
    );
}

#[test]
fn resizing_a_table_rereads_headers_and_respects_neighbours() {
    let (mut wb, sheet) = workbook_with_headers();
    wb.set_cell_string(sheet, CellRef::new(0, 2), "Region").unwrap();
    wb.create_table(sheet, "Sales", range("A1:B3"), true).unwrap();
    wb.create_table(sheet, "Costs", range("E1:F3"), true).unwrap();

    wb.set_table_range("Sales", range("A1:C6")).unwrap();
    let (_, table) = wb.find_table("Sales").unwrap();
    assert_eq!(table.range, range("A1:C6"));
    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Amount", "amount2", "Region"]);

    assert_eq!(
        wb.set_table_range("Sales", range("A1:E6")).unwrap_err(),
        TableError::Overlap {
            existing: "Costs".to_string(),
            new: range("A1:E6"),
        }
    );
    assert_eq!(
        wb.set_table_range("Sales", range("A1:C1")).unwrap_err(),
        TableError::InvalidRange
    );
    assert_eq!(wb.find_table("Sales").unwrap().1.range, range("A1:C6"));
    assert_eq!(
        wb.set_table_range("Nope", range("A1:C6")).unwrap_err(),
        TableError::TableNotFound("Nope".to_string())
    );
}

#[test]
fn inserted_columns_widen_the_table() {
    let (mut wb, sheet) = workbook_with_headers();
    wb.create_table(sheet, "Sales", range("A1:B3"), true).unwrap();

    wb.insert_table_column("Sales", 1, Some("Tax")).unwrap();
    wb.insert_table_column("Sales", 0, None).unwrap();
    let (_, table) = wb.find_table("Sales").unwrap();
    assert_eq!(table.range, range("A1:D3"));
    let columns: Vec<(u32, &str)> = table
        .columns
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();
    assert_eq!(
        columns,
        [(4, "Column1"), (1, "Amount"), (3, "Tax"), (2, "amount2")]
    );

    assert_eq!(
        wb.insert_table_column("Sales", 0, Some("TAX")).unwrap_err(),
        TableError::DuplicateColumnName("TAX".to_string())
    );
    assert_eq!(
        wb.insert_table_column("Sales", 9, None).unwrap_err(),
        TableError::ColumnIndexOutOfRange { index: 9, len: 4 }
    );

    wb.create_table(sheet, "Costs", range("E1:E3"), true).unwrap();
    assert!(matches!(
        wb.insert_table_column("Sales", 4, None),
        Err(TableError::Overlap { .. })
    ));
    assert_eq!(wb.find_table("Sales").unwrap().1.columns.len(), 4);
}

#[test]
fn data_row_count_moves_the_bottom_edge() {
    let (mut wb, sheet) = workbook_with_headers();
    wb.create_table(sheet, "Sales", range("A1:B3"), true).unwrap();

    wb.set_table_data_row_count("Sales", 10).unwrap();
    let (_, table) = wb.find_table("Sales").unwrap();
    assert_eq!(table.range, range("A1:B11"));
    assert_eq!(table.data_range(), Some(range("A2:B11")));

    wb.set_table_data_row_count("Sales", 1).unwrap();
    assert_eq!(wb.find_table("Sales").unwrap().1.range, range("A1:B2"));
    assert_eq!(
        wb.set_table_data_row_count("Sales", 0).unwrap_err(),
        TableError::InvalidRange
    );
}
