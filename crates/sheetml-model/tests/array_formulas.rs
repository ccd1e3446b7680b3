use pretty_assertions::assert_eq;
use sheetml_model::{CellError, CellRef, CellType, CellValue, Range, SheetError, Worksheet};

fn at(a1: &str) -> CellRef {
    CellRef::from_a1(a1).unwrap()
}

fn range(a1: &str) -> Range {
    Range::from_a1(a1).unwrap()
}

#[test]
fn single_cell_array_formula() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    let cells = sheet
        .set_array_formula("SUM(C11:C12*D11:D12)", range("C3:C3"))
        .unwrap();

    assert_eq!(cells.len(), 1);
    let cell = cells[0];
    assert_eq!(cell.address().to_a1(), "C3");
    assert_eq!(cell.formula(), Some("SUM(C11:C12*D11:D12)"));
    assert_eq!(cell.array_formula_range().unwrap().to_string(), "C3");
    assert!(cell.is_array_formula_anchor());
    assert_eq!(cell.cell_type(), CellType::Formula);
}

#[test]
fn multi_cell_array_formula_stores_text_on_the_anchor_only() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    let cells = sheet
        .set_array_formula("=SUM(A1:A3*B1:B3)", range("C4:C6"))
        .unwrap();

    let addresses: Vec<String> = cells.iter().map(|c| c.address().to_a1()).collect();
    assert_eq!(addresses, ["C4", "C5", "C6"]);
    assert_eq!(cells[0].formula(), Some("SUM(A1:A3*B1:B3)"));
    assert_eq!(cells[0].array_formula_range().unwrap().to_string(), "C4:C6");
    for member in &cells[1..] {
        assert_eq!(member.formula(), None);
        assert!(member.is_part_of_array_formula_group());
        assert!(!member.is_array_formula_anchor());
        assert_eq!(member.array_formula_range(), Some(range("C4:C6")));
    }

    let anchor = sheet.first_cell_in_array_formula(at("C6")).unwrap();
    assert_eq!(anchor.address(), at("C4"));
}

#[test]
fn members_cannot_be_edited_individually() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet
        .set_array_formula("A1:A2*2", range("B1:B2"))
        .unwrap();

    let err = sheet.set_value(at("B2"), 5.0).unwrap_err();
    assert_eq!(
        err,
        SheetError::Cell(CellError::PartOfArrayFormula {
            cell: at("B2"),
            range: range("B1:B2"),
        })
    );
    assert!(sheet.cell_mut(at("B2")).unwrap().set_value(5.0).is_err());
    assert!(matches!(
        sheet.remove_row(1),
        Err(SheetError::RowInArrayFormula { row: 1, .. })
    ));
    assert!(matches!(
        sheet.add_merged_region(range("A2:B3")),
        Err(SheetError::ArrayFormulaIntersects { .. })
    ));
}

#[test]
fn plain_value_on_the_anchor_dissolves_the_group() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet
        .set_array_formula("A1:A3*2", range("B1:B3"))
        .unwrap();

    sheet.set_value(at("B1"), 7.0).unwrap();

    for a1 in ["B1", "B2", "B3"] {
        let cell = sheet.cell(at(a1)).unwrap();
        assert!(!cell.is_part_of_array_formula_group(), "{a1}");
        assert_eq!(cell.formula(), None);
    }
    assert_eq!(sheet.cell(at("B1")).unwrap().value(), &CellValue::Number(7.0));
    sheet.set_value(at("B2"), 1.0).unwrap();
    assert!(sheet.array_formulas().is_empty());
}

#[test]
fn remove_array_formula_blanks_every_member() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet.set_array_formula("{1,2}", range("A1:B1")).unwrap();
    for a1 in ["A1", "B1"] {
        sheet.cell_mut(at(a1)).unwrap().set_cached_value(1.0);
    }

    let removed = sheet.remove_array_formula(at("B1")).unwrap();
    assert_eq!(removed.len(), 2);
    assert!(removed.iter().all(|c| c.cell_type() == CellType::Blank));
    assert_eq!(
        sheet.remove_array_formula(at("B1")).unwrap_err(),
        SheetError::NotArrayFormula(at("B1"))
    );
}

#[test]
fn overlapping_groups_are_rejected() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    sheet.set_array_formula("1", range("A1:A3")).unwrap();
    let err = sheet.set_array_formula("2", range("A3:B4")).unwrap_err();
    assert_eq!(
        err,
        SheetError::ArrayFormulaIntersects {
            range: range("A3:B4"),
            array: range("A1:A3"),
        }
    );
    // Re-issuing on the same range replaces the formula.
    sheet.set_array_formula("3", range("A1:A3")).unwrap();
    assert_eq!(sheet.array_formulas(), vec![(range("A1:A3"), "3")]);
}
