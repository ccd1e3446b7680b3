use pretty_assertions::assert_eq;
use sheetml_model::{
    CellRef, CellValue, ErrorValue, Evaluation, Range, Workbook, WorksheetId,
};

#[test]
fn evaluator_results_become_cached_values() {
    let mut wb = Workbook::new();
    let sheet = wb.create_sheet("Sheet1").unwrap();
    let ws = wb.sheet_mut(sheet).unwrap();
    ws.set_formula(CellRef::new(0, 0), Some("=1+1")).unwrap();
    ws.set_array_formula("{1;2}", Range::from_a1("C1:C3").unwrap())
        .unwrap();
    ws.set_array_formula("TODAY()", Range::from_a1("E1").unwrap())
        .unwrap();

    let mut seen = Vec::new();
    let mut evaluator =
        |_: &Workbook, _: WorksheetId, at: CellRef, formula: &str, array: Option<Range>| {
            seen.push((at, formula.to_string(), array));
            match formula {
                "1+1" => Evaluation::Scalar(CellValue::Number(2.0)),
                "{1;2}" => Evaluation::Array(vec![
                    vec![CellValue::Number(1.0)],
                    vec![CellValue::Number(2.0)],
                ]),
                _ => Evaluation::Scalar(CellValue::Number(45000.0)),
            }
        };
    assert_eq!(wb.recalculate(&mut evaluator), 3);
    assert_eq!(
        seen,
        [
            (CellRef::new(0, 0), "1+1".to_string(), None),
            (
                CellRef::new(0, 2),
                "{1;2}".to_string(),
                Some(Range::from_a1("C1:C3").unwrap())
            ),
            (
                CellRef::new(0, 4),
                "TODAY()".to_string(),
                Some(Range::from_a1("E1").unwrap())
            ),
        ]
    );

    let ws = wb.sheet(sheet).unwrap();
    let value = |a1: &str| ws.cell(CellRef::from_a1(a1).unwrap()).unwrap().value().clone();
    assert_eq!(value("A1"), CellValue::Number(2.0));
    assert_eq!(value("C1"), CellValue::Number(1.0));
    assert_eq!(value("C2"), CellValue::Number(2.0));
    assert_eq!(value("C3"), CellValue::Error(ErrorValue::NA));
    assert_eq!(value("E1"), CellValue::Number(45000.0));
    // Formulas survive recalculation.
    assert_eq!(ws.cell(CellRef::new(0, 0)).unwrap().formula(), Some("1+1"));
}

#[test]
fn scalar_results_broadcast_across_an_array_group() {
    let mut wb = Workbook::new();
    let sheet = wb.create_sheet("Sheet1").unwrap();
    wb.sheet_mut(sheet)
        .unwrap()
        .set_array_formula("B1:C2*0", Range::from_a1("E1:F2").unwrap())
        .unwrap();

    let mut evaluator = |_: &Workbook, _: WorksheetId, _: CellRef, _: &str, _: Option<Range>| {
        Evaluation::Scalar(CellValue::Number(0.0))
    };
    wb.recalculate(&mut evaluator);
    let ws = wb.sheet(sheet).unwrap();
    for at in Range::from_a1("E1:F2").unwrap().cells() {
        assert_eq!(ws.cell(at).unwrap().value(), &CellValue::Number(0.0));
    }
}
