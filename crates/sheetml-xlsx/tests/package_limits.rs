use sheetml_model::{CellRef, RichText, StringValue, Workbook};
use sheetml_xlsx::{
    read_workbook_from_bytes_with_options, write_workbook_to_bytes, XlsxError, XlsxPackage,
    XlsxPackageLimits, XlsxReadOptions,
};

fn large_workbook() -> Vec<u8> {
    let mut wb = Workbook::with_inline_strings();
    let id = wb.create_sheet("Big").unwrap();
    let ws = wb.sheet_mut(id).unwrap();
    for row in 0..200 {
        ws.set_value(
            CellRef::new(row, 0),
            StringValue::Inline(RichText::new("x".repeat(100))),
        )
        .unwrap();
    }
    write_workbook_to_bytes(&wb).unwrap()
}

fn options(max_part_bytes: u64, max_total_bytes: u64) -> XlsxReadOptions {
    XlsxReadOptions {
        limits: XlsxPackageLimits {
            max_part_bytes,
            max_total_bytes,
        },
    }
}

#[test]
fn oversized_parts_are_rejected() {
    let bytes = large_workbook();
    let err = read_workbook_from_bytes_with_options(&bytes, &options(16 * 1024, u64::MAX))
        .unwrap_err();
    match err {
        XlsxError::PartTooLarge { part, max, .. } => {
            assert_eq!(part, "xl/worksheets/sheet1.xml");
            assert_eq!(max, 16 * 1024);
        }
        other => panic!("expected PartTooLarge, got {other:?}"),
    }
}

#[test]
fn total_budget_is_enforced() {
    let bytes = large_workbook();
    let err = XlsxPackage::from_bytes_with_options(&bytes, &options(u64::MAX, 8 * 1024))
        .unwrap_err();
    assert!(matches!(err, XlsxError::PackageTooLarge { max, .. } if max == 8 * 1024));
}

#[test]
fn default_limits_accept_ordinary_files() {
    let bytes = large_workbook();
    let wb = read_workbook_from_bytes_with_options(&bytes, &XlsxReadOptions::default()).unwrap();
    assert_eq!(wb.sheet_at(0).unwrap().rows().count(), 200);
}

#[test]
fn garbage_is_a_zip_error() {
    let err = XlsxPackage::from_bytes(b"definitely not a zip").unwrap_err();
    assert!(matches!(err, XlsxError::Zip(_)));
}
