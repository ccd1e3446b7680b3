use std::time::{Duration, Instant};

use sheetml_model::{CellRef, Range, SheetError, Worksheet};

fn check_single_row_pairs<'a>(regions: impl Iterator<Item = &'a Range>) -> usize {
    let mut seen = 0;
    for region in regions {
        assert_eq!(region.end.row - region.start.row, 0);
        assert_eq!(region.cell_count(), 2);
        seen += 1;
    }
    seen
}

#[test]
fn fifty_thousand_merged_regions_come_back_in_one_pass() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    for row in 0..50_000u32 {
        sheet
            .add_merged_region(Range::new(CellRef::new(row, 0), CellRef::new(row, 1)))
            .unwrap();
    }
    let count = sheet.num_merged_regions();

    // Best of several runs on both sides keeps scheduler noise out.
    let mut bulk = Duration::MAX;
    let mut one_by_one = Duration::MAX;
    for _ in 0..5 {
        let started = Instant::now();
        assert_eq!(check_single_row_pairs(sheet.merged_regions().iter()), 50_000);
        bulk = bulk.min(started.elapsed());

        let started = Instant::now();
        let regions: Vec<Range> = (0..count).filter_map(|i| sheet.merged_region(i)).collect();
        assert_eq!(check_single_row_pairs(regions.iter()), 50_000);
        one_by_one = one_by_one.min(started.elapsed());
    }
    assert!(
        bulk <= one_by_one,
        "bulk pass took {bulk:?}, individual lookups took {one_by_one:?}"
    );
}

#[test]
fn overlap_checks_do_not_mutate() {
    let mut sheet = Worksheet::new(1, "Sheet1");
    let a = Range::from_a1("B2:D4").unwrap();
    sheet.add_merged_region(a).unwrap();

    for overlapping in ["A1:B2", "D4:E5", "C3", "A3:F3"] {
        let range = Range::from_a1(overlapping).unwrap();
        match sheet.add_merged_region(range) {
            Err(SheetError::MergedRegionOverlap { existing, new }) => {
                assert_eq!(existing, a);
                assert_eq!(new, range);
            }
            Err(SheetError::MergedRegionTooSmall(r)) => assert!(r.is_single_cell()),
            other => panic!("{overlapping}: unexpected {other:?}"),
        }
    }
    assert_eq!(sheet.num_merged_regions(), 1);

    sheet.add_merged_region(Range::from_a1("E1:F1").unwrap()).unwrap();
    assert_eq!(sheet.merged_region_containing(CellRef::new(2, 2)), Some(a));
    assert_eq!(sheet.remove_merged_region(0), Some(a));
    assert_eq!(sheet.merged_region(0), Range::from_a1("E1:F1").ok());
}
