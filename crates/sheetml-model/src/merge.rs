use std::collections::BTreeMap;

use crate::{CellRef, Range};

type RegionKey = (u32, u32, u32, u32);

fn key(range: &Range) -> RegionKey {
    (range.start.row, range.start.col, range.end.row, range.end.col)
}

/// Merged regions of one worksheet.
///
/// Regions keep insertion order (what [`MergedRegions::as_slice`] returns and
/// what `index` arguments refer to). A secondary index ordered by top-left
/// corner keeps overlap checks and containment lookups proportional to the
/// regions near the queried rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedRegions {
    regions: Vec<Range>,
    by_start: BTreeMap<RegionKey, usize>,
    /// Tallest region seen; bounds how far above a query a region may start.
    max_height: u32,
}

impl MergedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Every region, in insertion order, in one borrow.
    pub fn as_slice(&self) -> &[Range] {
        &self.regions
    }

    pub fn get(&self, index: usize) -> Option<Range> {
        self.regions.get(index).copied()
    }

    /// First existing region that intersects `range`.
    pub fn find_overlap(&self, range: &Range) -> Option<Range> {
        self.candidates(range.start.row, range.end.row)
            .find(|existing| existing.intersects(range))
    }

    /// Index of the region covering `cell`, if any.
    pub fn index_containing(&self, cell: CellRef) -> Option<usize> {
        let found = self
            .candidates(cell.row, cell.row)
            .find(|existing| existing.contains(cell))?;
        self.regions.iter().position(|r| *r == found)
    }

    /// Append without validation; returns the new index.
    pub fn push(&mut self, range: Range) -> usize {
        let index = self.regions.len();
        self.regions.push(range);
        *self.by_start.entry(key(&range)).or_insert(0) += 1;
        self.max_height = self.max_height.max(range.height());
        index
    }

    pub fn remove(&mut self, index: usize) -> Option<Range> {
        if index >= self.regions.len() {
            return None;
        }
        let range = self.regions.remove(index);
        let k = key(&range);
        if let Some(count) = self.by_start.get_mut(&k) {
            *count -= 1;
            if *count == 0 {
                self.by_start.remove(&k);
            }
        }
        Some(range)
    }

    /// Replace the whole set (used after structural shifts).
    pub fn reset(&mut self, regions: Vec<Range>) {
        let mut rebuilt = Self::new();
        for range in regions {
            rebuilt.push(range);
        }
        *self = rebuilt;
    }

    /// Regions whose top row could place them inside rows `first..=last`.
    fn candidates(&self, first: u32, last: u32) -> impl Iterator<Item = Range> + '_ {
        let lowest_start = first.saturating_sub(self.max_height.saturating_sub(1));
        self.by_start
            .range((lowest_start, 0, 0, 0)..=(last, u32::MAX, u32::MAX, u32::MAX))
            .map(|(&(sr, sc, er, ec), _)| Range::new(CellRef::new(sr, sc), CellRef::new(er, ec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(a1: &str) -> Range {
        Range::from_a1(a1).unwrap()
    }

    #[test]
    fn overlap_lookup_sees_tall_regions_starting_above() {
        let mut merged = MergedRegions::new();
        merged.push(r("B2:C20"));
        assert_eq!(merged.find_overlap(&r("A15:B15")), Some(r("B2:C20")));
        assert_eq!(merged.find_overlap(&r("D15:E15")), None);
        assert_eq!(merged.index_containing(CellRef::from_a1("C10").unwrap()), Some(0));
    }

    #[test]
    fn remove_keeps_insertion_order() {
        let mut merged = MergedRegions::new();
        merged.push(r("A1:B1"));
        merged.push(r("A2:B2"));
        merged.push(r("A3:B3"));
        assert_eq!(merged.remove(1), Some(r("A2:B2")));
        assert_eq!(merged.as_slice(), &[r("A1:B1"), r("A3:B3")]);
        assert_eq!(merged.find_overlap(&r("A2:A2")), None);
    }
}
