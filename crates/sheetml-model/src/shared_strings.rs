use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::rich_text::RichText;

/// Workbook-wide pool of deduplicated strings (`xl/sharedStrings.xml`).
///
/// Entries are never removed; an index stays valid for the table's lifetime.
/// Two entries are the same only when text and formatting runs both match.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SharedStringTable {
    entries: Vec<RichText>,
    /// Total references handed out (the part's `count` attribute).
    count: u64,
    #[serde(skip)]
    index: HashMap<RichText, u32>,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from entries as stored in a part, keeping their indices.
    pub fn from_entries(entries: Vec<RichText>, count: u64) -> Self {
        let mut table = Self {
            entries,
            count,
            index: HashMap::new(),
        };
        table.rebuild_index();
        table
    }

    /// Index of `text`, appending it if no identical entry exists.
    ///
    /// Every call counts as one reference.
    pub fn intern(&mut self, text: impl Into<RichText>) -> u32 {
        let text = text.into();
        self.count += 1;
        if let Some(idx) = self.index.get(&text) {
            return *idx;
        }
        let idx = self.entries.len() as u32;
        self.entries.push(text.clone());
        self.index.insert(text, idx);
        idx
    }

    /// Index of an identical entry, without interning.
    pub fn find(&self, text: &RichText) -> Option<u32> {
        self.index.get(text).copied()
    }

    pub fn get(&self, idx: u32) -> Option<&RichText> {
        self.entries.get(idx as usize)
    }

    pub fn entries(&self) -> &[RichText] {
        &self.entries
    }

    /// Total references (`count`); at least `unique_count`.
    pub fn count(&self) -> u64 {
        self.count.max(self.entries.len() as u64)
    }

    /// Distinct entries (`uniqueCount`).
    pub fn unique_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, text) in self.entries.iter().enumerate() {
            self.index.entry(text.clone()).or_insert(i as u32);
        }
    }
}

impl<'de> Deserialize<'de> for SharedStringTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default)]
            entries: Vec<RichText>,
            #[serde(default)]
            count: u64,
        }

        let helper = Helper::deserialize(deserializer)?;
        Ok(SharedStringTable::from_entries(helper.entries, helper.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich_text::RichTextRunStyle;

    #[test]
    fn interning_dedups_on_text_and_runs() {
        let mut sst = SharedStringTable::new();
        let a = sst.intern("Hello");
        let b = sst.intern("Hello");
        assert_eq!(a, b);

        let mut bold = RichText::new("Hello");
        bold.apply_style(
            0,
            5,
            RichTextRunStyle {
                bold: Some(true),
                ..Default::default()
            },
        );
        let c = sst.intern(bold.clone());
        assert_ne!(a, c);
        assert_eq!(sst.get(c), Some(&bold));

        assert_eq!(sst.unique_count(), 2);
        assert_eq!(sst.count(), 3);
    }

    #[test]
    fn deserialize_rebuilds_the_lookup_index() {
        let mut sst = SharedStringTable::new();
        sst.intern("a");
        sst.intern("b");
        let json = serde_json::to_string(&sst).unwrap();
        let back: SharedStringTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.find(&RichText::new("b")), Some(1));
        assert_eq!(back.count(), 2);
    }
}
