use serde::{Deserialize, Serialize};

/// One row of a ranked list: a label, its count, and an optional secondary
/// attribute such as a pay range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub label: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl RankedEntry {
    pub fn new(label: impl Into<String>, count: u64, secondary: Option<String>) -> Self {
        Self {
            label: label.into(),
            count,
            secondary,
        }
    }
}

/// Entries in source order. The extractor never re-sorts them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedList {
    entries: Vec<RankedEntry>,
}

impl RankedList {
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self, cap: usize) -> bool {
        self.entries.len() >= cap
    }

    /// Appends `entry` unless the list already holds `cap` entries.
    /// Returns whether the entry was kept.
    pub(crate) fn push_capped(&mut self, entry: RankedEntry, cap: usize) -> bool {
        if self.is_full(cap) {
            return false;
        }
        self.entries.push(entry);
        true
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a RankedEntry;
    type IntoIter = std::slice::Iter<'a, RankedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
