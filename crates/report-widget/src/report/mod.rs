mod ranked;
mod summary;

pub use ranked::{RankedEntry, RankedList};
pub use summary::{Metric, MetricKind, MetricValue, Summary};

use serde::{Deserialize, Serialize};

/// Structured result of parsing one CSV payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub titles: RankedList,
    #[serde(default)]
    pub companies: RankedList,
    #[serde(default)]
    pub locations: RankedList,
}

impl Report {
    pub fn list(&self, kind: ListKind) -> &RankedList {
        match kind {
            ListKind::Titles => &self.titles,
            ListKind::Companies => &self.companies,
            ListKind::Locations => &self.locations,
        }
    }

    pub(crate) fn list_mut(&mut self, kind: ListKind) -> &mut RankedList {
        match kind {
            ListKind::Titles => &mut self.titles,
            ListKind::Companies => &mut self.companies,
            ListKind::Locations => &mut self.locations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
            && self.companies.is_empty()
            && self.locations.is_empty()
            && self.summary == Summary::default()
    }
}

/// The three ranked lists a report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListKind {
    Titles,
    Companies,
    Locations,
}

impl ListKind {
    pub const fn ordered() -> [ListKind; 3] {
        [ListKind::Titles, ListKind::Companies, ListKind::Locations]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Titles => "Top Job Titles",
            Self::Companies => "Top Companies",
            Self::Locations => "Top Locations",
        }
    }
}
