use super::coerce::coerce_text;
use super::tokenizer::RawRow;
use crate::report::{ListKind, Metric};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Addressing table telling the extractor where each field lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries_per_list: usize,
    /// Header strings that are never valid list labels (compared
    /// case-insensitively).
    #[serde(default)]
    pub placeholders: Vec<String>,
    pub addressing: AddressingMode,
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum AddressingMode {
    FixedPosition(FixedLayout),
    Marker(MarkerLayout),
}

impl AddressingMode {
    pub fn kind(&self) -> AddressingKind {
        match self {
            AddressingMode::FixedPosition(_) => AddressingKind::FixedPosition,
            AddressingMode::Marker(_) => AddressingKind::Marker,
        }
    }
}

/// Name of an addressing mode, as accepted on the command line and in the
/// environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingKind {
    FixedPosition,
    Marker,
}

impl AddressingKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedPosition => "fixed-position",
            Self::Marker => "marker",
        }
    }
}

impl fmt::Display for AddressingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressingKind {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed-position" | "fixed_position" | "fixed" | "position" => Ok(Self::FixedPosition),
            "marker" | "markers" | "section" => Ok(Self::Marker),
            other => Err(LayoutError::UnknownMode(other.to_string())),
        }
    }
}

/// Zero-based column index. Layout files may spell it as a number or as a
/// spreadsheet letter (`"A"`, `"C"`, `"AA"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ColumnRef", into = "usize")]
pub struct Column(usize);

impl Column {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub fn letters(letters: &str) -> Result<Self, LayoutError> {
        let trimmed = letters.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(LayoutError::InvalidColumn(letters.to_string()));
        }

        let mut value: usize = 0;
        for ch in trimmed.chars() {
            let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            value = value
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| LayoutError::InvalidColumn(letters.to_string()))?;
        }

        Ok(Self(value - 1))
    }
}

impl From<Column> for usize {
    fn from(column: Column) -> Self {
        column.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnRef {
    Index(usize),
    Letters(String),
}

impl TryFrom<ColumnRef> for Column {
    type Error = LayoutError;

    fn try_from(value: ColumnRef) -> Result<Self, Self::Error> {
        match value {
            ColumnRef::Index(index) => Ok(Column(index)),
            ColumnRef::Letters(letters) => match letters.trim().parse::<usize>() {
                Ok(index) => Ok(Column(index)),
                Err(_) => Column::letters(&letters),
            },
        }
    }
}

/// Where a list row keeps its label, count and optional secondary attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryColumns {
    pub label: Column,
    pub count: Column,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Column>,
}

impl EntryColumns {
    pub const fn new(label: usize, count: usize, secondary: Option<usize>) -> Self {
        let secondary = match secondary {
            Some(index) => Some(Column::new(index)),
            None => None,
        };
        Self {
            label: Column::new(label),
            count: Column::new(count),
            secondary,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedLayout {
    #[serde(default)]
    pub summary: Vec<FixedField>,
    #[serde(default)]
    pub lists: Vec<FixedRange>,
}

/// A summary metric at a fixed (1-based line, column) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedField {
    pub metric: Metric,
    pub line: usize,
    pub column: Column,
}

/// A ranked list occupying the inclusive, 1-based line range
/// `first_line..=last_line`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedRange {
    pub list: ListKind,
    pub first_line: usize,
    pub last_line: usize,
    pub columns: EntryColumns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub allow_zero_count: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLayout {
    #[serde(default)]
    pub summary: Vec<SummaryRule>,
    pub sections: Vec<SectionMarker>,
    #[serde(default = "default_true")]
    pub blank_row_ends_section: bool,
}

/// Matches a row whose cell at `column` equals `text` once trimmed and
/// unquoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMatch {
    pub column: Column,
    pub text: String,
}

impl CellMatch {
    pub fn new(column: usize, text: impl Into<String>) -> Self {
        Self {
            column: Column::new(column),
            text: text.into(),
        }
    }

    pub fn matches(&self, row: &RawRow) -> bool {
        row.cell(self.column.index())
            .map(|cell| coerce_text(cell) == self.text.trim())
            .unwrap_or(false)
    }
}

pub(crate) fn all_match(matchers: &[CellMatch], row: &RawRow) -> bool {
    !matchers.is_empty() && matchers.iter().all(|matcher| matcher.matches(row))
}

/// Reads a summary metric from any row carrying the `when` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRule {
    pub metric: Metric,
    pub when: Vec<CellMatch>,
    pub value: Column,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMarker {
    pub list: ListKind,
    pub marker: Vec<CellMatch>,
    /// When set, section rows must carry this cell; other rows are skipped
    /// without closing the section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_tag: Option<CellMatch>,
    pub columns: EntryColumns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    #[serde(default)]
    pub allow_zero_count: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed to read layout file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown addressing mode '{0}' (expected 'marker' or 'fixed-position')")]
    UnknownMode(String),
    #[error("invalid column reference '{0}'")]
    InvalidColumn(String),
    #[error("line numbers are 1-based; got {0}")]
    InvalidLine(usize),
    #[error("line range {first}..={last} is empty")]
    InvalidRange { first: usize, last: usize },
    #[error("section for {0:?} has no marker cells")]
    EmptyMarker(ListKind),
    #[error("summary rule for {0:?} has no match cells")]
    EmptyRule(Metric),
}

/// Per-list filtering and truncation settings after applying overrides.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ListPolicy<'a> {
    pub(crate) cap: usize,
    pub(crate) allow_zero_count: bool,
    pub(crate) placeholders: &'a [String],
}

impl ExtractorConfig {
    pub fn new(addressing: AddressingMode) -> Self {
        Self {
            max_entries_per_list: DEFAULT_MAX_ENTRIES,
            placeholders: Vec::new(),
            addressing,
        }
    }

    pub fn preset(kind: AddressingKind) -> Self {
        match kind {
            AddressingKind::Marker => Self::marker_preset(),
            AddressingKind::FixedPosition => Self::fixed_preset(),
        }
    }

    /// Layout of the published report tab: `Summary,<metric>,<value>` rows,
    /// `Section,<header>` markers and list rows tagged with their section.
    pub fn marker_preset() -> Self {
        let summary_rule = |metric: Metric, name: &str| SummaryRule {
            metric,
            when: vec![CellMatch::new(0, "Summary"), CellMatch::new(1, name)],
            value: Column::new(2),
        };
        let section = |list: ListKind, header: &str, tag: &str, secondary: Option<usize>| {
            SectionMarker {
                list,
                marker: vec![CellMatch::new(0, "Section"), CellMatch::new(1, header)],
                row_tag: Some(CellMatch::new(0, tag)),
                columns: EntryColumns::new(1, 2, secondary),
                max_entries: None,
                allow_zero_count: false,
            }
        };

        Self {
            max_entries_per_list: DEFAULT_MAX_ENTRIES,
            placeholders: vec![
                "City".to_string(),
                "Job Title".to_string(),
                "Company Name".to_string(),
            ],
            addressing: AddressingMode::Marker(MarkerLayout {
                summary: vec![
                    summary_rule(Metric::TotalJobs, "Total Active Job Openings"),
                    summary_rule(Metric::RegionalJobs, "Job Openings in California"),
                    summary_rule(Metric::LastUpdated, "Last Updated"),
                ],
                sections: vec![
                    section(ListKind::Locations, "City", "CA Cities", None),
                    section(ListKind::Titles, "Job Title", "Top Jobs", Some(3)),
                    section(ListKind::Companies, "Company Name", "Top Companies", None),
                ],
                blank_row_ends_section: false,
            }),
        }
    }

    /// Fixed grid: headline cells near the top, then three ten-line list
    /// blocks with label in A and count in B.
    pub fn fixed_preset() -> Self {
        let range = |list: ListKind, first_line: usize, secondary: Option<usize>| FixedRange {
            list,
            first_line,
            last_line: first_line + 9,
            columns: EntryColumns::new(0, 1, secondary),
            max_entries: None,
            allow_zero_count: false,
        };

        Self {
            max_entries_per_list: DEFAULT_MAX_ENTRIES,
            placeholders: vec![
                "Job Title".to_string(),
                "Company".to_string(),
                "Company Name".to_string(),
                "City".to_string(),
                "Location".to_string(),
            ],
            addressing: AddressingMode::FixedPosition(FixedLayout {
                summary: vec![
                    FixedField {
                        metric: Metric::LastUpdated,
                        line: 1,
                        column: Column::new(1),
                    },
                    FixedField {
                        metric: Metric::TotalJobs,
                        line: 3,
                        column: Column::new(2),
                    },
                    FixedField {
                        metric: Metric::RegionalJobs,
                        line: 10,
                        column: Column::new(1),
                    },
                ],
                lists: vec![
                    range(ListKind::Titles, 13, Some(2)),
                    range(ListKind::Companies, 25, None),
                    range(ListKind::Locations, 37, None),
                ],
            }),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LayoutError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries_per_list = max_entries;
        self
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        match &self.addressing {
            AddressingMode::FixedPosition(layout) => {
                for field in &layout.summary {
                    if field.line == 0 {
                        return Err(LayoutError::InvalidLine(field.line));
                    }
                }
                for range in &layout.lists {
                    if range.first_line == 0 {
                        return Err(LayoutError::InvalidLine(range.first_line));
                    }
                    if range.first_line > range.last_line {
                        return Err(LayoutError::InvalidRange {
                            first: range.first_line,
                            last: range.last_line,
                        });
                    }
                }
            }
            AddressingMode::Marker(layout) => {
                if let Some(rule) = layout.summary.iter().find(|rule| rule.when.is_empty()) {
                    return Err(LayoutError::EmptyRule(rule.metric.clone()));
                }
                if let Some(section) = layout
                    .sections
                    .iter()
                    .find(|section| section.marker.is_empty())
                {
                    return Err(LayoutError::EmptyMarker(section.list));
                }
            }
        }
        Ok(())
    }

    /// Every summary metric the layout addresses.
    pub fn referenced_metrics(&self) -> Vec<&Metric> {
        match &self.addressing {
            AddressingMode::FixedPosition(layout) => {
                layout.summary.iter().map(|field| &field.metric).collect()
            }
            AddressingMode::Marker(layout) => {
                layout.summary.iter().map(|rule| &rule.metric).collect()
            }
        }
    }

    pub(crate) fn policy(
        &self,
        max_entries: Option<usize>,
        allow_zero_count: bool,
    ) -> ListPolicy<'_> {
        ListPolicy {
            cap: max_entries.unwrap_or(self.max_entries_per_list),
            allow_zero_count,
            placeholders: &self.placeholders,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::marker_preset()
    }
}
