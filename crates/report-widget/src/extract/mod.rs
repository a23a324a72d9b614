//! CSV report extraction.
//!
//! [`extract`] never fails: cells that cannot be read degrade to zero or an
//! empty string and the rest of the report is still assembled.

mod coerce;
mod fixed;
pub mod layout;
mod marker;
mod tokenizer;

pub use coerce::{coerce_count, coerce_text};
pub use layout::{
    AddressingKind, AddressingMode, CellMatch, Column, EntryColumns, ExtractorConfig, FixedField,
    FixedLayout, FixedRange, LayoutError, MarkerLayout, SectionMarker, SummaryRule,
    DEFAULT_MAX_ENTRIES,
};
pub use marker::{RowEvent, ScanState, SectionScanner};
pub use tokenizer::{split_rows, tokenize_line, RawRow};

use crate::report::{Metric, MetricKind, MetricValue, RankedEntry, RankedList, Report};
use layout::ListPolicy;
use tracing::debug;

/// Builds a [`Report`] from raw CSV text using the configured addressing
/// mode.
pub fn extract(payload: &str, config: &ExtractorConfig) -> Report {
    let rows = split_rows(payload);
    let mut report = Report::default();

    for metric in config.referenced_metrics() {
        report.summary.declare(metric);
    }

    match &config.addressing {
        AddressingMode::FixedPosition(layout) => {
            fixed::extract_fixed(&rows, layout, config, &mut report)
        }
        AddressingMode::Marker(layout) => {
            marker::extract_marker(&rows, layout, config, &mut report)
        }
    }

    debug!(
        rows = rows.len(),
        mode = %config.addressing.kind(),
        titles = report.titles.len(),
        companies = report.companies.len(),
        locations = report.locations.len(),
        "extracted report"
    );

    report
}

fn record_metric(report: &mut Report, metric: &Metric, cell: &str) {
    let value = match metric.kind() {
        MetricKind::Count => MetricValue::Count(coerce_count(cell)),
        MetricKind::Text => MetricValue::Text(coerce_text(cell)),
    };
    report.summary.record(metric, value);
}

/// Reads a list entry from `row`; `None` when the row lacks the label or
/// count cell.
fn read_entry(row: &RawRow, columns: &EntryColumns) -> Option<RankedEntry> {
    let label = coerce_text(row.cell(columns.label.index())?);
    let count = coerce_count(row.cell(columns.count.index())?);
    let secondary = columns
        .secondary
        .and_then(|column| row.cell(column.index()))
        .map(coerce_text)
        .filter(|value| !value.is_empty());

    Some(RankedEntry::new(label, count, secondary))
}

fn admits(entry: &RankedEntry, policy: &ListPolicy<'_>) -> bool {
    if entry.label.is_empty() {
        return false;
    }
    if policy
        .placeholders
        .iter()
        .any(|placeholder| placeholder.trim().eq_ignore_ascii_case(&entry.label))
    {
        return false;
    }
    entry.count > 0 || policy.allow_zero_count
}

/// Filters then appends a row to `list`, respecting the cap.
fn offer_row(list: &mut RankedList, row: &RawRow, columns: &EntryColumns, policy: &ListPolicy<'_>) {
    if list.is_full(policy.cap) {
        return;
    }
    let Some(entry) = read_entry(row, columns) else {
        debug!(cells = row.cells().len(), "list row too short, skipped");
        return;
    };
    if admits(&entry, policy) {
        list.push_capped(entry, policy.cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ListKind;

    fn policy(placeholders: &[String], allow_zero_count: bool) -> ListPolicy<'_> {
        ListPolicy {
            cap: 10,
            allow_zero_count,
            placeholders,
        }
    }

    #[test]
    fn read_entry_requires_label_and_count_cells() {
        let columns = EntryColumns::new(1, 2, Some(3));
        assert!(read_entry(&tokenize_line("Top Jobs,Deckhand"), &columns).is_none());

        let entry = read_entry(&tokenize_line("Top Jobs,Deckhand,7"), &columns).expect("entry");
        assert_eq!(entry, RankedEntry::new("Deckhand", 7, None));

        let row = tokenize_line("Top Jobs, Deckhand ,\"1,200\",$20/hr");
        let entry = read_entry(&row, &columns).expect("entry");
        assert_eq!(entry.label, "Deckhand");
        assert_eq!(entry.count, 1200);
        assert_eq!(entry.secondary.as_deref(), Some("$20/hr"));
    }

    #[test]
    fn admits_drops_placeholders_empty_labels_and_zero_counts() {
        let placeholders = vec!["Job Title".to_string()];
        let strict = policy(&placeholders, false);

        assert!(admits(&RankedEntry::new("Deckhand", 3, None), &strict));
        assert!(!admits(&RankedEntry::new("job title", 3, None), &strict));
        assert!(!admits(&RankedEntry::new("", 3, None), &strict));
        assert!(!admits(&RankedEntry::new("Deckhand", 0, None), &strict));

        let lenient = policy(&placeholders, true);
        assert!(admits(&RankedEntry::new("Deckhand", 0, None), &lenient));
        assert!(!admits(&RankedEntry::new("Job Title", 0, None), &lenient));
    }

    #[test]
    fn empty_payload_yields_default_report_with_declared_metrics() {
        let mut config = ExtractorConfig::fixed_preset();
        if let AddressingMode::FixedPosition(layout) = &mut config.addressing {
            layout.summary.push(FixedField {
                metric: Metric::Count("remote".to_string()),
                line: 4,
                column: Column::new(1),
            });
        }

        let report = extract("", &config);
        assert_eq!(report.summary.total_jobs, 0);
        assert_eq!(report.summary.last_updated, "");
        assert_eq!(report.summary.count("remote"), Some(0));
        for kind in ListKind::ordered() {
            assert!(report.list(kind).is_empty());
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let payload = "Summary,Total Active Job Openings,\"2,001\"\n\
Section,Job Title\n\
Top Jobs,Port Engineer,12,$80k-$100k\n\
Top Jobs,Deckhand,9,\n";
        let config = ExtractorConfig::marker_preset();
        assert_eq!(extract(payload, &config), extract(payload, &config));
    }
}
