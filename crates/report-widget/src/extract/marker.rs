use super::layout::{all_match, ExtractorConfig, MarkerLayout};
use super::tokenizer::RawRow;
use super::{offer_row, record_metric};
use crate::report::Report;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    ScanningForMarker,
    /// Index into `MarkerLayout::sections`.
    ConsumingSection(usize),
}

/// What a single row meant to the scanner. Indices point into the layout's
/// `summary` or `sections` vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEvent {
    Summary(usize),
    Marker(usize),
    Entry(usize),
    /// Row inside a section that lacks the section's row tag.
    Untagged(usize),
    SectionClosed(usize),
    Ignored,
}

/// Section boundary state machine for marker-addressed reports.
///
/// Summary rules win over everything else, then section markers, then the
/// current state decides. Blank rows close a section only when the layout
/// says so.
#[derive(Debug)]
pub struct SectionScanner<'a> {
    layout: &'a MarkerLayout,
    state: ScanState,
}

impl<'a> SectionScanner<'a> {
    pub fn new(layout: &'a MarkerLayout) -> Self {
        Self {
            layout,
            state: ScanState::ScanningForMarker,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn feed(&mut self, row: &RawRow) -> RowEvent {
        if let Some(index) = self
            .layout
            .summary
            .iter()
            .position(|rule| all_match(&rule.when, row))
        {
            return RowEvent::Summary(index);
        }

        if let Some(index) = self
            .layout
            .sections
            .iter()
            .position(|section| all_match(&section.marker, row))
        {
            self.state = ScanState::ConsumingSection(index);
            return RowEvent::Marker(index);
        }

        let ScanState::ConsumingSection(index) = self.state else {
            return RowEvent::Ignored;
        };

        if row.is_blank() {
            if self.layout.blank_row_ends_section {
                self.state = ScanState::ScanningForMarker;
                return RowEvent::SectionClosed(index);
            }
            return RowEvent::Ignored;
        }

        match &self.layout.sections[index].row_tag {
            Some(tag) if !tag.matches(row) => RowEvent::Untagged(index),
            _ => RowEvent::Entry(index),
        }
    }
}

pub(super) fn extract_marker(
    rows: &[RawRow],
    layout: &MarkerLayout,
    config: &ExtractorConfig,
    report: &mut Report,
) {
    let mut scanner = SectionScanner::new(layout);

    for (line, row) in rows.iter().enumerate() {
        match scanner.feed(row) {
            RowEvent::Summary(index) => {
                let rule = &layout.summary[index];
                match row.cell(rule.value.index()) {
                    Some(cell) => record_metric(report, &rule.metric, cell),
                    None => debug!(
                        line = line + 1,
                        metric = ?rule.metric,
                        "summary row has no value cell"
                    ),
                }
            }
            RowEvent::Entry(index) => {
                let section = &layout.sections[index];
                let policy = config.policy(section.max_entries, section.allow_zero_count);
                offer_row(report.list_mut(section.list), row, &section.columns, &policy);
            }
            RowEvent::Marker(index) => {
                debug!(line = line + 1, list = ?layout.sections[index].list, "entering section");
            }
            RowEvent::Untagged(_) | RowEvent::SectionClosed(_) | RowEvent::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::layout::{CellMatch, EntryColumns, SectionMarker};
    use crate::extract::{extract, tokenize_line, AddressingMode};
    use crate::report::{ListKind, RankedEntry};

    fn sentinel_layout(blank_row_ends_section: bool) -> MarkerLayout {
        let section = |list, sentinel: &str| SectionMarker {
            list,
            marker: vec![CellMatch::new(0, sentinel)],
            row_tag: None,
            columns: EntryColumns::new(0, 1, Some(2)),
            max_entries: None,
            allow_zero_count: false,
        };
        MarkerLayout {
            summary: Vec::new(),
            sections: vec![
                section(ListKind::Titles, "#titles"),
                section(ListKind::Companies, "#companies"),
            ],
            blank_row_ends_section,
        }
    }

    fn events(layout: &MarkerLayout, lines: &[&str]) -> Vec<RowEvent> {
        let mut scanner = SectionScanner::new(layout);
        lines
            .iter()
            .map(|line| scanner.feed(&tokenize_line(line)))
            .collect()
    }

    #[test]
    fn blank_row_returns_scanner_to_marker_search() {
        let layout = sentinel_layout(true);
        let got = events(
            &layout,
            &["preamble", "#titles", "Port Engineer,12", "", "Deckhand,3"],
        );
        assert_eq!(
            got,
            vec![
                RowEvent::Ignored,
                RowEvent::Marker(0),
                RowEvent::Entry(0),
                RowEvent::SectionClosed(0),
                RowEvent::Ignored,
            ]
        );
    }

    #[test]
    fn new_marker_switches_section_without_blank_row() {
        let layout = sentinel_layout(true);
        let mut scanner = SectionScanner::new(&layout);
        scanner.feed(&tokenize_line("#titles"));
        assert_eq!(scanner.state(), ScanState::ConsumingSection(0));
        assert_eq!(scanner.feed(&tokenize_line("#companies")), RowEvent::Marker(1));
        assert_eq!(scanner.state(), ScanState::ConsumingSection(1));
        assert_eq!(scanner.feed(&tokenize_line("Matson,40")), RowEvent::Entry(1));
    }

    #[test]
    fn blank_rows_can_be_ignored_inside_sections() {
        let layout = sentinel_layout(false);
        let got = events(&layout, &["#titles", ",,", "Deckhand,3"]);
        assert_eq!(
            got,
            vec![RowEvent::Marker(0), RowEvent::Ignored, RowEvent::Entry(0)]
        );
    }

    #[test]
    fn untagged_rows_are_skipped_but_keep_the_section_open() {
        let mut layout = sentinel_layout(true);
        layout.sections[0].row_tag = Some(CellMatch::new(3, "keep"));
        let got = events(&layout, &["#titles", "Deckhand,3,,drop", "Mate,2,,keep"]);
        assert_eq!(
            got,
            vec![RowEvent::Marker(0), RowEvent::Untagged(0), RowEvent::Entry(0)]
        );
    }

    #[test]
    fn cap_keeps_first_entries_in_source_order() {
        let mut payload = String::from("#titles\n");
        for _ in 0..12 {
            payload.push_str("Port Engineer,12,$80k-$100k\n");
        }

        let config = ExtractorConfig::new(AddressingMode::Marker(sentinel_layout(true)));
        let report = extract(&payload, &config);

        assert_eq!(report.titles.len(), 10);
        let expected = RankedEntry::new("Port Engineer", 12, Some("$80k-$100k".to_string()));
        assert!(report.titles.iter().all(|entry| *entry == expected));
    }

    #[test]
    fn marker_preset_reads_published_report_tab() {
        let payload = "\
Section,Metric,Value,Extra
Summary,Total Active Job Openings,\"4,812\"
Summary,Job Openings in California,913
Summary,Last Updated,2025-03-14

Section,City
CA Cities,City,Count
CA Cities,Long Beach,210
CA Cities,Oakland,n/a

CA Cities,San Diego,88
Section,Job Title
Top Jobs,Port Engineer,12,$80k-$100k
Top Jobs,Deckhand,9
Summary,Last Updated,2025-03-15
Section,Company Name
Top Companies,\"Crowley Maritime, Inc.\",40
Top Jobs,Stray Row,5
";

        let report = extract(payload, &crate::extract::ExtractorConfig::marker_preset());

        assert_eq!(report.summary.total_jobs, 4812);
        assert_eq!(report.summary.regional_jobs, 913);
        assert_eq!(report.summary.last_updated, "2025-03-15");
        assert_eq!(
            report.locations.entries(),
            &[
                RankedEntry::new("Long Beach", 210, None),
                RankedEntry::new("San Diego", 88, None),
            ]
        );
        assert_eq!(
            report.titles.entries(),
            &[
                RankedEntry::new("Port Engineer", 12, Some("$80k-$100k".to_string())),
                RankedEntry::new("Deckhand", 9, None),
            ]
        );
        assert_eq!(
            report.companies.entries(),
            &[RankedEntry::new("Crowley Maritime, Inc.", 40, None)]
        );
    }
}
