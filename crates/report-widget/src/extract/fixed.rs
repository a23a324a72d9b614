use super::layout::{ExtractorConfig, FixedLayout};
use super::tokenizer::RawRow;
use super::{offer_row, record_metric};
use crate::report::Report;
use tracing::debug;

fn row_at(rows: &[RawRow], line: usize) -> Option<&RawRow> {
    line.checked_sub(1).and_then(|index| rows.get(index))
}

pub(super) fn extract_fixed(
    rows: &[RawRow],
    layout: &FixedLayout,
    config: &ExtractorConfig,
    report: &mut Report,
) {
    for field in &layout.summary {
        match row_at(rows, field.line).and_then(|row| row.cell(field.column.index())) {
            Some(cell) => record_metric(report, &field.metric, cell),
            None => debug!(
                metric = ?field.metric,
                line = field.line,
                column = field.column.index(),
                "summary cell missing, keeping default"
            ),
        }
    }

    for range in &layout.lists {
        let policy = config.policy(range.max_entries, range.allow_zero_count);
        let list = report.list_mut(range.list);

        for line in range.first_line..=range.last_line {
            let Some(row) = row_at(rows, line) else {
                break;
            };
            offer_row(list, row, &range.columns, &policy);
        }
    }
}
