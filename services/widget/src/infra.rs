use chrono::{DateTime, Utc};
use report_widget::cache::{CachedSnapshot, FileStore, FreshnessCache};
use report_widget::config::ReportConfig;
use report_widget::error::AppError;
use report_widget::extract::{AddressingKind, ExtractorConfig};
use report_widget::loader::{Origin, ReportLoader};
use report_widget::report::{ListKind, MetricValue, Report};
use report_widget::source::{ReportSource, SourceSpec};

pub(crate) type WidgetLoader = ReportLoader<ReportSource, FileStore>;

pub(crate) fn parse_source(value: &str) -> Result<SourceSpec, String> {
    value.parse::<SourceSpec>().map_err(|err| err.to_string())
}

pub(crate) fn parse_addressing(value: &str) -> Result<AddressingKind, String> {
    value
        .parse::<AddressingKind>()
        .map_err(|err| err.to_string())
}

pub(crate) fn build_cache(config: &ReportConfig) -> FreshnessCache<FileStore> {
    FreshnessCache::new(
        FileStore::new(&config.cache_dir),
        config.cache_key.clone(),
        config.ttl,
    )
}

pub(crate) fn build_loader(
    config: &ReportConfig,
    source_override: Option<SourceSpec>,
) -> Result<WidgetLoader, AppError> {
    let spec = source_override
        .or_else(|| config.source.clone())
        .ok_or(AppError::MissingSource)?;
    let source = ReportSource::from_spec(&spec, config.fetch_timeout)?;
    let extractor = config.extractor_config()?;
    Ok(ReportLoader::new(source, build_cache(config), extractor))
}

/// Layout used by `extract`: an explicit layout file wins, then a requested
/// addressing preset, then whatever the environment configures.
pub(crate) fn resolve_extractor(
    config: &ReportConfig,
    layout: Option<&std::path::Path>,
    addressing: Option<AddressingKind>,
    max_entries: Option<usize>,
) -> Result<ExtractorConfig, AppError> {
    let base = match (layout, addressing) {
        (Some(path), _) => ExtractorConfig::from_path(path)?,
        (None, Some(kind)) => ExtractorConfig::preset(kind).with_max_entries(config.max_entries),
        (None, None) => config.extractor_config()?,
    };
    Ok(match max_entries {
        Some(cap) => base.with_max_entries(cap),
        None => base,
    })
}

pub(crate) fn render_report(report: &Report, origin: Option<Origin>) -> String {
    let mut lines = Vec::new();
    let provenance = match origin {
        Some(Origin::Cache) => " (cached)",
        Some(Origin::Fresh) => " (fresh)",
        None => "",
    };
    let updated = if report.summary.last_updated.is_empty() {
        "unknown"
    } else {
        report.summary.last_updated.as_str()
    };
    lines.push(format!("Job market report{provenance}, updated {updated}"));
    lines.push(format!(
        "- {} active openings | {} regional",
        report.summary.total_jobs, report.summary.regional_jobs
    ));
    for (name, value) in &report.summary.extra {
        let line = match value {
            MetricValue::Count(count) => format!("- {name}: {count}"),
            MetricValue::Text(text) => format!("- {name}: {text}"),
        };
        lines.push(line);
    }
    for kind in ListKind::ordered() {
        let list = report.list(kind);
        lines.push(format!("{} ({})", kind.label(), list.len()));
        for (rank, entry) in list.iter().enumerate() {
            let line = match &entry.secondary {
                Some(secondary) => format!(
                    "  {}. {} | {} | {}",
                    rank + 1,
                    entry.label,
                    entry.count,
                    secondary
                ),
                None => format!("  {}. {} | {}", rank + 1, entry.label, entry.count),
            };
            lines.push(line);
        }
    }
    lines.join("\n")
}

pub(crate) fn render_snapshot(snapshot: &CachedSnapshot) -> String {
    let stored_at = DateTime::<Utc>::from_timestamp_millis(snapshot.entry.timestamp)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| snapshot.entry.timestamp.to_string());
    let state = if snapshot.fresh { "fresh" } else { "stale" };
    format!(
        "Cached at {stored_at} ({} s old, {state})\n{}",
        snapshot.age_millis / 1000,
        render_report(&snapshot.entry.report, None)
    )
}
