use crate::infra::{
    build_cache, build_loader, parse_addressing, parse_source, render_report, render_snapshot,
    resolve_extractor,
};
use clap::Args;
use report_widget::config::AppConfig;
use report_widget::error::AppError;
use report_widget::extract::{extract, AddressingKind};
use report_widget::refresh::{run_refresh_loop, JsonFileSink, RefreshSchedule, ReportSink};
use report_widget::source::{CsvSource, SourceSpec};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Args, Debug, Default)]
pub(crate) struct LoadArgs {
    /// Override REPORT_SOURCE (URL or path of the CSV export)
    #[arg(long, value_parser = parse_source)]
    pub(crate) source: Option<SourceSpec>,
    /// Override REPORT_OUTPUT (where the report JSON is written)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Skip the cache read and fetch a fresh export
    #[arg(long)]
    pub(crate) force: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExtractArgs {
    /// CSV export to read
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// JSON layout file describing where each value lives
    #[arg(long)]
    pub(crate) layout: Option<PathBuf>,
    /// Use the built-in layout for this addressing mode (marker or fixed-position)
    #[arg(long, value_parser = parse_addressing)]
    pub(crate) addressing: Option<AddressingKind>,
    /// Cap every ranked list at this many entries
    #[arg(long)]
    pub(crate) max_entries: Option<usize>,
    /// Write the report JSON here instead of printing it
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct WatchArgs {
    /// Override REPORT_SOURCE (URL or path of the CSV export)
    #[arg(long, value_parser = parse_source)]
    pub(crate) source: Option<SourceSpec>,
    /// Override REPORT_OUTPUT (where the report JSON is written)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Seconds between refresh cycles (defaults to REPORT_REFRESH_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) every: Option<u64>,
    /// Stop after this many cycles instead of running until interrupted
    #[arg(long)]
    pub(crate) cycles: Option<u64>,
}

pub(crate) async fn run_load(args: LoadArgs, config: &AppConfig) -> Result<(), AppError> {
    let LoadArgs {
        source,
        output,
        force,
    } = args;

    let loader = build_loader(&config.report, source)?;
    let loaded = if force {
        loader.refresh().await?
    } else {
        loader.load().await?
    };

    let sink = JsonFileSink::new(output.unwrap_or_else(|| config.report.output.clone()));
    sink.publish(&loaded.report)?;
    info!(
        path = %sink.path().display(),
        origin = ?loaded.origin,
        "report published"
    );

    println!("{}", render_report(&loaded.report, Some(loaded.origin)));
    println!("\nWritten to {}", sink.path().display());
    Ok(())
}

pub(crate) fn run_extract(args: ExtractArgs, config: &AppConfig) -> Result<(), AppError> {
    let ExtractArgs {
        csv,
        layout,
        addressing,
        max_entries,
        output,
    } = args;

    let extractor = resolve_extractor(&config.report, layout.as_deref(), addressing, max_entries)?;
    let payload = std::fs::read_to_string(&csv)?;
    let report = extract(&payload, &extractor);

    match output {
        Some(path) => {
            let sink = JsonFileSink::new(path);
            sink.publish(&report)?;
            info!(
                csv = %csv.display(),
                path = %sink.path().display(),
                addressing = %extractor.addressing.kind(),
                "extracted report written"
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

pub(crate) async fn run_watch(args: WatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let WatchArgs {
        source,
        output,
        every,
        cycles,
    } = args;

    let loader = build_loader(&config.report, source)?;
    let sink = JsonFileSink::new(output.unwrap_or_else(|| config.report.output.clone()));
    let period = every
        .map(Duration::from_secs)
        .unwrap_or(config.report.refresh_every);
    let mut schedule = RefreshSchedule::every(period);
    if let Some(limit) = cycles {
        schedule = schedule.limited(limit);
    }

    info!(
        source = %loader.source().describe(),
        path = %sink.path().display(),
        period_secs = period.as_secs(),
        "watching report source"
    );

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "could not listen for ctrl-c; running until cycles complete");
            std::future::pending::<()>().await;
        }
    };
    let stats = run_refresh_loop(&loader, &sink, schedule, shutdown).await;

    println!(
        "Refresh stopped after {} cycles: {} published | {} served from cache | {} failed",
        stats.cycles, stats.published, stats.cache_hits, stats.failures
    );
    Ok(())
}

pub(crate) fn run_cache_show(config: &AppConfig) -> Result<(), AppError> {
    let cache = build_cache(&config.report);
    match cache.peek() {
        Some(snapshot) => println!("{}", render_snapshot(&snapshot)),
        None => println!(
            "No cached report under {}",
            cache.store().path_for(cache.key()).display()
        ),
    }
    Ok(())
}

pub(crate) fn run_cache_clear(config: &AppConfig) -> Result<(), AppError> {
    let cache = build_cache(&config.report);
    cache.clear()?;
    println!("Cleared cached report '{}'", cache.key());
    Ok(())
}
