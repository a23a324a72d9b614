//! Fixed-cadence refresh driver and the JSON publisher the widget page reads.

use crate::cache::{CacheStore, Clock};
use crate::loader::{Origin, ReportLoader};
use crate::report::Report;
use crate::source::CsvSource;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Hands a finished report to whatever renders it.
pub trait ReportSink: Send + Sync {
    fn publish(&self, report: &Report) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("report could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the report as pretty JSON, replacing the file atomically.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl ReportSink for JsonFileSink {
    fn publish(&self, report: &Report) -> Result<(), SinkError> {
        let body = serde_json::to_string_pretty(report)?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, body).map_err(|err| self.io_error(err))?;
        std::fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub period: Duration,
    /// Stop after this many cycles; `None` runs until shutdown.
    pub cycles: Option<u64>,
}

impl RefreshSchedule {
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            cycles: None,
        }
    }

    pub fn limited(mut self, cycles: u64) -> Self {
        self.cycles = Some(cycles);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub cycles: u64,
    pub published: u64,
    pub cache_hits: u64,
    pub failures: u64,
}

/// Runs the loader on every tick and publishes each report. Cycles never
/// overlap: the next tick is awaited only after the previous cycle finished,
/// and missed ticks are delayed rather than burst.
///
/// When the period is at least the cache TTL every cycle fetches: an entry
/// stamped at the end of one cycle's fetch is still younger than the TTL at
/// the next tick, so a cache read would double the effective cadence.
pub async fn run_refresh_loop<Src, S, C, K, F>(
    loader: &ReportLoader<Src, S, C>,
    sink: &K,
    schedule: RefreshSchedule,
    shutdown: F,
) -> RefreshStats
where
    Src: CsvSource,
    S: CacheStore,
    C: Clock,
    K: ReportSink,
    F: Future<Output = ()>,
{
    let mut stats = RefreshStats::default();
    let bypass_cache = schedule.period >= loader.cache().ttl();
    let mut ticker = interval(schedule.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        if schedule.cycles.is_some_and(|limit| stats.cycles >= limit) {
            break;
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(cycles = stats.cycles, "refresh loop shutting down");
                break;
            }
            _ = ticker.tick() => {}
        }

        stats.cycles += 1;
        let outcome = if bypass_cache {
            loader.refresh().await
        } else {
            loader.load().await
        };
        match outcome {
            Ok(loaded) => {
                if loaded.origin == Origin::Cache {
                    stats.cache_hits += 1;
                }
                match sink.publish(&loaded.report) {
                    Ok(()) => stats.published += 1,
                    Err(err) => {
                        stats.failures += 1;
                        warn!(cycle = stats.cycles, error = %err, "report publish failed");
                    }
                }
            }
            Err(err) => {
                stats.failures += 1;
                warn!(cycle = stats.cycles, error = %err, "report refresh failed");
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FreshnessCache, ManualClock, MemoryStore, DEFAULT_TTL};
    use crate::extract::ExtractorConfig;
    use crate::source::FetchError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct StaticSource {
        payload: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl CsvSource for StaticSource {
        async fn fetch(&self) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payload
                .map(str::to_string)
                .ok_or_else(|| FetchError::InvalidUrl {
                    value: "static".to_string(),
                    reason: "no payload".to_string(),
                })
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<Report>>,
    }

    impl ReportSink for RecordingSink {
        fn publish(&self, report: &Report) -> Result<(), SinkError> {
            self.published
                .lock()
                .expect("sink mutex poisoned")
                .push(report.clone());
            Ok(())
        }
    }

    fn loader(
        payload: Option<&'static str>,
    ) -> ReportLoader<StaticSource, MemoryStore, ManualClock> {
        let cache = FreshnessCache::with_clock(
            MemoryStore::new(),
            ManualClock::new(0),
            "refresh-test",
            DEFAULT_TTL,
        );
        ReportLoader::new(
            StaticSource {
                payload,
                calls: AtomicUsize::new(0),
            },
            cache,
            ExtractorConfig::marker_preset(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_every_cycle_and_reuses_cache() {
        let loader = loader(Some("Summary,Total Active Job Openings,77\n"));
        let sink = RecordingSink::default();

        let stats = run_refresh_loop(
            &loader,
            &sink,
            RefreshSchedule::every(Duration::from_secs(300)).limited(3),
            std::future::pending(),
        )
        .await;

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.published, 3);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(loader.source().calls.load(Ordering::SeqCst), 1);
        let published = sink.published.lock().expect("sink mutex poisoned");
        assert!(published.iter().all(|report| report.summary.total_jobs == 77));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycles_do_not_stop_the_loop() {
        let loader = loader(None);
        let sink = RecordingSink::default();

        let stats = run_refresh_loop(
            &loader,
            &sink,
            RefreshSchedule::every(Duration::from_secs(60)).limited(4),
            std::future::pending(),
        )
        .await;

        assert_eq!(stats.cycles, 4);
        assert_eq!(stats.failures, 4);
        assert_eq!(stats.published, 0);
        assert_eq!(loader.source().calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_future_ends_the_loop() {
        let loader = loader(Some("Summary,Total Active Job Openings,1\n"));
        let sink = RecordingSink::default();

        let stats = run_refresh_loop(
            &loader,
            &sink,
            RefreshSchedule::every(Duration::from_secs(60)),
            std::future::ready(()),
        )
        .await;

        assert_eq!(stats.cycles, 0);
        assert!(sink.published.lock().expect("sink mutex poisoned").is_empty());
    }

    /// Epoch clock that follows tokio's (pausable) time.
    #[derive(Clone, Copy)]
    struct TokioClock {
        started: tokio::time::Instant,
    }

    impl Clock for TokioClock {
        fn now_millis(&self) -> i64 {
            1_700_000_000_000 + self.started.elapsed().as_millis() as i64
        }
    }

    struct SlowSource {
        latency: Duration,
        calls: AtomicUsize,
    }

    impl CsvSource for SlowSource {
        async fn fetch(&self) -> Result<String, FetchError> {
            tokio::time::sleep(self.latency).await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("Summary,Total Active Job Openings,5\n".to_string())
        }

        fn describe(&self) -> String {
            "slow".to_string()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn period_matching_ttl_fetches_every_cycle() {
        let clock = TokioClock {
            started: tokio::time::Instant::now(),
        };
        let cache = FreshnessCache::with_clock(MemoryStore::new(), clock, "hourly", DEFAULT_TTL);
        let loader = ReportLoader::new(
            SlowSource {
                latency: Duration::from_secs(2),
                calls: AtomicUsize::new(0),
            },
            cache,
            ExtractorConfig::marker_preset(),
        );
        let sink = RecordingSink::default();

        let stats = run_refresh_loop(
            &loader,
            &sink,
            RefreshSchedule::every(DEFAULT_TTL).limited(4),
            std::future::pending(),
        )
        .await;

        assert_eq!(stats.cycles, 4);
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.published, 4);
        assert_eq!(loader.source().calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn json_sink_writes_camel_case_report() {
        let dir = tempdir().expect("tempdir");
        let sink = JsonFileSink::new(dir.path().join("public").join("report-data.json"));
        let mut report = Report::default();
        report.summary.regional_jobs = 913;

        sink.publish(&report).expect("publish");

        let raw = std::fs::read_to_string(sink.path()).expect("read output");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["summary"]["regionalJobs"], 913);
        assert!(!sink.path().with_extension("json.tmp").exists());
    }
}
