use crate::cache::{CacheStore, Clock, FreshnessCache, SystemClock};
use crate::extract::{extract, ExtractorConfig};
use crate::report::Report;
use crate::source::{CsvSource, FetchError};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Fresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub report: Report,
    pub origin: Origin,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("report source unavailable: {0}")]
    Transport(#[from] FetchError),
}

/// One request/response cycle: consult the cache, otherwise fetch, extract
/// and store.
pub struct ReportLoader<Src, S, C = SystemClock> {
    source: Src,
    cache: FreshnessCache<S, C>,
    config: ExtractorConfig,
}

impl<Src, S, C> ReportLoader<Src, S, C>
where
    Src: CsvSource,
    S: CacheStore,
    C: Clock,
{
    pub fn new(source: Src, cache: FreshnessCache<S, C>, config: ExtractorConfig) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &FreshnessCache<S, C> {
        &self.cache
    }

    pub fn source(&self) -> &Src {
        &self.source
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub async fn load(&self) -> Result<Loaded, LoadError> {
        if let Some(report) = self.cache.get() {
            debug!(source = %self.source.describe(), "serving report from cache");
            return Ok(Loaded {
                report,
                origin: Origin::Cache,
            });
        }
        self.refresh().await
    }

    /// Skips the cache read but still stores the new report. A failed fetch
    /// leaves the cached entry as it was.
    pub async fn refresh(&self) -> Result<Loaded, LoadError> {
        let payload = self.source.fetch().await?;
        let report = extract(&payload, &self.config);
        self.cache.put(&report);

        info!(
            source = %self.source.describe(),
            bytes = payload.len(),
            total_jobs = report.summary.total_jobs,
            "loaded fresh report"
        );

        Ok(Loaded {
            report,
            origin: Origin::Fresh,
        })
    }
}
