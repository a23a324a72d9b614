use crate::cache::{DEFAULT_CACHE_KEY, DEFAULT_TTL};
use crate::extract::{AddressingKind, ExtractorConfig, LayoutError, DEFAULT_MAX_ENTRIES};
use crate::source::{sheet_export_url, FetchError, SourceSpec};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the widget feed.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub report: ReportConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let source = resolve_source()?;
        let fetch_timeout = env_opt("REPORT_FETCH_TIMEOUT_SECS")
            .map(|raw| parse_positive::<u64>("REPORT_FETCH_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let defaults = ReportConfig::default();
        let ttl = match env_opt("REPORT_TTL_MS") {
            Some(raw) => Duration::from_millis(parse_positive("REPORT_TTL_MS", &raw)?),
            None => defaults.ttl,
        };
        let max_entries = match env_opt("REPORT_MAX_ENTRIES") {
            Some(raw) => parse_positive("REPORT_MAX_ENTRIES", &raw)?,
            None => defaults.max_entries,
        };
        let addressing = match env_opt("REPORT_ADDRESSING") {
            Some(raw) => raw.parse::<AddressingKind>().map_err(ConfigError::Layout)?,
            None => defaults.addressing,
        };
        let refresh_every = match env_opt("REPORT_REFRESH_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("REPORT_REFRESH_SECS", &raw)?),
            None => defaults.refresh_every,
        };

        Ok(Self {
            environment,
            report: ReportConfig {
                source,
                fetch_timeout,
                ttl,
                max_entries,
                addressing,
                layout_file: env_opt("REPORT_LAYOUT_FILE").map(PathBuf::from),
                cache_dir: env_opt("REPORT_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.cache_dir),
                cache_key: env_opt("REPORT_CACHE_KEY").unwrap_or(defaults.cache_key),
                refresh_every,
                output: env_opt("REPORT_OUTPUT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.output),
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn env_opt(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses a whole number that must be greater than zero.
fn parse_positive<T: FromStr + Default + PartialEq>(
    var: &'static str,
    raw: &str,
) -> Result<T, ConfigError> {
    let invalid = || ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    };
    let value = raw.trim().parse::<T>().map_err(|_| invalid())?;
    if value == T::default() {
        return Err(invalid());
    }
    Ok(value)
}

/// `REPORT_SOURCE` wins; otherwise a published sheet id (plus optional tab
/// gid) is turned into its CSV export URL.
fn resolve_source() -> Result<Option<SourceSpec>, ConfigError> {
    if let Some(raw) = env_opt("REPORT_SOURCE") {
        let spec = raw
            .parse::<SourceSpec>()
            .map_err(|source| ConfigError::InvalidSource { source })?;
        return Ok(Some(spec));
    }
    let Some(sheet_id) = env_opt("REPORT_SHEET_ID") else {
        return Ok(None);
    };
    let gid = env_opt("REPORT_SHEET_GID");
    let url = sheet_export_url(&sheet_id, gid.as_deref())
        .map_err(|source| ConfigError::InvalidSource { source })?;
    Ok(Some(SourceSpec::Url(url)))
}

/// Where the report comes from, how long it stays fresh and where it goes.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub source: Option<SourceSpec>,
    pub fetch_timeout: Option<Duration>,
    pub ttl: Duration,
    pub max_entries: usize,
    pub addressing: AddressingKind,
    pub layout_file: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub cache_key: String,
    pub refresh_every: Duration,
    pub output: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source: None,
            fetch_timeout: None,
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
            addressing: AddressingKind::Marker,
            layout_file: None,
            cache_dir: PathBuf::from(".report-cache"),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            refresh_every: DEFAULT_TTL,
            output: PathBuf::from("report-data.json"),
        }
    }
}

impl ReportConfig {
    /// A layout file is used as-is; otherwise the preset for the configured
    /// addressing mode is capped at `max_entries`.
    pub fn extractor_config(&self) -> Result<ExtractorConfig, ConfigError> {
        match &self.layout_file {
            Some(path) => ExtractorConfig::from_path(path).map_err(ConfigError::Layout),
            None => Ok(ExtractorConfig::preset(self.addressing).with_max_entries(self.max_entries)),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { var: &'static str, value: String },
    InvalidSource { source: FetchError },
    Layout(LayoutError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} must be a positive whole number (got '{value}')")
            }
            ConfigError::InvalidSource { source } => write!(
                f,
                "report source must be an http(s) URL, a file path or a sheet id: {source}"
            ),
            ConfigError::Layout(err) => write!(f, "report layout error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidSource { source } => Some(source),
            ConfigError::Layout(err) => Some(err),
        }
    }
}
