use crate::cache::StoreError;
use crate::config::ConfigError;
use crate::extract::LayoutError;
use crate::loader::LoadError;
use crate::refresh::SinkError;
use crate::source::FetchError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Layout(LayoutError),
    Source(FetchError),
    Load(LoadError),
    Publish(SinkError),
    Cache(StoreError),
    MissingSource,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Layout(err) => write!(f, "layout error: {}", err),
            AppError::Source(err) => write!(f, "source error: {}", err),
            AppError::Load(err) => write!(f, "no report available: {}", err),
            AppError::Publish(err) => write!(f, "publish error: {}", err),
            AppError::Cache(err) => write!(f, "cache error: {}", err),
            AppError::MissingSource => write!(
                f,
                "no report source configured; set REPORT_SOURCE or pass --source"
            ),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Layout(err) => Some(err),
            AppError::Source(err) => Some(err),
            AppError::Load(err) => Some(err),
            AppError::Publish(err) => Some(err),
            AppError::Cache(err) => Some(err),
            AppError::MissingSource => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<LayoutError> for AppError {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

impl From<FetchError> for AppError {
    fn from(value: FetchError) -> Self {
        Self::Source(value)
    }
}

impl From<LoadError> for AppError {
    fn from(value: LoadError) -> Self {
        Self::Load(value)
    }
}

impl From<SinkError> for AppError {
    fn from(value: SinkError) -> Self {
        Self::Publish(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Cache(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Publish(SinkError::Json(value))
    }
}
