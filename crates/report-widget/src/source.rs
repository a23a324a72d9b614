//! Transport collaborators that hand CSV text to the loader.

use reqwest::{Client, Url};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Supplies the raw CSV payload. Fetching is the only suspension point in a
/// load cycle.
pub trait CsvSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send;

    fn describe(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid source url '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },
}

/// Published spreadsheet export fetched over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: Url, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

impl CsvSource for HttpSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// CSV export already on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CsvSource for FileSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.display().to_string(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Where the report comes from, as written in configuration: an
/// `http(s)://` URL or a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Url(Url),
    Path(PathBuf),
}

impl FromStr for SourceSpec {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|err| FetchError::InvalidUrl {
                value: trimmed.to_string(),
                reason: err.to_string(),
            })?;
            return Ok(Self::Url(url));
        }
        if trimmed.is_empty() {
            return Err(FetchError::InvalidUrl {
                value: value.to_string(),
                reason: "empty source".to_string(),
            });
        }
        Ok(Self::Path(PathBuf::from(trimmed)))
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Url(url) => write!(f, "{url}"),
            SourceSpec::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Either source, chosen at runtime from a [`SourceSpec`].
#[derive(Debug, Clone)]
pub enum ReportSource {
    Http(HttpSource),
    File(FileSource),
}

impl ReportSource {
    pub fn from_spec(spec: &SourceSpec, timeout: Option<Duration>) -> Result<Self, FetchError> {
        match spec {
            SourceSpec::Url(url) => Ok(Self::Http(HttpSource::new(url.clone(), timeout)?)),
            SourceSpec::Path(path) => Ok(Self::File(FileSource::new(path.clone()))),
        }
    }
}

impl CsvSource for ReportSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        match self {
            ReportSource::Http(source) => source.fetch().await,
            ReportSource::File(source) => source.fetch().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            ReportSource::Http(source) => source.describe(),
            ReportSource::File(source) => source.describe(),
        }
    }
}

/// CSV export URL of one tab of a published Google Sheet.
pub fn sheet_export_url(sheet_id: &str, gid: Option<&str>) -> Result<Url, FetchError> {
    let raw = format!(
        "https://docs.google.com/spreadsheets/d/{}/export",
        sheet_id.trim()
    );
    let mut url = Url::parse(&raw).map_err(|err| FetchError::InvalidUrl {
        value: raw.clone(),
        reason: err.to_string(),
    })?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("format", "csv");
        if let Some(gid) = gid {
            query.append_pair("gid", gid.trim());
        }
    }
    Ok(url)
}
