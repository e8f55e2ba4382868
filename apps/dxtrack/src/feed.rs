//! # Survey feed
//!
//! Source of raw survey submissions. The HTTP client keeps a copy of the
//! last successful response on disk and serves that copy whenever the remote
//! endpoint cannot be reached.

use async_trait::async_trait;
use dxtrack_core::submission::{FeedPage, RawSubmission};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned status {0}")]
    Status(u16),
    #[error("feed snapshot unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feed unavailable and no snapshot to fall back on")]
    Unavailable,
}

#[async_trait]
pub trait SubmissionSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawSubmission>, FeedError>;
}

/// Fixed list of submissions, used when no remote feed is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    records: Vec<RawSubmission>,
}

impl StaticFeed {
    pub fn new(records: Vec<RawSubmission>) -> Self {
        Self { records }
    }

    /// Records of the snapshot file at `path`, or none if it does not exist.
    pub fn from_snapshot(path: &Path) -> Result<Self, FeedError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(Self::new(read_snapshot(path)?))
    }
}

#[async_trait]
impl SubmissionSource for StaticFeed {
    async fn fetch(&self) -> Result<Vec<RawSubmission>, FeedError> {
        Ok(self.records.clone())
    }
}

/// Remote survey endpoint queried with `apikey`, `SchemaId` and `Locale`.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
    api_key: String,
    schema_id: String,
    snapshot: Option<PathBuf>,
}

impl HttpFeed {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        schema_id: impl Into<String>,
    ) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            schema_id: schema_id.into(),
            snapshot: None,
        })
    }

    /// Keep the last good response at `path`.
    #[must_use]
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    async fn fetch_remote(&self) -> Result<FeedPage, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("SchemaId", self.schema_id.as_str()),
                ("Locale", "default"),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    fn store_snapshot(&self, page: &FeedPage) {
        let Some(path) = &self.snapshot else {
            return;
        };
        let written = serde_json::to_vec_pretty(page)
            .map_err(FeedError::from)
            .and_then(|bytes| std::fs::write(path, bytes).map_err(FeedError::from));
        if let Err(error) = written {
            warn!(path = %path.display(), %error, "could not write feed snapshot");
        }
    }
}

#[async_trait]
impl SubmissionSource for HttpFeed {
    async fn fetch(&self) -> Result<Vec<RawSubmission>, FeedError> {
        match self.fetch_remote().await {
            Ok(page) => {
                debug!(records = page.results.len(), "feed fetched");
                self.store_snapshot(&page);
                Ok(page.results)
            }
            Err(error) => {
                warn!(%error, "feed fetch failed, falling back to snapshot");
                match &self.snapshot {
                    Some(path) if path.exists() => read_snapshot(path),
                    _ => Err(FeedError::Unavailable),
                }
            }
        }
    }
}

fn read_snapshot(path: &Path) -> Result<Vec<RawSubmission>, FeedError> {
    let text = std::fs::read_to_string(path)?;
    let page: FeedPage = serde_json::from_str(&text)?;
    Ok(page.results)
}
