//! Streaming HTTP download into a local file
//!
//! The body is written chunk by chunk and hashed as it is persisted, so the
//! returned digest always covers exactly the bytes on disk. Timeouts are
//! reported as [`NetworkError::Timeout`] and never retried.

use crate::config::DownloadConfig;
use crate::error::{Error, NetworkError, Result};
use crate::hashing::{CHUNK_SIZE, StreamingHasher, digests_match};
use crate::types::DownloadRequest;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Tracks bytes received against an optional declared length
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProgressTracker {
    total: Option<u64>,
    received: u64,
}

impl ProgressTracker {
    pub(crate) fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|&t| t > 0),
            received: 0,
        }
    }

    /// Record `n` more bytes; returns the new percentage if the length is known
    pub(crate) fn advance(&mut self, n: u64) -> Option<u8> {
        self.received = self.received.saturating_add(n);
        let total = self.total?;
        let percent = self.received.saturating_mul(100) / total;
        Some(percent.min(100) as u8)
    }

    pub(crate) fn received(&self) -> u64 {
        self.received
    }
}

/// HTTP downloader with connect and per-read timeouts
#[derive(Clone, Debug)]
pub struct Downloader {
    client: reqwest::Client,
    read_timeout: Duration,
    allow_http: bool,
}

impl Downloader {
    /// Build a downloader from configuration
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            read_timeout: config.read_timeout,
            allow_http: config.allow_http,
        })
    }

    /// Download `request.url` into `request.destination` and check its digest
    ///
    /// When an expected digest is supplied and differs from the computed one,
    /// the destination file is deleted and [`Error::IntegrityMismatch`] is
    /// returned.
    pub async fn fetch<F>(&self, request: &DownloadRequest, on_progress: F) -> Result<String>
    where
        F: FnMut(u8),
    {
        let digest = self
            .download(&request.url, &request.destination, on_progress)
            .await?;

        if let Some(expected) = &request.expected_digest
            && !digests_match(expected, &digest)
        {
            warn!(url = %request.url, expected = %expected, actual = %digest, "digest mismatch");
            remove_if_exists(&request.destination).await?;
            return Err(Error::IntegrityMismatch {
                expected: expected.to_ascii_lowercase(),
                actual: digest,
            });
        }

        Ok(digest)
    }

    /// Download `url` into `destination` and return the SHA-256 of the written bytes
    ///
    /// `on_progress` receives `floor(bytes * 100 / total)` after every
    /// written chunk when the response declares a length, and is never
    /// called otherwise. A non-success status fails before `destination` is created.
    /// A partially written file is left for the caller to remove.
    pub async fn download<F>(&self, url: &str, destination: &Path, mut on_progress: F) -> Result<String>
    where
        F: FnMut(u8),
    {
        self.check_url(url)?;
        debug!(url, destination = %destination.display(), "starting download");

        let mut response = tokio::time::timeout(self.read_timeout, self.client.get(url).send())
            .await
            .map_err(|_| {
                NetworkError::Timeout(format!(
                    "no response within {}s",
                    self.read_timeout.as_secs_f32()
                ))
            })??;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "download rejected by server");
            return Err(NetworkError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let mut tracker = ProgressTracker::new(response.content_length());
        let mut hasher = StreamingHasher::new();
        let mut file = tokio::fs::File::create(destination).await?;

        loop {
            let chunk = tokio::time::timeout(self.read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    NetworkError::Timeout(format!(
                        "no data within {}s after {} bytes",
                        self.read_timeout.as_secs_f32(),
                        tracker.received()
                    ))
                })??;
            let Some(chunk) = chunk else {
                break;
            };

            for piece in chunk.chunks(CHUNK_SIZE) {
                file.write_all(piece).await?;
                hasher.update(piece);
                if let Some(progress) = tracker.advance(piece.len() as u64) {
                    on_progress(progress);
                }
            }
        }

        file.flush().await?;
        file.sync_all().await?;

        let digest = hasher.finalize_hex();
        info!(url, bytes = tracker.received(), digest = %digest, "download complete");
        Ok(digest)
    }

    fn check_url(&self, url: &str) -> Result<()> {
        let parsed =
            url::Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;
        match parsed.scheme() {
            "https" => Ok(()),
            "http" if self.allow_http => Ok(()),
            scheme => Err(NetworkError::InvalidUrl(format!("scheme '{scheme}' not allowed")).into()),
        }
    }
}

/// Remove a file, treating "already gone" as success
pub(crate) async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
