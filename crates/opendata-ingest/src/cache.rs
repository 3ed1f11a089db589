//! Content-addressed archive cache
//!
//! Every archive is stored at `<dir>/<sha256(url)>`. A file at that path is
//! only ever created by renaming a fully downloaded `<hash>.tmp` file, so its
//! presence means the archive is complete and the URL is never fetched again.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use opendata_common::checksum::{compute_file_checksum, sha256_hex};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn, Level};

/// Outcome of acquiring one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Already present from an earlier run; no request was made
    Cached,
    /// Fetched during this run
    Downloaded,
    /// Could not be fetched; nothing was written at the cache path
    Unavailable { reason: String },
}

/// A remote archive and where it lives locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub remote_url: String,
    pub local_path: PathBuf,
    pub status: CacheStatus,
}

impl ArchiveRecord {
    pub fn is_available(&self) -> bool {
        !matches!(self.status, CacheStatus::Unavailable { .. })
    }
}

/// Cache path of a URL: the directory joined with the URL's SHA-256 hex digest
pub fn cache_path_for_url(dir: &Path, url: &str) -> PathBuf {
    dir.join(sha256_hex(url))
}

fn temp_path(local_path: &Path) -> PathBuf {
    let mut name = local_path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Downloads archives into a directory, at most once per URL
pub struct ContentCache {
    dir: PathBuf,
    client: Client,
    concurrency: usize,
    max_retries: u32,
}

impl ContentCache {
    pub fn new(dir: impl Into<PathBuf>, client: Client, config: &IngestConfig) -> Self {
        Self {
            dir: dir.into(),
            client,
            concurrency: config.concurrency.max(1),
            max_retries: config.max_retries.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Acquire every URL, with at most `concurrency` downloads in flight.
    ///
    /// One record is returned per input URL; the order is not preserved.
    pub async fn acquire_all(&self, urls: &[String]) -> Vec<ArchiveRecord> {
        let progress = ProgressBar::new(urls.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} archives {msg}")
        {
            progress.set_style(style);
        }

        let records: Vec<ArchiveRecord> = stream::iter(urls)
            .map(|url| {
                let progress = progress.clone();
                async move {
                    let record = self.acquire(url).await;
                    progress.inc(1);
                    record
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        progress.finish_and_clear();

        let downloaded = records
            .iter()
            .filter(|r| r.status == CacheStatus::Downloaded)
            .count();
        let unavailable = records.iter().filter(|r| !r.is_available()).count();
        info!(
            total = records.len(),
            cached = records.len() - downloaded - unavailable,
            downloaded,
            unavailable,
            "Archive acquisition complete"
        );

        records
    }

    /// Ensure one archive is present locally
    pub async fn acquire(&self, url: &str) -> ArchiveRecord {
        let local_path = cache_path_for_url(&self.dir, url);

        let status = if tokio::fs::try_exists(&local_path).await.unwrap_or(false) {
            debug!(%url, path = %local_path.display(), "Archive already cached");
            CacheStatus::Cached
        } else {
            match self.download_with_retry(url, &local_path).await {
                Ok(()) => CacheStatus::Downloaded,
                Err(e) => {
                    warn!(%url, error = %e, "Archive unavailable");
                    CacheStatus::Unavailable {
                        reason: e.to_string(),
                    }
                },
            }
        };

        ArchiveRecord {
            remote_url: url.to_string(),
            local_path,
            status,
        }
    }

    async fn download_with_retry(&self, url: &str, local_path: &Path) -> Result<()> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.download(url, local_path).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    warn!(
                        %url,
                        error = %e,
                        "Download attempt {}/{} failed",
                        attempt,
                        self.max_retries
                    );
                    // Exponential backoff: 2^attempt seconds
                    let backoff_secs = 2u64.pow(attempt);
                    info!("Retrying in {} seconds...", backoff_secs);
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Stream one archive to `<hash>.tmp`, then move it into place
    async fn download(&self, url: &str, local_path: &Path) -> Result<()> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), body = %body.trim(), "Unexpected download status");
            return Err(IngestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp_path = temp_path(local_path);

        info!(%url, path = %local_path.display(), "Started downloading");
        if let Err(e) = stream_to_file(response, &tmp_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        tokio::fs::rename(&tmp_path, local_path).await?;
        info!(%url, "Finished downloading");

        if tracing::enabled!(Level::DEBUG) {
            let path = local_path.to_path_buf();
            match tokio::task::spawn_blocking(move || compute_file_checksum(path)).await {
                Ok(Ok(checksum)) => debug!(%url, sha256 = %checksum, "Archive checksum"),
                Ok(Err(e)) => debug!(%url, error = %e, "Could not checksum archive"),
                Err(e) => debug!(%url, error = %e, "Checksum task failed"),
            }
        }

        Ok(())
    }
}

async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?).await?;
    }

    file.flush().await?;
    Ok(())
}
