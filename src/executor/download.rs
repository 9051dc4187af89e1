use crate::debug;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::{path::Path, time::Duration};

/// Outcome of a download attempt
#[derive(Debug, PartialEq, Eq)]
pub enum Fetched {
    /// The file is on disk, either downloaded now or cached before
    Ready,
    /// The server answered 404
    NotFound,
}

pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to set up HTTP client")?;
        Ok(Downloader { client })
    }

    /// Download `url` to `path` unless `path` already exists.
    ///
    /// A 404 is reported as [`Fetched::NotFound`], every other failure is an error.
    pub async fn fetch_if_missing(&self, url: &str, path: &Path) -> Result<Fetched> {
        if path.is_file() {
            debug!("File '{}' is cached. Not downloading.", path.display());
            return Ok(Fetched::Ready);
        }

        debug!("Downloading '{}' to '{}'", url, path.display());
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context(format!("Failed to fetch {}", url))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Fetched::NotFound);
        }
        let bytes = resp
            .error_for_status()
            .context(format!("Failed to fetch {}", url))?
            .bytes()
            .await
            .context(format!("Failed to fetch {}", url))?;

        // Only complete files may end up at `path`, it doubles as the cache
        let part = path.with_extension("part");
        if let Err(e) = store(&part, path, &bytes).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
        Ok(Fetched::Ready)
    }
}

async fn store(part: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(part, bytes)
        .await
        .context(format!("Failed to write {}", part.display()))?;
    tokio::fs::rename(part, path)
        .await
        .context(format!("Failed to move {} into place", part.display()))?;
    Ok(())
}
