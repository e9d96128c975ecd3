use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::config::AppConfig;
use crate::models::ProductRecord;
use crate::utils::error::{AppError, Result};

/// Sequential gallery-image fetcher.
///
/// Rewrites each populated image slot of a record in place: to the
/// configured-relative local path on success, to an empty string on
/// any non-200 response or transport failure.
pub struct ImageDownloader {
    http: reqwest::Client,
    image_root: PathBuf,
    relative_root: PathBuf,
}

/// Counts reported back for the run summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub saved: usize,
    pub failed: usize,
}

impl ImageDownloader {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_roots(config.timeout(), config.image_dir(), config.paths.image.clone())
    }

    /// `image_root` is where files land on disk; `relative_root` is
    /// the prefix written back into the record.
    pub fn with_roots(timeout: Duration, image_root: PathBuf, relative_root: PathBuf) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            image_root,
            relative_root,
        })
    }

    /// Fetch every populated image slot of `record`, mutating the
    /// slots in place. Failures degrade the slot and continue.
    pub async fn fetch_all(&self, record: &mut ProductRecord) -> DownloadOutcome {
        let mut outcome = DownloadOutcome::default();

        for slot in 0..record.images.len() {
            let source = record.images[slot].clone();
            if source.is_empty() {
                continue;
            }

            match self.fetch_one(&record.shoe_id, slot + 1, &source).await {
                Ok(relative) => {
                    record.images[slot] = relative.to_string_lossy().into_owned();
                    outcome.saved += 1;
                }
                Err(e) => {
                    warn!(
                        shoe_id = %record.shoe_id,
                        url = %source,
                        error = %e,
                        "image download failed"
                    );
                    record.images[slot] = String::new();
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Stream one image to `{image_root}/{shoe_id}/image{slot}{ext}`
    /// and return the configured-relative path. The per-shoe directory
    /// is created on demand once the response status checks out.
    async fn fetch_one(&self, shoe_id: &str, slot: usize, source: &str) -> Result<PathBuf> {
        let file_name = format!("image{slot}{}", image_extension(source));

        let response = self.http.get(source).send().await?;
        if response.status() != StatusCode::OK {
            return Err(AppError::Download(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let dir = self.image_root.join(shoe_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(&file_name);
        let mut file = tokio::fs::File::create(&path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        debug!(path = %path.display(), "image saved");
        Ok(self.relative_root.join(shoe_id).join(file_name))
    }
}

/// Derive the local file extension from a URL's path component.
/// Anything outside the gallery's known formats falls back to `.jpg`.
pub fn image_extension(source: &str) -> &'static str {
    let path = Url::parse(source)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| source.to_string());

    let extension = Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => ".png",
        Some("jpeg") => ".jpeg",
        _ => ".jpg",
    }
}
