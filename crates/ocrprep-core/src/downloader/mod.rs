//! Built-in model downloader
//!
//! Fetches every file of the model repository into the models directory,
//! one file at a time. Files already present are skipped, partial downloads
//! are resumed, and each file gets a bounded number of attempts with
//! exponential backoff between them.

pub mod client;


pub use client::{human_bytes, ModelScopeClient};

use std::path::{Component, Path};
use std::time::Duration;

use crate::config::ModelsConfig;
use crate::errors::DownloadError;

/// Outcome of a full download pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub total: usize,
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl DownloadSummary {
    pub fn succeeded(&self) -> usize {
        self.downloaded.len() + self.skipped.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ModelDownloader {
    client: ModelScopeClient,
    fallback_files: Vec<String>,
    max_retries: u32,
    retry_base: Duration,
}

impl ModelDownloader {
    pub fn from_config(config: &ModelsConfig) -> Result<Self, DownloadError> {
        Ok(Self {
            client: ModelScopeClient::new(config)?,
            fallback_files: config.fallback_files.clone(),
            max_retries: config.max_retries.max(1),
            retry_base: Duration::from_secs(1),
        })
    }

    /// Base delay; attempt `n` (0-based) waits `base * 2^n` before retrying
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    pub async fn download_all(&self, models_dir: &Path) -> Result<DownloadSummary, DownloadError> {
        tokio::fs::create_dir_all(models_dir).await?;
        log::info!("Downloading model files into {}", models_dir.display());

        let files = self.client.files_or_fallback(&self.fallback_files).await;
        log::info!("{} files to fetch", files.len());

        let mut summary = DownloadSummary {
            total: files.len(),
            ..Default::default()
        };

        for name in files {
            if !is_safe_relative(&name) {
                log::warn!("Refusing to write outside the models directory: {}", name);
                summary.failed.push(name);
                continue;
            }

            let dest = models_dir.join(&name);
            if dest.is_file() {
                log::info!("{} already exists, skipping", name);
                summary.skipped.push(name);
                continue;
            }

            if self.fetch_with_retries(&name, &dest).await {
                summary.downloaded.push(name);
            } else {
                summary.failed.push(name);
            }
        }

        log::info!(
            "Download finished: {}/{} files",
            summary.succeeded(),
            summary.total
        );
        Ok(summary)
    }

    async fn fetch_with_retries(&self, name: &str, dest: &Path) -> bool {
        let url = match self.client.file_url(name) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Cannot download {}: {}", name, e);
                return false;
            }
        };
        for attempt in 0..self.max_retries {
            match self.client.download_file(url.as_str(), dest).await {
                Ok(bytes) => {
                    log::info!("Downloaded {} ({})", name, human_bytes(bytes));
                    return true;
                }
                Err(e) => {
                    log::warn!(
                        "Download of {} failed (attempt {}/{}): {}",
                        name,
                        attempt + 1,
                        self.max_retries,
                        e
                    );
                    if attempt + 1 < self.max_retries {
                        let delay = self.retry_base * 2u32.saturating_pow(attempt);
                        log::info!("Retrying in {:?}", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        log::error!("Giving up on {}", name);
        false
    }
}

fn is_safe_relative(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
