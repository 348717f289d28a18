//! HTTP client for the ModelScope model repository

use futures_util::StreamExt;
use reqwest::{header, Client, StatusCode, Url};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::ModelsConfig;
use crate::errors::DownloadError;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ModelScopeClient {
    client: Client,
    api_base: String,
    repository: String,
    revision: String,
    timeout: Duration,
}

impl ModelScopeClient {
    pub fn new(config: &ModelsConfig) -> Result<Self, DownloadError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        // Weight files run to several gigabytes, so there is no overall
        // timeout; a stalled read fails the attempt instead
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            revision: config.revision.clone(),
            timeout,
        })
    }

    pub fn files_url(&self) -> String {
        format!("{}/{}/repo/files", self.api_base, self.repository)
    }

    /// Query values are percent-encoded, so names may contain `&`, `#` or `+`
    pub fn file_url(&self, path: &str) -> Result<Url, DownloadError> {
        let base = format!("{}/{}/repo", self.api_base, self.repository);
        Url::parse_with_params(
            &base,
            &[("Revision", self.revision.as_str()), ("FilePath", path)],
        )
        .map_err(|e| DownloadError::Network(format!("Invalid download URL {}: {}", base, e)))
    }

    /// Ask the repository API for its file list
    pub async fn list_files(&self) -> Result<Vec<String>, DownloadError> {
        let url = self.files_url();
        let response = self.client.get(&url).timeout(self.timeout).send().await?;

        if response.status() != StatusCode::OK {
            return Err(DownloadError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let body: Value = response.json().await?;
        parse_file_list(&body).ok_or_else(|| {
            DownloadError::Network(format!("Unexpected file list format from {}", url))
        })
    }

    /// List files, falling back to `fallback` when the API is unusable
    pub async fn files_or_fallback(&self, fallback: &[String]) -> Vec<String> {
        match self.list_files().await {
            Ok(files) if !files.is_empty() => files,
            Ok(_) => {
                log::warn!("Repository API returned no files, using the built-in file list");
                fallback.to_vec()
            }
            Err(e) => {
                log::warn!("Could not fetch the file list ({}), using the built-in file list", e);
                fallback.to_vec()
            }
        }
    }

    /// Download `url` to `dest`, resuming from `<dest>.part` when present.
    ///
    /// Returns the final size in bytes.
    pub async fn download_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let part = part_path(dest);
        let mut offset = match fs::metadata(&part).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        let mut request = self.client.get(url);
        if offset > 0 {
            log::info!("Resuming {} from byte {}", display_name(dest), offset);
            request = request.header(header::RANGE, format!("bytes={}-", offset));
        }
        let mut response = request.send().await?;

        // Range not satisfiable, or the server ignored it: start over
        let status = response.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE || (status == StatusCode::OK && offset > 0) {
            log::info!("Server did not honour the range request, restarting {}", display_name(dest));
            offset = 0;
            response = self.client.get(url).send().await?;
        }

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            return Err(DownloadError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let append = offset > 0 && status == StatusCode::PARTIAL_CONTENT;
        if !append {
            offset = 0;
        }
        let total = response.content_length().unwrap_or(0) + offset;

        let mut file = if append {
            OpenOptions::new().append(true).open(&part).await?
        } else {
            File::create(&part).await?
        };

        let mut progress = Progress::new(display_name(dest), offset, total);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            progress.advance(chunk.len() as u64);
        }
        file.flush().await?;
        drop(file);

        let actual = fs::metadata(&part).await?.len();
        if total > 0 && actual != total {
            return Err(DownloadError::SizeMismatch {
                file: display_name(dest),
                expected: total,
                actual,
            });
        }

        fs::rename(&part, dest).await?;
        progress.finish();
        Ok(actual)
    }
}

/// Accepts `{"Data": [{"Path": ..}]}` and `{"Data": {"Files": [{"Path": ..}]}}`
fn parse_file_list(body: &Value) -> Option<Vec<String>> {
    let data = body.get("Data")?;
    let entries = match data {
        Value::Array(items) => items,
        Value::Object(_) => data.get("Files")?.as_array()?,
        _ => return None,
    };

    Some(
        entries
            .iter()
            .filter(|entry| entry.get("Type").and_then(Value::as_str) != Some("tree"))
            .filter_map(|entry| entry.get("Path").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
    )
}

pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

struct Progress {
    name: String,
    done: u64,
    total: u64,
    started: Instant,
    resumed_at: u64,
    last_report: Instant,
}

impl Progress {
    fn new(name: String, done: u64, total: u64) -> Self {
        let now = Instant::now();
        Self {
            name,
            done,
            total,
            started: now,
            resumed_at: done,
            last_report: now,
        }
    }

    fn advance(&mut self, bytes: u64) {
        self.done += bytes;
        if self.last_report.elapsed() < PROGRESS_INTERVAL {
            return;
        }
        self.last_report = Instant::now();

        let elapsed = self.started.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            (self.done - self.resumed_at) as f64 / elapsed
        } else {
            0.0
        };

        if self.total > 0 {
            let percent = self.done as f64 / self.total as f64 * 100.0;
            log::info!(
                "{}: {:.1}% ({} / {}, {}/s)",
                self.name,
                percent,
                human_bytes(self.done),
                human_bytes(self.total),
                human_bytes(speed as u64)
            );
        } else {
            log::info!("{}: {} ({}/s)", self.name, human_bytes(self.done), human_bytes(speed as u64));
        }
    }

    fn finish(&self) {
        log::info!(
            "{}: {} in {:.1}s",
            self.name,
            human_bytes(self.done),
            self.started.elapsed().as_secs_f64()
        );
    }
}

pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
