//! Error types for the bootstrap procedure
//!
//! Every failure the procedure can hit is expressed as a `BootstrapError`.
//! Each variant belongs to one of three tiers: fatal errors abort the run
//! with exit code 1, the accelerated runtime install gets a single fallback
//! attempt, and model download problems only produce a warning.

use std::path::PathBuf;
use thiserror::Error;

/// How the procedure reacts to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureTier {
    /// Print a message, pause, exit 1
    Fatal,
    /// Try one alternate invocation, then continue
    FallbackRetry,
    /// Print guidance and keep going
    WarnAndContinue,
}

#[derive(Error, Debug, Clone)]
pub enum BootstrapError {
    #[error("Python interpreter '{interpreter}' was not found or did not run")]
    InterpreterMissing { interpreter: String },

    #[error("Failed to create virtual environment at {}: {}", .env_dir.display(), describe_code(.code))]
    EnvironmentCreation { env_dir: PathBuf, code: Option<i32> },

    #[error("Installing dependencies from {} failed: {}", .manifest.display(), describe_code(.code))]
    DependencyInstall { manifest: PathBuf, code: Option<i32> },

    #[error("Accelerated runtime install failed: {}", describe_code(.code))]
    AcceleratedRuntimeInstall { code: Option<i32> },

    #[error("Model download incomplete: {reason}")]
    ModelDownload { reason: String },

    #[error("Dependency manifest not found: {}", .path.display())]
    ManifestMissing { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },
}

impl BootstrapError {
    pub fn tier(&self) -> FailureTier {
        match self {
            BootstrapError::AcceleratedRuntimeInstall { .. } => FailureTier::FallbackRetry,
            BootstrapError::ModelDownload { .. } => FailureTier::WarnAndContinue,
            _ => FailureTier::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.tier() == FailureTier::Fatal
    }

    /// Process exit code this error leads to when it ends the run
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            1
        } else {
            0
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated without an exit code".to_string(),
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(err: std::io::Error) -> Self {
        BootstrapError::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for BootstrapError {
    fn from(err: serde_yaml::Error) -> Self {
        BootstrapError::Config(err.to_string())
    }
}

/// Errors raised while fetching model files
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("Size mismatch for {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch { file: String, expected: u64, actual: u64 },
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        DownloadError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Network(err.to_string())
    }
}

impl From<DownloadError> for BootstrapError {
    fn from(err: DownloadError) -> Self {
        BootstrapError::ModelDownload { reason: err.to_string() }
    }
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;
