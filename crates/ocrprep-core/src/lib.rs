//! Core library for preparing a local DeepSeek-OCR workspace
//!
//! Checks for a Python interpreter, creates a virtual environment, installs
//! the numeric runtime and the remaining requirements with pip, and fetches
//! the model files. All of the heavy lifting is done by external tools; this
//! crate sequences them and decides which failures are fatal.

pub mod bootstrap;
pub mod config;
pub mod downloader;
pub mod environment;
pub mod errors;
pub mod installation;
pub mod locale;
pub mod models;
pub mod process;

#[cfg(test)]
pub mod test_utils;

pub use bootstrap::{Bootstrap, BootstrapReport, Console, Stage, StageStatus, StdoutConsole};
pub use config::{ConfigLoader, OcrPrepConfig, ResolvedPaths};
pub use errors::{BootstrapError, BootstrapResult, DownloadError, FailureTier};
pub use locale::Locale;
pub use process::{CommandRunner, SystemCommandRunner};
