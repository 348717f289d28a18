//! Configuration module
//!
//! Optional `ocrprep.yaml` plus `OCRPREP_*` environment overrides.

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE};
pub use types::*;
