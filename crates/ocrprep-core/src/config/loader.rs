//! Configuration loader for YAML files and environment overrides

use crate::config::types::OcrPrepConfig;
use crate::errors::BootstrapError;
use crate::locale::Locale;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "ocrprep.yaml";

pub const ENV_PYTHON: &str = "OCRPREP_PYTHON";
pub const ENV_LOCALE: &str = "OCRPREP_LOCALE";
pub const ENV_ENV_DIR: &str = "OCRPREP_ENV_DIR";
pub const ENV_MODELS_DIR: &str = "OCRPREP_MODELS_DIR";
pub const ENV_PIP_INDEX_URL: &str = "OCRPREP_PIP_INDEX_URL";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<OcrPrepConfig, BootstrapError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            BootstrapError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string, then apply environment overrides
    pub fn from_str(content: &str) -> Result<OcrPrepConfig, BootstrapError> {
        let mut config: OcrPrepConfig = if content.trim().is_empty() {
            OcrPrepConfig::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| BootstrapError::Config(format!("Failed to parse YAML config: {}", e)))?
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicitly requested file, or the default file in `workdir` when present.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub async fn load_or_default(
        explicit: Option<&Path>,
        workdir: &Path,
    ) -> Result<(OcrPrepConfig, Option<PathBuf>), BootstrapError> {
        if let Some(path) = explicit {
            log::info!("Loading configuration from file: {}", path.display());
            return Ok((Self::from_file(path).await?, Some(path.to_path_buf())));
        }

        let default_path = workdir.join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            log::info!("Loading configuration from file: {}", default_path.display());
            let config = Self::from_file(&default_path).await?;
            Ok((config, Some(default_path)))
        } else {
            log::debug!("No {} in {}, using defaults", DEFAULT_CONFIG_FILE, workdir.display());
            Ok((Self::from_str("")?, None))
        }
    }

    pub fn apply_env_overrides(config: &mut OcrPrepConfig) -> Result<(), BootstrapError> {
        Self::apply_overrides_from(config, |key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup; empty values are ignored
    pub fn apply_overrides_from<F>(config: &mut OcrPrepConfig, lookup: F) -> Result<(), BootstrapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(python) = get(ENV_PYTHON) {
            log::debug!("{} overrides interpreter: {}", ENV_PYTHON, python);
            config.interpreter = python;
        }
        if let Some(locale) = get(ENV_LOCALE) {
            config.locale = locale.parse::<Locale>()?;
        }
        if let Some(env_dir) = get(ENV_ENV_DIR) {
            config.paths.env_dir = PathBuf::from(env_dir);
        }
        if let Some(models_dir) = get(ENV_MODELS_DIR) {
            config.paths.models_dir = PathBuf::from(models_dir);
        }
        if let Some(index_url) = get(ENV_PIP_INDEX_URL) {
            config.runtime.accelerated.index_url = index_url;
        }
        Ok(())
    }
}
