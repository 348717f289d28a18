//! Configuration type definitions
//!
//! Every field carries a serde default so that an empty `ocrprep.yaml`, or
//! no file at all, describes the stock DeepSeek-OCR workspace layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::BootstrapError;
use crate::locale::Locale;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPrepConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_interpreter_download_url")]
    pub interpreter_download_url: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_pause_on_exit")]
    pub pause_on_exit: bool,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

impl Default for OcrPrepConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            interpreter_download_url: default_interpreter_download_url(),
            locale: Locale::default(),
            pause_on_exit: default_pause_on_exit(),
            paths: PathsConfig::default(),
            runtime: RuntimeConfig::default(),
            models: ModelsConfig::default(),
        }
    }
}

/// Workspace-relative locations the procedure reads and creates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_env_dir")]
    pub env_dir: PathBuf,
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,
    #[serde(default = "default_download_script")]
    pub download_script: PathBuf,
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            env_dir: default_env_dir(),
            requirements: default_requirements(),
            download_script: default_download_script(),
            models_dir: default_models_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub accelerated: AcceleratedRuntime,
    #[serde(default)]
    pub fallback: FallbackRuntime,
}

/// Pinned CUDA build installed from a dedicated package index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratedRuntime {
    #[serde(default = "default_accelerated_packages")]
    pub packages: Vec<String>,
    #[serde(default = "default_accelerated_index")]
    pub index_url: String,
}

impl Default for AcceleratedRuntime {
    fn default() -> Self {
        Self {
            packages: default_accelerated_packages(),
            index_url: default_accelerated_index(),
        }
    }
}

/// Unpinned packages from the default index, used when the CUDA build fails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRuntime {
    #[serde(default = "default_fallback_packages")]
    pub packages: Vec<String>,
}

impl Default for FallbackRuntime {
    fn default() -> Self {
        Self {
            packages: default_fallback_packages(),
        }
    }
}

/// Where model artifacts come from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// Run the workspace's download script with the environment interpreter
    #[default]
    Script,
    /// Use the downloader built into this tool
    Builtin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub source: ModelSource,
    #[serde(default = "default_manual_url")]
    pub manual_url: String,
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_revision")]
    pub revision: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_fallback_files")]
    pub fallback_files: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            source: ModelSource::default(),
            manual_url: default_manual_url(),
            repository: default_repository(),
            api_base: default_api_base(),
            revision: default_revision(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            fallback_files: default_fallback_files(),
        }
    }
}

/// Absolute locations derived from `PathsConfig` and a working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub workdir: PathBuf,
    pub env_dir: PathBuf,
    pub requirements: PathBuf,
    pub download_script: PathBuf,
    pub models_dir: PathBuf,
}

impl OcrPrepConfig {
    /// Child processes run with the workspace as their cwd, so every path
    /// handed to them must be absolute. A relative `workdir` is anchored at
    /// the process cwd.
    pub fn resolve(&self, workdir: &Path) -> ResolvedPaths {
        let workdir = std::path::absolute(workdir).unwrap_or_else(|e| {
            log::warn!("Could not make {} absolute: {}", workdir.display(), e);
            workdir.to_path_buf()
        });
        let workdir = workdir.as_path();
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                workdir.join(p)
            }
        };
        ResolvedPaths {
            workdir: workdir.to_path_buf(),
            env_dir: join(&self.paths.env_dir),
            requirements: join(&self.paths.requirements),
            download_script: join(&self.paths.download_script),
            models_dir: join(&self.paths.models_dir),
        }
    }

    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.interpreter.trim().is_empty() {
            return Err(BootstrapError::Config("interpreter must not be empty".to_string()));
        }
        if self.paths.env_dir.as_os_str().is_empty() {
            return Err(BootstrapError::Config("paths.env_dir must not be empty".to_string()));
        }
        if self.runtime.accelerated.packages.is_empty() {
            return Err(BootstrapError::Config(
                "runtime.accelerated.packages must list at least one package".to_string(),
            ));
        }
        if self.runtime.fallback.packages.is_empty() {
            return Err(BootstrapError::Config(
                "runtime.fallback.packages must list at least one package".to_string(),
            ));
        }
        if self.models.max_retries == 0 {
            return Err(BootstrapError::Config("models.max_retries must be at least 1".to_string()));
        }

        let urls = [
            ("interpreter_download_url", &self.interpreter_download_url),
            ("runtime.accelerated.index_url", &self.runtime.accelerated.index_url),
            ("models.manual_url", &self.models.manual_url),
            ("models.api_base", &self.models.api_base),
        ];
        for (field, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(BootstrapError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                )));
            }
        }
        Ok(())
    }
}

fn default_interpreter() -> String {
    "python".to_string()
}

fn default_interpreter_download_url() -> String {
    "https://www.python.org/downloads/".to_string()
}

fn default_pause_on_exit() -> bool {
    true
}

fn default_env_dir() -> PathBuf {
    PathBuf::from("env")
}

fn default_requirements() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_download_script() -> PathBuf {
    PathBuf::from("download_models.py")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_accelerated_packages() -> Vec<String> {
    vec![
        "torch==2.6.0".to_string(),
        "torchvision==0.21.0".to_string(),
        "torchaudio==2.6.0".to_string(),
    ]
}

fn default_accelerated_index() -> String {
    "https://download.pytorch.org/whl/cu118".to_string()
}

fn default_fallback_packages() -> Vec<String> {
    vec!["torch".to_string(), "torchvision".to_string(), "torchaudio".to_string()]
}

fn default_manual_url() -> String {
    "https://www.modelscope.cn/models/deepseek-ai/DeepSeek-OCR/files".to_string()
}

fn default_repository() -> String {
    "deepseek-ai/DeepSeek-OCR".to_string()
}

fn default_api_base() -> String {
    "https://www.modelscope.cn/api/v1/models".to_string()
}

fn default_revision() -> String {
    "master".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_fallback_files() -> Vec<String> {
    [
        "config.json",
        "configuration.json",
        "preprocessor_config.json",
        "tokenizer_config.json",
        "tokenizer.json",
        "special_tokens_map.json",
        "vocab.json",
        "merges.txt",
        "model.safetensors",
        "pytorch_model.bin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
