//! Model artifact acquisition
//!
//! Models come either from the workspace's own download script, run with
//! the environment interpreter, or from the built-in downloader. Neither
//! path can fail the setup: problems are reported as `Incomplete` and the
//! user is told how to finish the download by hand.

use std::path::Path;

use crate::config::{ModelSource, ModelsConfig, ResolvedPaths};
use crate::downloader::ModelDownloader;
use crate::errors::BootstrapError;
use crate::process::{CommandRunner, CommandSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    Complete,
    Incomplete { reason: String },
}

impl ModelOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, ModelOutcome::Complete)
    }

    fn incomplete(err: BootstrapError) -> Self {
        log::warn!("{}", err);
        ModelOutcome::Incomplete {
            reason: err.to_string(),
        }
    }
}

/// Create the models directory if it does not exist yet
pub async fn ensure_models_dir(path: &Path) -> Result<(), BootstrapError> {
    if !path.is_dir() {
        log::info!("Creating models directory {}", path.display());
    }
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

/// Fetch model artifacts with the configured source
pub async fn acquire_models(
    runner: &dyn CommandRunner,
    python: &Path,
    paths: &ResolvedPaths,
    config: &ModelsConfig,
) -> ModelOutcome {
    match config.source {
        ModelSource::Script => run_download_script(runner, python, paths).await,
        ModelSource::Builtin => run_builtin_downloader(&paths.models_dir, config).await,
    }
}

async fn run_download_script(
    runner: &dyn CommandRunner,
    python: &Path,
    paths: &ResolvedPaths,
) -> ModelOutcome {
    let script = &paths.download_script;
    if !script.is_file() {
        return ModelOutcome::incomplete(BootstrapError::ModelDownload {
            reason: format!("download script {} not found", script.display()),
        });
    }

    let spec = CommandSpec::new(python)
        .arg(script.display().to_string())
        .current_dir(&paths.workdir);
    log::info!("Running model download script: {}", spec);

    match runner.run(&spec).await {
        Ok(outcome) if outcome.success() => ModelOutcome::Complete,
        Ok(outcome) => ModelOutcome::incomplete(BootstrapError::ModelDownload {
            reason: match outcome.code {
                Some(code) => format!("download script exited with code {}", code),
                None => "download script was terminated".to_string(),
            },
        }),
        Err(e) => ModelOutcome::incomplete(BootstrapError::ModelDownload {
            reason: e.to_string(),
        }),
    }
}

async fn run_builtin_downloader(models_dir: &Path, config: &ModelsConfig) -> ModelOutcome {
    let downloader = match ModelDownloader::from_config(config) {
        Ok(downloader) => downloader,
        Err(e) => return ModelOutcome::incomplete(e.into()),
    };

    match downloader.download_all(models_dir).await {
        Ok(summary) if summary.is_complete() => ModelOutcome::Complete,
        Ok(summary) => ModelOutcome::incomplete(BootstrapError::ModelDownload {
            reason: format!(
                "{} of {} files failed: {}",
                summary.failed.len(),
                summary.total,
                summary.failed.join(", ")
            ),
        }),
        Err(e) => ModelOutcome::incomplete(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OcrPrepConfig;
    use crate::test_utils::ScriptedRunner;
    use tempfile::tempdir;

    fn workspace(dir: &Path) -> ResolvedPaths {
        OcrPrepConfig::default().resolve(dir)
    }

    #[tokio::test]
    async fn test_ensure_models_dir_creates_and_tolerates_existing() {
        let dir = tempdir().unwrap();
        let models = dir.path().join("models");
        ensure_models_dir(&models).await.unwrap();
        assert!(models.is_dir());
        ensure_models_dir(&models).await.unwrap();
        assert!(models.is_dir());
    }

    #[tokio::test]
    async fn test_script_success_is_complete() {
        let dir = tempdir().unwrap();
        let paths = workspace(dir.path());
        std::fs::write(&paths.download_script, "print('ok')\n").unwrap();

        let runner = ScriptedRunner::new();
        let outcome = acquire_models(&runner, Path::new("env/bin/python"), &paths, &Default::default()).await;

        assert_eq!(outcome, ModelOutcome::Complete);
        let specs = runner.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].program, Path::new("env/bin/python"));
        assert_eq!(specs[0].cwd.as_deref(), Some(dir.path()));
        assert!(specs[0].args[0].ends_with("download_models.py"));
    }

    #[tokio::test]
    async fn test_script_failure_is_incomplete() {
        let dir = tempdir().unwrap();
        let paths = workspace(dir.path());
        std::fs::write(&paths.download_script, "raise SystemExit(1)\n").unwrap();

        let runner = ScriptedRunner::new().exit("download_models.py", 1);
        let outcome = acquire_models(&runner, Path::new("python"), &paths, &Default::default()).await;

        assert!(!outcome.is_complete());
        assert!(matches!(outcome, ModelOutcome::Incomplete { reason } if reason.contains("code 1")));
    }

    #[tokio::test]
    async fn test_missing_script_is_incomplete_without_running() {
        let dir = tempdir().unwrap();
        let paths = workspace(dir.path());

        let runner = ScriptedRunner::new();
        let outcome = acquire_models(&runner, Path::new("python"), &paths, &Default::default()).await;

        assert!(!outcome.is_complete());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_builtin_unreachable_server_is_incomplete() {
        let dir = tempdir().unwrap();
        let paths = workspace(dir.path());
        let config = ModelsConfig {
            source: ModelSource::Builtin,
            // Port 9 (discard) on loopback refuses connections
            api_base: "http://127.0.0.1:9/api/v1/models".to_string(),
            max_retries: 1,
            fallback_files: vec!["config.json".to_string()],
            ..Default::default()
        };

        let runner = ScriptedRunner::new();
        let outcome = acquire_models(&runner, Path::new("python"), &paths, &config).await;

        assert!(matches!(outcome, ModelOutcome::Incomplete { reason } if reason.contains("config.json")));
        assert!(runner.calls().is_empty());
        assert!(paths.models_dir.is_dir());
    }
}
