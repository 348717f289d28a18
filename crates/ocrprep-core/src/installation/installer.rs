//! pip invocations inside the virtual environment

use std::path::{Path, PathBuf};

use crate::errors::BootstrapError;
use crate::installation::strategies::RuntimeStrategy;
use crate::process::{CommandOutcome, CommandRunner, CommandSpec};

/// Result of installing the numeric runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeInstall {
    /// The first strategy succeeded
    Primary(&'static str),
    /// A later strategy succeeded after the first failed
    Fallback(&'static str),
    /// Every strategy failed; the procedure continues regardless
    Failed,
}

impl RuntimeInstall {
    pub fn used_fallback(&self) -> bool {
        !matches!(self, RuntimeInstall::Primary(_))
    }
}

pub struct PackageInstaller<'a> {
    runner: &'a dyn CommandRunner,
    python: PathBuf,
    cwd: Option<PathBuf>,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, python: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            python: python.into(),
            cwd: None,
        }
    }

    pub fn with_current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    fn pip<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new(&self.python).args(["-m", "pip"]).args(args);
        match &self.cwd {
            Some(dir) => spec.current_dir(dir),
            None => spec,
        }
    }

    /// Best effort: the outcome is logged and otherwise ignored
    pub async fn upgrade_pip(&self) {
        let spec = self.pip(["install", "--upgrade", "pip"]);
        match self.runner.run(&spec).await {
            Ok(outcome) if outcome.success() => log::info!("pip upgraded"),
            Ok(outcome) => log::warn!("pip upgrade exited with {:?}, continuing", outcome.code),
            Err(e) => log::warn!("pip upgrade could not run: {}, continuing", e),
        }
    }

    /// Try strategies in priority order until one succeeds.
    ///
    /// `on_failure` is called with the name of each strategy that failed,
    /// before the next one is attempted.
    pub async fn install_runtime<F>(
        &self,
        mut strategies: Vec<Box<dyn RuntimeStrategy>>,
        mut on_failure: F,
    ) -> RuntimeInstall
    where
        F: FnMut(&'static str),
    {
        strategies.sort_by_key(|s| s.priority());

        for (attempt, strategy) in strategies.iter().enumerate() {
            let spec = self.pip(strategy.pip_args());
            log::info!("Installing runtime with strategy '{}': {}", strategy.name(), spec);

            let outcome = match self.runner.run(&spec).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("Strategy '{}' could not run: {}", strategy.name(), e);
                    CommandOutcome { code: None }
                }
            };

            if outcome.success() {
                log::info!("Runtime installed using strategy '{}'", strategy.name());
                return if attempt == 0 {
                    RuntimeInstall::Primary(strategy.name())
                } else {
                    RuntimeInstall::Fallback(strategy.name())
                };
            }

            let err = BootstrapError::AcceleratedRuntimeInstall { code: outcome.code };
            log::warn!("Strategy '{}' failed: {}", strategy.name(), err);
            on_failure(strategy.name());
        }

        RuntimeInstall::Failed
    }

    /// Install everything listed in the manifest; failure is fatal
    pub async fn install_manifest(&self, manifest: &Path) -> Result<(), BootstrapError> {
        if !manifest.is_file() {
            return Err(BootstrapError::ManifestMissing {
                path: manifest.to_path_buf(),
            });
        }

        let spec = self.pip(["install".to_string(), "-r".to_string(), manifest.display().to_string()]);
        log::info!("Installing manifest dependencies: {}", spec);
        let outcome = self.runner.run(&spec).await?;
        if !outcome.success() {
            return Err(BootstrapError::DependencyInstall {
                manifest: manifest.to_path_buf(),
                code: outcome.code,
            });
        }
        Ok(())
    }
}
