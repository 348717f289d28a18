//! The setup procedure
//!
//! Four stages run strictly in order. Each stage gates the next: a fatal
//! failure prints its localized message and stops the run with exit code 1.
//! The runtime install gets one fallback attempt and model acquisition only
//! ever warns, so both always let the run reach completion.

pub mod stages;


pub use stages::{BootstrapReport, Stage, StageRecord, StageStatus};

use crate::config::{OcrPrepConfig, ResolvedPaths};
use crate::environment::{ensure_virtual_env, probe_interpreter, EnvStatus, VirtualEnv};
use crate::errors::BootstrapError;
use crate::installation::{runtime_strategies, PackageInstaller, RuntimeInstall};
use crate::locale::Messages;
use crate::models::{acquire_models, ensure_models_dir, ModelOutcome};
use crate::process::CommandRunner;

/// Sink for the user-facing lines of the procedure
pub trait Console: Send + Sync {
    fn line(&self, text: &str);

    fn lines(&self, lines: &[String]) {
        for line in lines {
            self.line(line);
        }
    }
}

/// Prints to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&self, text: &str) {
        println!("{}", text);
    }
}

pub struct Bootstrap<'a> {
    config: &'a OcrPrepConfig,
    paths: ResolvedPaths,
    runner: &'a dyn CommandRunner,
    console: &'a dyn Console,
    messages: Messages,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        config: &'a OcrPrepConfig,
        paths: ResolvedPaths,
        runner: &'a dyn CommandRunner,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            config,
            paths,
            runner,
            console,
            messages: config.locale.messages(),
        }
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    pub async fn run(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        log::info!("Starting setup in {}", self.paths.workdir.display());
        self.console.line(&self.messages.banner());

        if let Err(e) = self.check_interpreter(&mut report).await {
            return self.abort(report, e);
        }
        let venv = VirtualEnv::new(&self.paths.env_dir);
        if let Err(e) = self.prepare_environment(&venv, &mut report).await {
            return self.abort(report, e);
        }
        if let Err(e) = self.install_dependencies(&venv, &mut report).await {
            return self.abort(report, e);
        }
        self.fetch_models(&venv, &mut report).await;

        self.console.line("");
        self.console.line(&self.messages.complete());
        self.console.lines(&self.messages.usage());
        log::info!("Setup finished");
        report
    }

    fn header(&self, stage: Stage, title: String) {
        self.console.line("");
        self.console
            .line(&self.messages.step(stage.index(), Stage::ALL.len(), &title));
    }

    fn abort(&self, mut report: BootstrapReport, err: BootstrapError) -> BootstrapReport {
        log::error!("{}", err);
        self.console.line(&self.messages.setup_aborted());
        report.exit_code = err.exit_code();
        report.error = Some(err);
        report
    }

    async fn check_interpreter(&self, report: &mut BootstrapReport) -> Result<(), BootstrapError> {
        self.header(Stage::Interpreter, self.messages.checking_python());

        match probe_interpreter(self.runner, &self.config.interpreter).await {
            Ok(info) => {
                self.console.line(&self.messages.python_found(&info.version));
                report.record(Stage::Interpreter, StageStatus::Passed);
                Ok(())
            }
            Err(e) => {
                self.console
                    .lines(&self.messages.python_missing(&self.config.interpreter_download_url));
                report.record(Stage::Interpreter, StageStatus::Failed);
                Err(e)
            }
        }
    }

    async fn prepare_environment(
        &self,
        venv: &VirtualEnv,
        report: &mut BootstrapReport,
    ) -> Result<(), BootstrapError> {
        self.header(Stage::Environment, self.messages.checking_env());

        match ensure_virtual_env(self.runner, &self.config.interpreter, venv).await {
            Ok(EnvStatus::Reused) => {
                self.console.line(&self.messages.env_exists());
                report.record(Stage::Environment, StageStatus::Skipped);
                Ok(())
            }
            Ok(EnvStatus::Created) => {
                self.console.line(&self.messages.env_created());
                report.record(Stage::Environment, StageStatus::Passed);
                Ok(())
            }
            Err(e) => {
                self.console.line(&self.messages.env_failed());
                report.record(Stage::Environment, StageStatus::Failed);
                Err(e)
            }
        }
    }

    async fn install_dependencies(
        &self,
        venv: &VirtualEnv,
        report: &mut BootstrapReport,
    ) -> Result<(), BootstrapError> {
        self.header(Stage::Dependencies, self.messages.installing_deps());
        let installer =
            PackageInstaller::new(self.runner, venv.python_path()).with_current_dir(&self.paths.workdir);

        self.console.line(&self.messages.upgrading_pip());
        installer.upgrade_pip().await;

        self.console.line(&self.messages.installing_accelerated());
        let mut failures = 0usize;
        let runtime = installer
            .install_runtime(runtime_strategies(&self.config.runtime), |_| {
                let text = if failures == 0 {
                    self.messages.accelerated_failed()
                } else {
                    self.messages.fallback_failed()
                };
                failures += 1;
                self.console.line(&text);
            })
            .await;
        log::info!("Runtime install result: {:?}", runtime);

        self.console.line(&self.messages.installing_manifest());
        if let Err(e) = installer.install_manifest(&self.paths.requirements).await {
            self.console.line(&self.messages.manifest_failed());
            report.record(Stage::Dependencies, StageStatus::Failed);
            return Err(e);
        }

        self.console.line(&self.messages.deps_installed());
        let status = if runtime == RuntimeInstall::Failed {
            StageStatus::Warned
        } else {
            StageStatus::Passed
        };
        report.record(Stage::Dependencies, status);
        Ok(())
    }

    async fn fetch_models(&self, venv: &VirtualEnv, report: &mut BootstrapReport) {
        self.header(Stage::Models, self.messages.downloading_models());

        let outcome = match ensure_models_dir(&self.paths.models_dir).await {
            Ok(()) => {
                acquire_models(
                    self.runner,
                    &venv.python_path(),
                    &self.paths,
                    &self.config.models,
                )
                .await
            }
            Err(e) => ModelOutcome::Incomplete {
                reason: e.to_string(),
            },
        };

        match outcome {
            ModelOutcome::Complete => {
                self.console.line(&self.messages.models_ready());
                report.record(Stage::Models, StageStatus::Passed);
            }
            ModelOutcome::Incomplete { reason } => {
                self.console
                    .lines(&self.messages.models_incomplete(&self.config.models.manual_url));
                report.record(Stage::Models, StageStatus::Warned);
                report.error = Some(BootstrapError::ModelDownload { reason });
            }
        }
    }
}
