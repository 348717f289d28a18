//! Interpreter detection and virtual environment management

use std::path::{Path, PathBuf};
use which::which;

use crate::errors::BootstrapError;
use crate::process::{CommandRunner, CommandSpec};

/// A working system interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterInfo {
    pub program: String,
    /// Resolved location on PATH, when `which` finds one
    pub location: Option<PathBuf>,
    pub version: String,
}

/// Run `<interpreter> --version`; absent or failing interpreters are fatal
pub async fn probe_interpreter(
    runner: &dyn CommandRunner,
    interpreter: &str,
) -> Result<InterpreterInfo, BootstrapError> {
    let location = which(interpreter).ok();
    match &location {
        Some(path) => log::debug!("'{}' resolves to {}", interpreter, path.display()),
        None => log::debug!("'{}' not found on PATH", interpreter),
    }

    let spec = CommandSpec::new(interpreter).arg("--version");
    let output = match runner.capture(&spec).await {
        Ok(output) => output,
        Err(e) => {
            log::warn!("Interpreter probe failed: {}", e);
            return Err(BootstrapError::InterpreterMissing {
                interpreter: interpreter.to_string(),
            });
        }
    };

    if !output.outcome.success() {
        log::warn!(
            "'{}' exited with {:?}: {}",
            spec,
            output.outcome.code,
            output.stderr.trim()
        );
        return Err(BootstrapError::InterpreterMissing {
            interpreter: interpreter.to_string(),
        });
    }

    // Python 2 and some launchers print the version on stderr
    let version = first_line(&output.stdout)
        .or_else(|| first_line(&output.stderr))
        .unwrap_or_else(|| interpreter.to_string());

    log::info!("Using {} ({})", version, interpreter);
    Ok(InterpreterInfo {
        program: interpreter.to_string(),
        location,
        version,
    })
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

/// Layout of an isolated interpreter directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEnv {
    root: PathBuf,
}

impl VirtualEnv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Interpreter inside the environment; its presence marks the env as usable
    pub fn python_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts").join("python.exe")
        } else {
            self.root.join("bin").join("python")
        }
    }

    pub fn exists(&self) -> bool {
        self.python_path().is_file()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvStatus {
    Reused,
    Created,
}

/// Create the environment unless its interpreter is already present
pub async fn ensure_virtual_env(
    runner: &dyn CommandRunner,
    interpreter: &str,
    venv: &VirtualEnv,
) -> Result<EnvStatus, BootstrapError> {
    if venv.exists() {
        log::info!("Reusing virtual environment at {}", venv.root().display());
        return Ok(EnvStatus::Reused);
    }

    let spec = CommandSpec::new(interpreter)
        .args(["-m", "venv"])
        .arg(venv.root().display().to_string());

    log::info!("Creating virtual environment: {}", spec);
    let outcome = runner.run(&spec).await?;
    if !outcome.success() {
        return Err(BootstrapError::EnvironmentCreation {
            env_dir: venv.root().to_path_buf(),
            code: outcome.code,
        });
    }

    Ok(EnvStatus::Created)
}
