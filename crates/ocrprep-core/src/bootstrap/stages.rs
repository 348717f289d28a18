//! Stage bookkeeping for a bootstrap run

use std::fmt;

use crate::errors::BootstrapError;

/// The four gated steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Interpreter,
    Environment,
    Dependencies,
    Models,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Interpreter,
        Stage::Environment,
        Stage::Dependencies,
        Stage::Models,
    ];

    /// 1-based position shown in step headers
    pub fn index(&self) -> usize {
        match self {
            Stage::Interpreter => 1,
            Stage::Environment => 2,
            Stage::Dependencies => 3,
            Stage::Models => 4,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Interpreter => "interpreter",
            Stage::Environment => "environment",
            Stage::Dependencies => "dependencies",
            Stage::Models => "models",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Passed,
    /// Nothing to do, e.g. the environment already existed
    Skipped,
    /// Finished with a non-fatal problem
    Warned,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
}

#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    pub stages: Vec<StageRecord>,
    pub exit_code: i32,
    /// The fatal error that stopped the run, or the last warning
    pub error: Option<BootstrapError>,
}

impl BootstrapReport {
    pub(crate) fn record(&mut self, stage: Stage, status: StageStatus) {
        log::debug!("Stage {} finished: {:?}", stage, status);
        self.stages.push(StageRecord { stage, status });
    }

    pub fn status_of(&self, stage: Stage) -> Option<StageStatus> {
        self.stages.iter().find(|r| r.stage == stage).map(|r| r.status)
    }

    /// True when the run reached the completion step
    pub fn completed(&self) -> bool {
        self.exit_code == 0 && self.status_of(Stage::Models).is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.stages.iter().any(|r| r.status == StageStatus::Warned)
    }
}
