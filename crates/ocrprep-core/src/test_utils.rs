//! Shared test doubles

use crate::bootstrap::Console;
use crate::errors::BootstrapError;
use crate::process::{CapturedOutput, CommandOutcome, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

enum Reply {
    Exit(i32),
    Missing,
}

struct Rule {
    pattern: String,
    reply: Reply,
}

/// Command runner that returns scripted exit codes and records every call.
///
/// Rules match on a substring of the rendered command line; the first match
/// wins and unmatched commands succeed.
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    creates: Vec<(String, PathBuf)>,
    version_output: String,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            creates: Vec::new(),
            version_output: "Python 3.11.4".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn exit(mut self, pattern: &str, code: i32) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            reply: Reply::Exit(code),
        });
        self
    }

    pub fn missing(mut self, pattern: &str) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            reply: Reply::Missing,
        });
        self
    }

    /// Create `path` (as an empty file) whenever a matching command succeeds
    pub fn creates(mut self, pattern: &str, path: PathBuf) -> Self {
        self.creates.push((pattern.to_string(), path));
        self
    }

    pub fn with_version_output(mut self, output: &str) -> Self {
        self.version_output = output.to_string();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.to_string()).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    fn respond(&self, spec: &CommandSpec) -> Result<CommandOutcome, BootstrapError> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.to_string();

        let reply = self.rules.iter().find(|r| line.contains(&r.pattern)).map(|r| &r.reply);
        let outcome = match reply {
            Some(Reply::Missing) => {
                return Err(BootstrapError::Spawn {
                    program: spec.program.display().to_string(),
                    reason: "program not found".to_string(),
                })
            }
            Some(Reply::Exit(code)) => CommandOutcome::from_code(*code),
            None => CommandOutcome::from_code(0),
        };

        if outcome.success() {
            for (pattern, path) in &self.creates {
                if line.contains(pattern) {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).unwrap();
                    }
                    std::fs::write(path, b"").unwrap();
                }
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutcome, BootstrapError> {
        self.respond(spec)
    }

    async fn capture(&self, spec: &CommandSpec) -> Result<CapturedOutput, BootstrapError> {
        let outcome = self.respond(spec)?;
        Ok(CapturedOutput {
            outcome,
            stdout: self.version_output.clone(),
            stderr: String::new(),
        })
    }
}

/// Console that keeps every printed line
#[derive(Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<String>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn printed(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.printed().iter().any(|l| l.contains(needle))
    }
}

impl Console for RecordingConsole {
    fn line(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}
