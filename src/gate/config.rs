//! Gate configuration.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default baseline file name.
pub const DEFAULT_METRICS_FILE: &str = "mutation-metrics.json";
/// Default score file name.
pub const DEFAULT_SCORE_FILE: &str = "mutation.txt";
/// Default streaming test command.
pub const DEFAULT_TEST_COMMAND: &str = "npm run test:mutation";
/// Default metrics collection command.
pub const DEFAULT_METRICS_COMMAND: &str = "npm run get:mutation-metrics --silent";

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program name or path, resolved through `PATH` when bare.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Split a command line on whitespace. No quoting is supported.
    ///
    /// Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Configuration for one gate cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GateConfig {
    /// Directory subprocesses run in; base of relative storage paths.
    pub project_dir: PathBuf,
    /// Structured baseline file.
    pub metrics_file: PathBuf,
    /// Plain-text score file.
    pub score_file: PathBuf,
    /// Command that runs the mutation tests with inherited stdio.
    pub test_command: CommandSpec,
    /// Command whose stdout is the result-set payload.
    pub metrics_command: CommandSpec,
}

fn default_command(line: &str) -> CommandSpec {
    CommandSpec::parse(line).unwrap_or_else(|| CommandSpec {
        program: line.to_string(),
        args: Vec::new(),
    })
}

impl Default for GateConfig {
    fn default() -> Self {
        let project_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            project_dir,
            metrics_file: PathBuf::from(DEFAULT_METRICS_FILE),
            score_file: PathBuf::from(DEFAULT_SCORE_FILE),
            test_command: default_command(DEFAULT_TEST_COMMAND),
            metrics_command: default_command(DEFAULT_METRICS_COMMAND),
        }
    }
}

impl GateConfig {
    /// Set project directory.
    pub fn with_project_dir(mut self, project_dir: impl Into<PathBuf>) -> Self {
        self.project_dir = project_dir.into();
        self
    }

    /// Set baseline file.
    pub fn with_metrics_file(mut self, metrics_file: impl Into<PathBuf>) -> Self {
        self.metrics_file = metrics_file.into();
        self
    }

    /// Set score file.
    pub fn with_score_file(mut self, score_file: impl Into<PathBuf>) -> Self {
        self.score_file = score_file.into();
        self
    }

    /// Set test command.
    pub fn with_test_command(mut self, command: CommandSpec) -> Self {
        self.test_command = command;
        self
    }

    /// Set metrics command.
    pub fn with_metrics_command(mut self, command: CommandSpec) -> Self {
        self.metrics_command = command;
        self
    }

    /// Baseline file resolved against the project directory.
    pub fn metrics_path(&self) -> PathBuf {
        self.project_dir.join(&self.metrics_file)
    }

    /// Score file resolved against the project directory.
    pub fn score_path(&self) -> PathBuf {
        self.project_dir.join(&self.score_file)
    }
}
