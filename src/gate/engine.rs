//! Process collaborator for the external mutation-testing engine.
//!
//! The test run streams straight to the console and only its exit status
//! matters. Metrics collection captures stdout for parsing.

use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, instrument};

use super::config::{CommandSpec, GateConfig};

/// Subprocess failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Program could not be resolved.
    #[error("{program}: not found")]
    MissingProgram {
        /// Program as configured.
        program: String,
    },
    /// Process exited with a non-zero code.
    #[error("Command failed: {command} (exit code {code}){}", stderr_suffix(.stderr))]
    Exited {
        /// Rendered command line.
        command: String,
        /// Exit code.
        code: i32,
        /// Captured stderr; empty when stdio was inherited.
        stderr: String,
    },
    /// Process ended without an exit code and left no diagnostic.
    #[error("command terminated without an exit code: {command}")]
    NoDiagnostic {
        /// Rendered command line.
        command: String,
    },
    /// Spawn or pipe failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

impl EngineError {
    /// Diagnostic text used for failure classification.
    ///
    /// `None` when the process left nothing to report.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::NoDiagnostic { .. } => None,
            other => Some(other.to_string()),
        }
    }
}

/// Mutation engine contract.
pub trait MutationEngine {
    /// Run the mutation tests with inherited stdio.
    fn run_tests(&self, config: &GateConfig) -> Result<(), EngineError>;

    /// Run the metrics command and return its captured stdout.
    fn collect_metrics(&self, config: &GateConfig) -> Result<String, EngineError>;
}

/// Adapter running the configured commands as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandEngine;

impl CommandEngine {
    fn command(spec: &CommandSpec, config: &GateConfig) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).current_dir(&config.project_dir);
        cmd
    }

    fn spawn_error(spec: &CommandSpec, err: std::io::Error) -> EngineError {
        if err.kind() == std::io::ErrorKind::NotFound {
            EngineError::MissingProgram {
                program: spec.program.clone(),
            }
        } else {
            EngineError::Io(err)
        }
    }

    fn check_status(
        spec: &CommandSpec,
        status: ExitStatus,
        stderr: &[u8],
    ) -> Result<(), EngineError> {
        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => Err(EngineError::Exited {
                command: spec.to_string(),
                code,
                stderr: String::from_utf8_lossy(stderr).to_string(),
            }),
            None => Err(EngineError::NoDiagnostic {
                command: spec.to_string(),
            }),
        }
    }
}

impl MutationEngine for CommandEngine {
    #[instrument(skip_all, fields(command = %config.test_command))]
    fn run_tests(&self, config: &GateConfig) -> Result<(), EngineError> {
        let spec = &config.test_command;
        debug!("spawning mutation test run");
        let status = Self::command(spec, config)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|err| Self::spawn_error(spec, err))?;
        Self::check_status(spec, status, &[])
    }

    #[instrument(skip_all, fields(command = %config.metrics_command))]
    fn collect_metrics(&self, config: &GateConfig) -> Result<String, EngineError> {
        let spec = &config.metrics_command;
        debug!("spawning metrics collection");
        let output = Self::command(spec, config)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| Self::spawn_error(spec, err))?;
        Self::check_status(spec, output.status, &output.stderr)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
