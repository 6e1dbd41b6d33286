//! Reporting collaborator and result-set rendering.

use std::cell::{Cell, RefCell};
use std::io::Write;

use tracing::{debug, error, info, warn};

use super::metrics::MutationResultSet;

/// Leveled message sink for a gate cycle.
///
/// `set_failed` marks the hosting process as failed regardless of whether
/// the caller also acts on the returned error.
pub trait Reporter {
    /// Informational message.
    fn info(&self, message: &str);
    /// Detail message.
    fn debug(&self, message: &str);
    /// Recoverable anomaly.
    fn warning(&self, message: &str);
    /// Terminal failure signal.
    fn set_failed(&self, message: &str);
    /// True once `set_failed` has been called.
    fn has_failed(&self) -> bool;
}

/// Forwards messages to `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter {
    failed: Cell<bool>,
}

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn debug(&self, message: &str) {
        debug!("{message}");
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
    }

    fn set_failed(&self, message: &str) {
        self.failed.set(true);
        error!("{message}");
    }

    fn has_failed(&self) -> bool {
        self.failed.get()
    }
}

/// Writes GitHub Actions workflow commands.
#[derive(Debug)]
pub struct ActionsReporter<W: Write> {
    out: RefCell<W>,
    failed: Cell<bool>,
}

impl ActionsReporter<std::io::Stdout> {
    /// Reporter on process stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ActionsReporter<W> {
    /// Reporter on an arbitrary writer.
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            failed: Cell::new(false),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, command: Option<&str>, message: &str) {
        let mut out = self.out.borrow_mut();
        // A broken stdout must not turn into a gate failure.
        let _ = match command {
            Some(command) => writeln!(out, "::{command}::{}", escape_workflow_data(message)),
            None => writeln!(out, "{message}"),
        };
    }
}

impl<W: Write> Reporter for ActionsReporter<W> {
    fn info(&self, message: &str) {
        self.emit(None, message);
    }

    fn debug(&self, message: &str) {
        self.emit(Some("debug"), message);
    }

    fn warning(&self, message: &str) {
        self.emit(Some("warning"), message);
    }

    fn set_failed(&self, message: &str) {
        self.failed.set(true);
        self.emit(Some("error"), message);
    }

    fn has_failed(&self) -> bool {
        self.failed.get()
    }
}

fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Message severity recorded by [`MemoryReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// `info`.
    Info,
    /// `debug`.
    Debug,
    /// `warning`.
    Warning,
    /// `set_failed`.
    Failed,
}

/// Keeps every message in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    messages: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    /// Snapshot of all recorded messages.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    /// Messages recorded at `level`.
    pub fn at(&self, level: Level) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// True if `message` was recorded at `level`.
    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.messages
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }

    fn push(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}

impl Reporter for MemoryReporter {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }

    fn warning(&self, message: &str) {
        self.push(Level::Warning, message);
    }

    fn set_failed(&self, message: &str) {
        self.push(Level::Failed, message);
    }

    fn has_failed(&self) -> bool {
        self.messages
            .borrow()
            .iter()
            .any(|(l, _)| *l == Level::Failed)
    }
}

/// Supported output formats for result-set reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown summary table.
    Markdown,
    /// Pretty JSON, same shape as the baseline file.
    Json,
}

/// Render a result set in the requested format.
pub fn render_result_set(
    result: &MutationResultSet,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(result),
        ReportFormat::Markdown => {
            let mut out = String::from("# Mutation Baseline\n\n");
            out.push_str(&format!("- recorded: {}\n\n", result.timestamp.to_rfc3339()));
            out.push_str("| metric | value |\n|---|---:|\n");
            out.push_str(&format!("| score | {} |\n", result.score));
            out.push_str(&format!("| total mutants | {} |\n", result.mutants.total));
            out.push_str(&format!("| killed | {} |\n", result.killed));
            out.push_str(&format!("| survived | {} |\n", result.survived));
            out.push_str(&format!("| timeout | {} |\n", result.timeout));
            out.push_str(&format!("| no coverage | {} |\n", result.no_coverage));

            if !result.mutants.mutated.is_empty() {
                out.push_str("\n## Mutated files\n\n");
                for file in &result.mutants.mutated {
                    out.push_str(&format!("- `{file}`\n"));
                }
            }
            if !result.test_files.is_empty() {
                out.push_str("\n## Test files\n\n");
                for file in &result.test_files {
                    out.push_str(&format!("- `{file}`\n"));
                }
            }
            Ok(out)
        }
    }
}
