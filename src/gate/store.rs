//! Baseline persistence and engine collection.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use super::clock::Clock;
use super::config::GateConfig;
use super::engine::MutationEngine;
use super::error::{GateError, UNKNOWN_ERROR};
use super::metrics::MutationResultSet;
use super::report::Reporter;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO failure.
    #[error("{path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// JSON encoding or decoding failure.
    #[error("{path}: {source}")]
    Json {
        /// File involved.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Durable baseline lifecycle plus access to fresh engine results.
pub trait MetricsStore {
    /// Load the stored baseline. Never fails: unreadable data yields the
    /// zero default after a warning.
    fn read_baseline(&self) -> MutationResultSet;

    /// Obtain a fresh result set from the engine, stamped with "now".
    fn collect(&self) -> Result<MutationResultSet, GateError>;

    /// Replace the stored baseline with `result`.
    fn persist(&self, result: &MutationResultSet) -> Result<(), StoreError>;
}

/// File-backed store: a pretty JSON baseline plus a plain score file.
pub struct FileMetricsStore<'a> {
    config: &'a GateConfig,
    engine: &'a dyn MutationEngine,
    clock: &'a dyn Clock,
    reporter: &'a dyn Reporter,
}

impl<'a> FileMetricsStore<'a> {
    /// Create a store rooted at `config.project_dir`.
    pub fn new(
        config: &'a GateConfig,
        engine: &'a dyn MutationEngine,
        clock: &'a dyn Clock,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            engine,
            clock,
            reporter,
        }
    }
}

/// Read a baseline file, `None` when it does not exist.
///
/// Any other access failure is an error, so a directory that cannot be
/// searched is not mistaken for a first run.
pub fn load_baseline(path: &Path) -> Result<Option<MutationResultSet>, StoreError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::io(path, err)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| StoreError::json(path, err))
}

impl MetricsStore for FileMetricsStore<'_> {
    fn read_baseline(&self) -> MutationResultSet {
        let path = self.config.metrics_path();
        match load_baseline(&path) {
            Ok(Some(baseline)) => baseline,
            Ok(None) => {
                debug!(path = %path.display(), "no baseline recorded yet");
                MutationResultSet::zeroed(self.clock.now())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding unreadable baseline");
                self.reporter.warning(&format!(
                    "Could not read previous mutation metrics. Using default baseline. {err}"
                ));
                MutationResultSet::zeroed(self.clock.now())
            }
        }
    }

    fn collect(&self) -> Result<MutationResultSet, GateError> {
        let stdout = self
            .engine
            .collect_metrics(self.config)
            .map_err(|err| {
                GateError::collection_failed(err.detail().as_deref().unwrap_or(UNKNOWN_ERROR))
            })?;
        if stdout.trim().is_empty() {
            return Err(GateError::Parse("engine produced no output".to_string()));
        }

        let payload: serde_json::Value =
            serde_json::from_str(&stdout).map_err(|err| GateError::Parse(err.to_string()))?;
        MutationResultSet::from_engine_payload(payload, self.clock.now())
            .map_err(|err| GateError::Parse(err.to_string()))
    }

    fn persist(&self, result: &MutationResultSet) -> Result<(), StoreError> {
        let metrics_path = self.config.metrics_path();
        if let Some(parent) = metrics_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }
        let mut json = serde_json::to_string_pretty(result)
            .map_err(|err| StoreError::json(&metrics_path, err))?;
        json.push('\n');
        std::fs::write(&metrics_path, json).map_err(|err| StoreError::io(&metrics_path, err))?;

        // The structured file is not rolled back if this write fails.
        let score_path = self.config.score_path();
        std::fs::write(&score_path, result.score.to_string())
            .map_err(|err| StoreError::io(&score_path, err))?;

        debug!(
            metrics = %metrics_path.display(),
            score = %score_path.display(),
            "baseline persisted"
        );
        Ok(())
    }
}
