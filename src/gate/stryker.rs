//! Stryker `mutation-report.json` to result-set payload.
//!
//! The payload printed here is what the gate expects on the metrics
//! command's stdout, so `mutation-gate extract-metrics` can serve as that
//! command for Stryker projects.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::metrics::MutantSummary;

/// Report written by a Stryker run that is still being post-processed.
pub const TEMP_REPORT_FILE: &str = "tmp-mutation-report.json";
/// Report written by a finished Stryker run.
pub const REPORT_FILE: &str = "mutation-report.json";

/// Extraction errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No report in the project.
    #[error("Mutation report file not found at: {}", .0.display())]
    NotFound(PathBuf),
    /// IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Report is not valid JSON.
    #[error("Error extracting mutation metrics: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportMetrics {
    mutation_score: Option<f64>,
    killed: Option<u64>,
    survived: Option<u64>,
    timed_out: Option<u64>,
    no_coverage: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportFile {
    #[serde(default)]
    mutants: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StrykerReport {
    #[serde(default)]
    metrics: Option<ReportMetrics>,
    #[serde(default)]
    files: Option<Map<String, Value>>,
    #[serde(default)]
    test_files: Option<Vec<String>>,
}

/// Untimestamped payload, the shape the metrics command must print.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPayload {
    /// Mutation score.
    pub score: f64,
    /// Killed mutants.
    pub killed: u64,
    /// Survived mutants.
    pub survived: u64,
    /// Timed-out mutants.
    pub timeout: u64,
    /// Uncovered mutants.
    pub no_coverage: u64,
    /// Mutant totals and mutated files.
    pub mutants: MutantSummary,
    /// Test files.
    pub test_files: Vec<String>,
}

/// Find the report under `project_dir`, preferring the temporary one.
pub fn locate_report(project_dir: &Path) -> Result<PathBuf, ExtractError> {
    let temp = project_dir.join(TEMP_REPORT_FILE);
    if temp.exists() {
        return Ok(temp);
    }
    let report = project_dir.join(REPORT_FILE);
    if report.exists() {
        return Ok(report);
    }
    Err(ExtractError::NotFound(report))
}

/// Derive the payload from report JSON text. Absent metrics count as zero.
pub fn extract_metrics(report_json: &str) -> Result<MetricsPayload, ExtractError> {
    let report: StrykerReport = serde_json::from_str(report_json)?;
    let metrics = report.metrics.unwrap_or_default();
    let files = report.files.unwrap_or_default();

    let mut total = 0u64;
    for file in files.values() {
        // Entries without a `mutants` array contribute nothing.
        let file = ReportFile::deserialize(file).unwrap_or_default();
        total += file.mutants.len() as u64;
    }

    Ok(MetricsPayload {
        score: metrics.mutation_score.unwrap_or(0.0),
        killed: metrics.killed.unwrap_or(0),
        survived: metrics.survived.unwrap_or(0),
        timeout: metrics.timed_out.unwrap_or(0),
        no_coverage: metrics.no_coverage.unwrap_or(0),
        mutants: MutantSummary {
            total,
            mutated: files.keys().cloned().collect(),
        },
        test_files: report.test_files.unwrap_or_default(),
    })
}

/// Locate, read and extract in one step.
pub fn extract_from_project(
    project_dir: &Path,
    report: Option<&Path>,
) -> Result<MetricsPayload, ExtractError> {
    let path = match report {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => return Err(ExtractError::NotFound(path.to_path_buf())),
        None => locate_report(project_dir)?,
    };
    let raw = std::fs::read_to_string(&path)?;
    extract_metrics(&raw)
}
