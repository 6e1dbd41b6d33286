//! Failure taxonomy for a gate cycle.

use thiserror::Error;

const ENGINE_NOT_FOUND_PHRASES: [&str; 2] = ["stryker: not found", "stryker: command not found"];
const MODULE_NOT_FOUND_PHRASE: &str = "cannot find module";

/// Placeholder used when a failed subprocess carried no diagnostic text.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Errors that abort a gate cycle.
///
/// `Display` yields the short form that is returned to the caller. The
/// fatal-report channel receives [`GateError::detailed_message`], which adds
/// remediation guidance for the classified process failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    /// Score is not a finite number.
    #[error("Invalid score value in metrics")]
    InvalidScore,
    /// Current score is strictly below the baseline.
    #[error("Tests failed: mutation score has decreased from {old} to {new}")]
    Regression {
        /// Baseline score.
        old: f64,
        /// Freshly collected score.
        new: f64,
    },
    /// The mutation engine binary could not be found.
    #[error("Stryker command not found")]
    EngineNotFound,
    /// A dependency module required by the test run is missing.
    #[error("Module not found: {detail}")]
    ModuleNotFound {
        /// Raw failure message of the test run.
        detail: String,
    },
    /// Any other subprocess failure, message already prefixed with its stage.
    #[error("{0}")]
    Process(String),
    /// Engine output was empty or could not be decoded.
    #[error("Failed to parse mutation metrics: {0}")]
    Parse(String),
    /// Writing the new baseline failed.
    #[error("Failed to save metrics: {0}")]
    Persist(String),
}

impl GateError {
    /// Classify a failed test-execution run by inspecting its failure message.
    ///
    /// `None` means the failure carried no message at all; it is reported as
    /// a generic process failure with [`UNKNOWN_ERROR`].
    ///
    /// The test run inherits stderr, so a wrapper such as `npm run` that
    /// fails on a missing Stryker binary only yields a generic exit failure.
    /// [`GateError::EngineNotFound`] is reached when the configured program
    /// itself is the missing `stryker` binary.
    pub fn classify_test_failure(detail: Option<&str>) -> Self {
        let Some(detail) = detail else {
            return Self::Process(format!("Test execution failed: {UNKNOWN_ERROR}"));
        };

        let lower = detail.to_ascii_lowercase();
        if ENGINE_NOT_FOUND_PHRASES
            .iter()
            .any(|phrase| lower.contains(phrase))
        {
            return Self::EngineNotFound;
        }
        if lower.contains(MODULE_NOT_FOUND_PHRASE) {
            return Self::ModuleNotFound {
                detail: detail.to_string(),
            };
        }
        Self::Process(format!("Test execution failed: {detail}"))
    }

    /// Build a collection failure.
    pub fn collection_failed(detail: impl std::fmt::Display) -> Self {
        Self::Process(format!("Metrics collection failed: {detail}"))
    }

    /// Long, user-facing message for the fatal-report channel.
    pub fn detailed_message(&self) -> String {
        match self {
            Self::EngineNotFound => "Stryker command not found. This usually happens when Stryker is not installed. \
                 The action will attempt to install it automatically, but if this error persists, \
                 please ensure @stryker-mutator/core is installed either globally or as a dev dependency."
                .to_string(),
            Self::ModuleNotFound { detail } => format!(
                "Module not found: {detail}. This usually happens when a required dependency is missing. \
                 Please check your package.json and ensure all required dependencies are installed."
            ),
            other => other.to_string(),
        }
    }
}
