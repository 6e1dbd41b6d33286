//! Mutation score quality gate.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod store;
pub mod stryker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CommandSpec, GateConfig};
pub use engine::{CommandEngine, EngineError, MutationEngine};
pub use error::GateError;
pub use metrics::{MutantSummary, MutationResultSet};
pub use report::{
    ActionsReporter, Level, MemoryReporter, ReportFormat, Reporter, TracingReporter,
    render_result_set,
};
pub use runner::{GateOutcome, GateStage, MutationGate, ScoreComparison};
pub use store::{FileMetricsStore, MetricsStore, StoreError, load_baseline};
pub use stryker::{ExtractError, MetricsPayload, extract_from_project, extract_metrics};
