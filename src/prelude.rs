//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use mutation_gate::prelude::*;
//! ```

pub use crate::gate::{
    Clock, CommandEngine, CommandSpec, FileMetricsStore, GateConfig, GateError, GateOutcome,
    GateStage, MetricsStore, MutationEngine, MutationGate, MutationResultSet, Reporter,
    SystemClock,
};
