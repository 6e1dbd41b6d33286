//! Gate cycle orchestration: baseline, test run, collection, comparison, persist.

use std::cell::Cell;

use tracing::debug;

use super::config::GateConfig;
use super::engine::MutationEngine;
use super::error::GateError;
use super::metrics::MutationResultSet;
use super::report::Reporter;
use super::store::MetricsStore;

/// Improvement, in score points, above which a cycle is called out.
pub const SIGNIFICANT_IMPROVEMENT: f64 = 10.0;
/// Scores above this are suspicious but accepted.
pub const HIGH_SCORE_WARNING: f64 = 100.0;

/// Position of a gate cycle. Stages only move forward; `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    /// Nothing done yet.
    Idle,
    /// Baseline read and validated.
    BaselineLoaded,
    /// Mutation tests ran to completion.
    TestsExecuted,
    /// Fresh result set collected and validated.
    CurrentCollected,
    /// Scores compared without regression.
    Compared,
    /// New baseline written.
    Persisted,
    /// Cycle finished successfully.
    Done,
    /// Cycle aborted.
    Failed,
}

/// Result of comparing two scores that did not regress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComparison {
    /// `new - old`.
    pub improvement: f64,
    /// True when `improvement` exceeds [`SIGNIFICANT_IMPROVEMENT`].
    pub significant: bool,
}

/// Summary of a successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// Baseline the cycle judged against.
    pub baseline: MutationResultSet,
    /// Result set that became the new baseline.
    pub current: MutationResultSet,
    /// Score comparison.
    pub comparison: ScoreComparison,
}

/// One validation cycle over a metrics store.
pub struct MutationGate<'a> {
    config: &'a GateConfig,
    store: &'a dyn MetricsStore,
    engine: &'a dyn MutationEngine,
    reporter: &'a dyn Reporter,
    stage: Cell<GateStage>,
}

impl<'a> MutationGate<'a> {
    /// Create a gate. `engine` runs the tests; `store` handles baseline and collection.
    pub fn new(
        config: &'a GateConfig,
        store: &'a dyn MetricsStore,
        engine: &'a dyn MutationEngine,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            config,
            store,
            engine,
            reporter,
            stage: Cell::new(GateStage::Idle),
        }
    }

    /// Current stage.
    pub fn stage(&self) -> GateStage {
        self.stage.get()
    }

    fn advance(&self, stage: GateStage) {
        debug!(from = ?self.stage.get(), to = ?stage, "gate stage");
        self.stage.set(stage);
    }

    /// Reject non-finite scores; warn on scores above 100.
    pub fn validate(&self, result: &MutationResultSet) -> Result<(), GateError> {
        if !result.score.is_finite() {
            return Err(GateError::InvalidScore);
        }
        if result.score > HIGH_SCORE_WARNING {
            self.reporter.warning("Unusually high mutation score detected");
        }
        Ok(())
    }

    /// Run the mutation tests, streaming their output.
    ///
    /// Failures are classified and reported through `set_failed` with the
    /// detailed message before being returned.
    pub fn execute_tests(&self) -> Result<(), GateError> {
        self.reporter.info("Running mutation tests...");
        self.engine.run_tests(self.config).map_err(|err| {
            let classified = GateError::classify_test_failure(err.detail().as_deref());
            self.reporter.set_failed(&classified.detailed_message());
            classified
        })
    }

    /// Fail on any decrease; report improvements above the threshold.
    pub fn compare_scores(&self, old: f64, new: f64) -> Result<ScoreComparison, GateError> {
        if new < old {
            return Err(GateError::Regression { old, new });
        }

        let improvement = new - old;
        let significant = improvement > SIGNIFICANT_IMPROVEMENT;
        if significant {
            self.reporter.info(&format!(
                "Significant improvement in mutation score: +{improvement:.2} points!"
            ));
        }
        Ok(ScoreComparison {
            improvement,
            significant,
        })
    }

    /// Emit the tally and, if any, the mutated files.
    pub fn report_details(&self, result: &MutationResultSet) {
        self.reporter.info("Detailed metrics:");
        self.reporter.info(&format!("- Total mutants: {}", result.mutants.total));
        self.reporter.info(&format!("- Killed: {}", result.killed));
        self.reporter.info(&format!("- Survived: {}", result.survived));
        self.reporter.info(&format!("- Timeout: {}", result.timeout));
        self.reporter.info(&format!("- No Coverage: {}", result.no_coverage));

        if !result.mutants.mutated.is_empty() {
            self.reporter.debug("Mutated files:");
            for file in &result.mutants.mutated {
                self.reporter.debug(&format!("  - {file}"));
            }
        }
    }

    /// Run one full cycle.
    ///
    /// Any failure is sent to `set_failed` and returned. The new baseline is
    /// only written once every earlier stage has passed.
    pub fn run(&self) -> Result<GateOutcome, GateError> {
        match self.run_stages() {
            Ok(outcome) => {
                self.advance(GateStage::Done);
                Ok(outcome)
            }
            Err(err) => {
                debug!(stage = ?self.stage.get(), error = %err, "gate cycle failed");
                self.advance(GateStage::Failed);
                self.reporter.set_failed(&err.to_string());
                Err(err)
            }
        }
    }

    fn run_stages(&self) -> Result<GateOutcome, GateError> {
        let baseline = self.store.read_baseline();
        self.validate(&baseline)?;
        self.reporter.info(&format!("Old mutation score: {}", baseline.score));
        self.advance(GateStage::BaselineLoaded);

        self.execute_tests()?;
        self.advance(GateStage::TestsExecuted);

        let current = self.store.collect()?;
        self.validate(&current)?;
        self.reporter.info(&format!("New mutation score: {}", current.score));
        self.advance(GateStage::CurrentCollected);

        let comparison = self.compare_scores(baseline.score, current.score)?;
        self.report_details(&current);
        self.advance(GateStage::Compared);

        self.store
            .persist(&current)
            .map_err(|err| GateError::Persist(err.to_string()))?;
        self.advance(GateStage::Persisted);

        Ok(GateOutcome {
            baseline,
            current,
            comparison,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::gate::engine::EngineError;
    use crate::gate::report::{Level, MemoryReporter};
    use crate::gate::store::StoreError;

    fn result_with_score(score: f64) -> MutationResultSet {
        let mut result = MutationResultSet::zeroed(
            Utc.with_ymd_and_hms(2025, 2, 23, 11, 0, 0)
                .single()
                .expect("fixed instant should be valid"),
        );
        result.score = score;
        result
    }

    struct FakeStore {
        baseline: MutationResultSet,
        current: Result<MutationResultSet, GateError>,
        persisted: RefCell<Vec<MutationResultSet>>,
        fail_persist: bool,
    }

    impl FakeStore {
        fn new(old: f64, new: f64) -> Self {
            Self {
                baseline: result_with_score(old),
                current: Ok(result_with_score(new)),
                persisted: RefCell::new(Vec::new()),
                fail_persist: false,
            }
        }
    }

    impl MetricsStore for FakeStore {
        fn read_baseline(&self) -> MutationResultSet {
            self.baseline.clone()
        }

        fn collect(&self) -> Result<MutationResultSet, GateError> {
            self.current.clone()
        }

        fn persist(&self, result: &MutationResultSet) -> Result<(), StoreError> {
            if self.fail_persist {
                return Err(StoreError::Io {
                    path: "mutation.txt".to_string(),
                    source: std::io::Error::other("read-only file system"),
                });
            }
            self.persisted.borrow_mut().push(result.clone());
            Ok(())
        }
    }

    struct FakeEngine {
        failure: Option<fn() -> EngineError>,
        runs: Cell<usize>,
    }

    impl FakeEngine {
        fn passing() -> Self {
            Self {
                failure: None,
                runs: Cell::new(0),
            }
        }

        fn failing(make: fn() -> EngineError) -> Self {
            Self {
                failure: Some(make),
                runs: Cell::new(0),
            }
        }
    }

    impl MutationEngine for FakeEngine {
        fn run_tests(&self, _config: &GateConfig) -> Result<(), EngineError> {
            self.runs.set(self.runs.get() + 1);
            match self.failure {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }

        fn collect_metrics(&self, _config: &GateConfig) -> Result<String, EngineError> {
            Ok(String::new())
        }
    }

    #[test]
    fn validate_rejects_non_finite_scores() {
        let config = GateConfig::default();
        let store = FakeStore::new(0.0, 0.0);
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                gate.validate(&result_with_score(score)),
                Err(GateError::InvalidScore)
            );
        }
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn validate_warns_only_above_one_hundred() {
        let config = GateConfig::default();
        let store = FakeStore::new(0.0, 0.0);
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        gate.validate(&result_with_score(100.0)).expect("100 is valid");
        assert!(reporter.at(Level::Warning).is_empty());

        gate.validate(&result_with_score(101.0)).expect("101 is tolerated");
        assert_eq!(
            reporter.at(Level::Warning),
            vec!["Unusually high mutation score detected".to_string()]
        );
    }

    #[test]
    fn compare_scores_boundaries() {
        let config = GateConfig::default();
        let store = FakeStore::new(0.0, 0.0);
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let equal = gate.compare_scores(80.0, 80.0).expect("equal scores pass");
        assert!(!equal.significant);

        let exactly_ten = gate.compare_scores(70.0, 80.0).expect("improvement passes");
        assert_eq!(exactly_ten.improvement, 10.0);
        assert!(!exactly_ten.significant);
        assert!(reporter.at(Level::Info).is_empty());

        let negative = gate.compare_scores(-20.0, -5.0).expect("improvement passes");
        assert!(negative.significant);
        assert!(reporter.contains(
            Level::Info,
            "Significant improvement in mutation score: +15.00 points!"
        ));

        assert_eq!(
            gate.compare_scores(80.0, 79.99),
            Err(GateError::Regression {
                old: 80.0,
                new: 79.99
            })
        );
    }

    #[test]
    fn report_details_skips_empty_file_section() {
        let config = GateConfig::default();
        let store = FakeStore::new(0.0, 0.0);
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let mut result = result_with_score(85.0);
        result.mutants.total = 105;
        result.killed = 90;
        result.survived = 10;
        result.timeout = 2;
        result.no_coverage = 3;
        gate.report_details(&result);

        assert_eq!(
            reporter.at(Level::Info),
            vec![
                "Detailed metrics:",
                "- Total mutants: 105",
                "- Killed: 90",
                "- Survived: 10",
                "- Timeout: 2",
                "- No Coverage: 3",
            ]
        );
        assert!(reporter.at(Level::Debug).is_empty());

        result.mutants.mutated = vec!["src/b.ts".to_string(), "src/a.ts".to_string()];
        gate.report_details(&result);
        assert_eq!(
            reporter.at(Level::Debug),
            vec!["Mutated files:", "  - src/b.ts", "  - src/a.ts"]
        );
    }

    #[test]
    fn run_persists_after_successful_comparison() {
        let config = GateConfig::default();
        let store = FakeStore::new(80.0, 85.0);
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let outcome = gate.run().expect("cycle should pass");
        assert_eq!(outcome.comparison.improvement, 5.0);
        assert!(!outcome.comparison.significant);
        assert_eq!(gate.stage(), GateStage::Done);
        assert_eq!(engine.runs.get(), 1);
        assert_eq!(store.persisted.borrow().len(), 1);
        assert!(reporter.contains(Level::Info, "Old mutation score: 80"));
        assert!(reporter.contains(Level::Info, "New mutation score: 85"));
        assert!(!reporter.has_failed());
    }

    #[test]
    fn run_regression_never_persists() {
        let config = GateConfig::default();
        let store = FakeStore::new(80.0, 75.0);
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let err = gate.run().expect_err("regression should fail");
        assert_eq!(
            err.to_string(),
            "Tests failed: mutation score has decreased from 80 to 75"
        );
        assert_eq!(gate.stage(), GateStage::Failed);
        assert!(store.persisted.borrow().is_empty());
        assert_eq!(
            reporter.at(Level::Failed),
            vec!["Tests failed: mutation score has decreased from 80 to 75".to_string()]
        );
    }

    #[test]
    fn invalid_baseline_stops_before_tests() {
        let config = GateConfig::default();
        let mut store = FakeStore::new(0.0, 85.0);
        store.baseline.score = f64::NAN;
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        assert_eq!(gate.run(), Err(GateError::InvalidScore));
        assert_eq!(engine.runs.get(), 0);
        assert!(reporter.contains(Level::Failed, "Invalid score value in metrics"));
    }

    #[test]
    fn engine_not_found_reports_detail_then_short_form() {
        let config = GateConfig::default();
        let store = FakeStore::new(80.0, 85.0);
        let engine = FakeEngine::failing(|| EngineError::MissingProgram {
            program: "stryker".to_string(),
        });
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let err = gate.run().expect_err("missing engine should fail");
        assert_eq!(err, GateError::EngineNotFound);
        let failures = reporter.at(Level::Failed);
        assert_eq!(failures.len(), 2);
        assert!(failures[0].starts_with("Stryker command not found. This usually happens"));
        assert_eq!(failures[1], "Stryker command not found");
        assert_eq!(gate.stage(), GateStage::Failed);
        assert!(store.persisted.borrow().is_empty());
    }

    #[test]
    fn silent_test_failure_is_unknown_error() {
        let config = GateConfig::default();
        let store = FakeStore::new(80.0, 85.0);
        let engine = FakeEngine::failing(|| EngineError::NoDiagnostic {
            command: "npm run test:mutation".to_string(),
        });
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let err = gate.execute_tests().expect_err("test run should fail");
        assert_eq!(err.to_string(), "Test execution failed: unknown error");
        assert!(reporter.contains(Level::Failed, "Test execution failed: unknown error"));
    }

    #[test]
    fn persist_failure_is_wrapped() {
        let config = GateConfig::default();
        let mut store = FakeStore::new(80.0, 85.0);
        store.fail_persist = true;
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let err = gate.run().expect_err("persist should fail");
        assert_eq!(
            err.to_string(),
            "Failed to save metrics: mutation.txt: read-only file system"
        );
        assert_eq!(gate.stage(), GateStage::Failed);
    }

    #[test]
    fn collection_failure_aborts_after_tests() {
        let config = GateConfig::default();
        let mut store = FakeStore::new(80.0, 85.0);
        store.current = Err(GateError::Parse("engine produced no output".to_string()));
        let engine = FakeEngine::passing();
        let reporter = MemoryReporter::default();
        let gate = MutationGate::new(&config, &store, &engine, &reporter);

        let err = gate.run().expect_err("collection should fail");
        assert!(matches!(err, GateError::Parse(_)));
        assert_eq!(engine.runs.get(), 1);
        assert!(!reporter.contains(Level::Info, "New mutation score: 85"));
    }
}
