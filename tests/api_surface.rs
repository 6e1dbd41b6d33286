use mutation_gate::prelude::*;

#[test]
fn prelude_exports_gate_building_blocks() {
    let config = GateConfig::default();
    assert!(config.metrics_path().ends_with("mutation-metrics.json"));
    assert_eq!(
        CommandSpec::parse("npm run test:mutation").map(|spec| spec.to_string()),
        Some("npm run test:mutation".to_string())
    );

    let zero = MutationResultSet::zeroed(SystemClock.now());
    assert_eq!(zero.score, 0.0);
    assert_eq!(GateError::InvalidScore.to_string(), "Invalid score value in metrics");
}
