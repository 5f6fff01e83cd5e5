// SPDX-License-Identifier: MPL-2.0

use solvent::scenario::{Scenario, ScenarioError};

#[test]
fn full_grammar_scenario_resolves() {
    let scenario = Scenario::from_json(
        r#"{
            "packages": [
                {"name": "root", "versions": ["1.0.0"]},
                {"name": "web", "versions": ["1.0.0", "1.4.0", "2.0.0"]},
                {"name": "json", "versions": ["0.9.0", "1.2.0", "1.2.5", "1.3.0"]},
                {"name": "log", "versions": ["0.4.0", "0.4.9", "0.5.0"]}
            ],
            "dependencies": [
                {"package": "root", "version": "1.0.0", "dependency": "web", "constraint": "^1.0.0"},
                {"package": "web", "version": "1.4.0", "dependency": "json", "constraint": ">=1.2.0, <1.3.0"},
                {"package": "web", "version": "1.4.0", "dependency": "log", "constraint": "~0.4.0"},
                {"package": "json", "version": "1.2.5", "dependency": "log", "constraint": "*"}
            ]
        }"#,
    )
    .unwrap();

    let report = scenario.resolve("root", "1.0.0");
    assert!(report.success, "error: {:?}", report.error);
    let solution = report.solution.unwrap();
    // ^1.0.0 keeps web below 2.0.0; the newest match is 1.4.0.
    assert_eq!(solution["web"], "1.4.0");
    // >=1.2.0, <1.3.0 picks the newest patch of the 1.2 line.
    assert_eq!(solution["json"], "1.2.5");
    // ~0.4.0 stays below 0.5.0.
    assert_eq!(solution["log"], "0.4.9");
    assert_eq!(solution["root"], "1.0.0");
}

#[test]
fn failing_scenario_reports_a_derivation() {
    let scenario = Scenario::from_json(
        r#"{
            "packages": [
                {"name": "root", "versions": ["1.0.0"]},
                {"name": "a", "versions": ["1.0.0"]},
                {"name": "b", "versions": ["1.0.0"]}
            ],
            "dependencies": [
                {"package": "root", "version": "1.0.0", "dependency": "a", "constraint": "1.0.0"},
                {"package": "root", "version": "1.0.0", "dependency": "b", "constraint": "1.0.0"},
                {"package": "a", "version": "1.0.0", "dependency": "b", "constraint": ">=2.0.0"}
            ]
        }"#,
    )
    .unwrap();

    let report = scenario.resolve("root", "1.0.0");
    assert!(!report.success);
    assert!(report.solution.is_none());
    let error = report.error.expect("a failure needs an explanation");
    assert!(error.contains("b"), "derivation does not mention b: {}", error);
}

#[test]
fn bad_constraint_surfaces_before_resolution() {
    let scenario = Scenario::from_json(
        r#"{
            "packages": [
                {"name": "root", "versions": ["1.0.0"]},
                {"name": "a", "versions": ["1.0.0"]}
            ],
            "dependencies": [
                {"package": "root", "version": "1.0.0", "dependency": "a", "constraint": "=>1.0.0"}
            ]
        }"#,
    )
    .unwrap();

    match scenario.oracle("root") {
        Err(ScenarioError::Constraint {
            package,
            dependency,
            ..
        }) => {
            assert_eq!(package, "root");
            assert_eq!(dependency, "a");
        }
        other => panic!("expected a constraint error, got {:?}", other),
    }

    // The report shape carries the same failure.
    let report = scenario.resolve("root", "1.0.0");
    assert!(!report.success);
    assert!(report.error.unwrap().contains("a"));
}

#[test]
fn scenario_roundtrips_through_json() {
    let scenario = Scenario::from_json(
        r#"{
            "packages": [{"name": "root", "versions": ["1.0.0"]}],
            "dependencies": []
        }"#,
    )
    .unwrap();
    let json = serde_json::to_string(&scenario).unwrap();
    let back = Scenario::from_json(&json).unwrap();
    assert_eq!(back.packages.len(), 1);
    assert_eq!(back.packages[0].name, "root");
}
