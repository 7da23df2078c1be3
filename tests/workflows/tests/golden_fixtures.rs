use std::fs;

use pkgtest_core::{
    FixtureError, FixtureMode, ResultComparator, TestResult, fixture::expected_result_path,
};
use serde_json::json;
use tests_workflows::PackageTree;

fn access_events() -> TestResult {
    TestResult::new(vec![
        json!({"source": {"ip": "10.0.0.1"}, "http": {"request": {"method": "GET"}, "response": {"status_code": 200}}}),
        json!({"source": {"ip": "10.0.0.2"}, "http": {"request": {"method": "POST"}, "response": {"status_code": 404}}}),
    ])
}

#[test]
fn recording_twice_is_byte_identical_and_verifies() {
    let tree = PackageTree::new("apache").unwrap();
    let test_case = tree
        .write("data_stream/access/_dev/test/pipeline/test-access.log", "")
        .unwrap();
    let generate = ResultComparator::new(FixtureMode::Generate);

    let fixture = generate.record(&test_case, &access_events()).unwrap();
    let first = fs::read(&fixture).unwrap();
    generate.record(&test_case, &access_events()).unwrap();
    let second = fs::read(&fixture).unwrap();

    assert_eq!(fixture, expected_result_path(&test_case));
    assert_eq!(first, second);
    assert!(String::from_utf8(first).unwrap().starts_with("{\n    \"expected\": ["));

    let verify = ResultComparator::new(FixtureMode::Verify);
    assert!(verify.verify(&test_case, &access_events()).unwrap().is_equal());
    verify.check(&test_case, &access_events()).unwrap();
}

#[test]
fn verifying_without_fixture_creates_nothing() {
    let tree = PackageTree::new("apache").unwrap();
    let test_case = tree
        .write("data_stream/access/_dev/test/pipeline/test-error.log", "")
        .unwrap();

    let err = ResultComparator::new(FixtureMode::Verify)
        .check(&test_case, &access_events())
        .unwrap_err();

    assert!(matches!(err, FixtureError::Missing { .. }));
    assert!(!expected_result_path(&test_case).exists());
}

#[test]
fn reordered_events_are_a_mismatch() {
    let tree = PackageTree::new("apache").unwrap();
    let test_case = tree
        .write("data_stream/access/_dev/test/pipeline/test-access.log", "")
        .unwrap();
    ResultComparator::new(FixtureMode::Generate)
        .record(&test_case, &access_events())
        .unwrap();

    let mut reordered = access_events();
    reordered.events.reverse();
    let err = ResultComparator::new(FixtureMode::Verify)
        .check(&test_case, &reordered)
        .unwrap_err();

    match err {
        FixtureError::Mismatch { comparison, .. } => {
            assert_eq!(comparison.diffs().len(), 2);
            assert_eq!(comparison.diffs()[0].index, 0);
        }
        other => panic!("expected a mismatch, got {other}"),
    }
}
