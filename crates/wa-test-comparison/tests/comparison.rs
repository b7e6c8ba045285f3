//! Integration tests running the harness against stored fixtures
//!
//! The executor below stands in for the analytics API: its output embeds the
//! current time and a per-run visitor id, which normalization must strip
//! before the comparison with `tests/data/expected/` can pass.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use wa_normalize::{DiffCategory, NormalizeError, NormalizeOptions, RequestParams};
use wa_test_comparison::config::ComparisonConfig;
use wa_test_comparison::harness::{init_tracing, TestHarness};
use wa_test_comparison::suite::{ApiTestCase, ApiTestSuite};
use wa_test_comparison::{FixtureError, HarnessError};

const EXPECTED_FIXTURES: &[(&str, &str)] = &[
    (
        "VisitsSummaryTest__VisitsSummary.get_day.xml",
        include_str!("data/expected/VisitsSummaryTest__VisitsSummary.get_day.xml"),
    ),
    (
        "VisitsSummaryTest__Live.getLastVisitsDetails_day.xml",
        include_str!("data/expected/VisitsSummaryTest__Live.getLastVisitsDetails_day.xml"),
    ),
    (
        "VisitsSummaryTest__Referrers.getKeywordsFromSearchEngineId_day.csv",
        include_str!("data/expected/VisitsSummaryTest__Referrers.getKeywordsFromSearchEngineId_day.csv"),
    ),
];

const VISITS_SUMMARY: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<result><nb_visits>2</nb_visits><nb_actions>5</nb_actions><sum_visit_length>1260</sum_visit_length><revenue>10.00</revenue></result>\n";

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

fn setup_fixtures() -> (TempDir, ComparisonConfig) {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = ComparisonConfig::with_test_dir(dir.path());
    fs::create_dir_all(config.expected_dir()).unwrap();
    for (name, contents) in EXPECTED_FIXTURES {
        fs::write(config.expected_dir().join(name), contents).unwrap();
    }
    (dir, config)
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Fake analytics API whose output changes on every call
fn analytics_api(method: &str, _params: &RequestParams) -> anyhow::Result<Vec<u8>> {
    let ts = now();
    let body = match method {
        "VisitsSummary.get" => VISITS_SUMMARY.to_string(),
        "Live.getLastVisitsDetails" => format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n<result>\n\t<row>\n\t\t<idSite>1</idSite>\n\t\t<visitIp>156.5.3.2</visitIp>\n\t\t<visitorId>{:016x}</visitorId>\n\t\t<visitorType>new</visitorType>\n\t\t<serverTimestamp>{}</serverTimestamp>\n\t\t<latitude>48.000000</latitude>\n\t</row>\n</result>\n",
            ts.wrapping_mul(2_654_435_761),
            ts
        ),
        "Referrers.getKeywordsFromSearchEngineId" => format!(
            "label,nb_visits,url\npiwik,3,index.php?module=API&date={}%2C{}&idSubtable=12\n",
            ts - 7 * 86_400,
            ts
        ),
        other => anyhow::bail!("unknown method {other}"),
    };
    Ok(body.into_bytes())
}

fn visits_summary_case() -> ApiTestCase {
    ApiTestCase::new(
        "VisitsSummaryTest",
        "VisitsSummary.get",
        RequestParams::new()
            .with("idSite", 1)
            .with("date", "2010-01-03")
            .with("period", "day"),
    )
}

#[test]
fn test_suite_matches_expected_fixtures() {
    let (_dir, config) = setup_fixtures();
    let suite = ApiTestSuite::load(data_dir().join("suite.yaml")).unwrap();
    let mut harness = TestHarness::with_files(config.clone(), analytics_api);

    harness.run_suite(&suite).unwrap();
    harness.print_summary();

    assert_eq!(harness.results().len(), 3);
    assert!(harness.all_passed());

    for (name, _) in EXPECTED_FIXTURES {
        assert!(config.processed_dir().join(name).exists(), "{name} not saved");
    }
    let live = fs::read_to_string(
        config
            .processed_dir()
            .join("VisitsSummaryTest__Live.getLastVisitsDetails_day.xml"),
    )
    .unwrap();
    assert!(!live.contains("visitorId"));
    assert!(!live.contains("serverTimestamp"));
    assert!(live.contains("<latitude>48</latitude>"));
}

#[test]
fn test_changed_value_fails_with_location() {
    let (_dir, config) = setup_fixtures();
    let api = |_: &str, _: &RequestParams| -> anyhow::Result<Vec<u8>> {
        Ok(VISITS_SUMMARY
            .replace("<nb_visits>2", "<nb_visits>3")
            .into_bytes())
    };
    let mut harness = TestHarness::with_files(config.clone(), api);

    let result = harness.run_case(&visits_summary_case()).unwrap();
    assert!(!result.passed());
    let failure = result.verdict.failure().unwrap();
    assert_eq!(failure.difference.category, DiffCategory::Text);
    assert_eq!(failure.difference.path, "/result/nb_visits[1]/text()[1]");
    assert_eq!(failure.difference.expected, "2");
    assert_eq!(failure.difference.actual, "3");
    assert_eq!(
        failure.message.as_deref(),
        Some("VisitsSummaryTest__VisitsSummary.get (day)")
    );

    let processed = fs::read_to_string(&result.processed_path).unwrap();
    assert!(processed.contains("<nb_visits>3</nb_visits>"));
    assert!(!harness.all_passed());
}

#[test]
fn test_missing_expected_fixture_propagates() {
    let (_dir, config) = setup_fixtures();
    let mut harness = TestHarness::with_files(config.clone(), analytics_api);
    let case = ApiTestCase::new(
        "NewTest",
        "VisitsSummary.get",
        RequestParams::new().with("date", "2010-01-03"),
    );

    let err = harness.run_case(&case).unwrap_err();
    match err {
        HarnessError::Fixture(FixtureError::Missing { path }) => {
            assert_eq!(path, config.expected_path(&case));
        }
        other => panic!("unexpected error: {other}"),
    }

    // The processed output is kept so it can become the new baseline
    let processed = fs::read_to_string(config.processed_path(&case)).unwrap();
    assert!(processed.contains("<revenue>10</revenue>"));
    assert!(harness.results().is_empty());
}

#[test]
fn test_over_removal_aborts_case() {
    let (_dir, config) = setup_fixtures();
    let mut harness = TestHarness::with_files(config, analytics_api);
    let case =
        visits_summary_case().with_options(NormalizeOptions::new().remove_field("result"));

    let err = harness.run_case(&case).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Normalize(NormalizeError::OverRemoval { .. })
    ));
    assert!(harness.results().is_empty());
}

#[test]
fn test_executor_failure_propagates() {
    let (_dir, config) = setup_fixtures();
    let mut harness = TestHarness::with_files(config, analytics_api);
    let case = ApiTestCase::new("VisitsSummaryTest", "Nope.get", RequestParams::new());

    let err = harness.run_case(&case).unwrap_err();
    assert_eq!(err.to_string(), "request Nope.get failed: unknown method Nope.get");
}

#[test]
fn test_literal_format_is_byte_exact() {
    let (_dir, config) = setup_fixtures();
    let api = |_: &str, _: &RequestParams| -> anyhow::Result<Vec<u8>> {
        // Trailing newline missing compared to the stored fixture
        Ok(b"label,nb_visits,url\npiwik,3,index.php?module=API&date=&idSubtable=".to_vec())
    };
    let mut harness = TestHarness::with_files(config, api);
    let case = ApiTestCase::new(
        "VisitsSummaryTest",
        "Referrers.getKeywordsFromSearchEngineId",
        RequestParams::new()
            .with("date", "last7")
            .with("idSubtable", 4)
            .with("format", "csv")
            .with("period", "day"),
    );

    let result = harness.run_case(&case).unwrap();
    let failure = result.verdict.failure().unwrap();
    assert_eq!(failure.difference.category, DiffCategory::Length);
}
