use std::sync::Arc;

use codesentry_detectors::{Detector, MockLLMProvider, ScanEngine, Severity};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("codesentry_detectors=debug")
        .with_test_writer()
        .try_init();
}

/// Nine-line vulnerable lookup, concatenated query on line 7.
const VULNERABLE_SQL: &str = r#"import sqlite3

def get_user_by_id(user_id):
    """Look up one user."""
    conn = sqlite3.connect('users.db')
    cursor = conn.cursor()
    query = "SELECT * FROM users WHERE id = '" + user_id + "'"
    cursor.execute(query)
    return cursor.fetchone()
"#;

fn injection_reply() -> serde_json::Value {
    json!(
        "[{\"vulnerability_type\":\"SQL Injection\",\"severity\":\"CRITICAL\",\"line_number\":7,\"code_snippet\":\"query = \\\"SELECT * FROM users WHERE id = '\\\" + user_id + \\\"'\\\"\",\"explanation\":\"User input is concatenated directly into the SQL statement\",\"fix_suggestion\":\"Use a parameterized query\",\"confidence\":0.97}]"
    )
}

#[tokio::test]
async fn test_injection_scenario_reports_line_seven_critical() {
    init_tracing();

    let provider = Arc::new(MockLLMProvider::new().with_reply("sql injection", injection_reply()));
    let engine = ScanEngine::new(provider);

    let report = engine
        .scan(VULNERABLE_SQL, "vulnerable-sql.py", "python")
        .await
        .unwrap();

    assert_eq!(report.summary().total, 1);
    let finding = &report.findings()[0];
    assert_eq!(finding.line_number, 7);
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.vulnerability_type, "SQL Injection");
}

#[tokio::test]
async fn test_empty_source_short_circuits_every_detector() {
    init_tracing();

    let provider = Arc::new(MockLLMProvider::new());
    let engine = ScanEngine::new(provider.clone());

    let report = engine.scan("   \n\n\t", "blank.py", "python").await.unwrap();

    assert!(report.is_empty());
    assert_eq!(report.summary().total, 0);
    assert_eq!(provider.call_count(), 0, "no detector may invoke the model");
}

#[tokio::test]
async fn test_merged_output_is_sorted_regardless_of_completion_order() {
    init_tracing();

    // Detector replies carry deliberately interleaved line numbers.
    let provider = Arc::new(
        MockLLMProvider::new()
            .with_reply(
                "sql injection",
                json!("[{\"vulnerability_type\":\"SQL Injection\",\"severity\":\"HIGH\",\"line_number\":12,\"code_snippet\":\"a\",\"explanation\":\"e\",\"fix_suggestion\":\"f\",\"confidence\":0.9},{\"vulnerability_type\":\"SQL Injection\",\"severity\":\"HIGH\",\"line_number\":2,\"code_snippet\":\"b\",\"explanation\":\"e\",\"fix_suggestion\":\"f\",\"confidence\":0.9}]"),
            )
            .with_reply(
                "cross-site scripting",
                json!("[{\"vulnerability_type\":\"Cross-Site Scripting\",\"severity\":\"MEDIUM\",\"line_number\":8,\"code_snippet\":\"c\",\"explanation\":\"e\",\"fix_suggestion\":\"f\",\"confidence\":0.7}]"),
            )
            .with_reply(
                "hardcoded secret",
                json!("[{\"vulnerability_type\":\"Hardcoded Secret\",\"severity\":\"LOW\",\"line_number\":5,\"code_snippet\":\"d\",\"explanation\":\"e\",\"fix_suggestion\":\"f\",\"confidence\":0.5}]"),
            ),
    );

    let engine = ScanEngine::new(provider);
    let report = engine.scan("code", "mixed.py", "python").await.unwrap();

    let lines: Vec<u32> = report.findings().iter().map(|f| f.line_number).collect();
    assert_eq!(lines, vec![2, 5, 8, 12]);
    assert_eq!(report.summary().by_severity.high, 2);
    assert_eq!(report.summary().by_severity.medium, 1);
    assert_eq!(report.summary().by_severity.low, 1);
}

#[tokio::test]
async fn test_single_detector_failure_fails_the_whole_scan() {
    init_tracing();

    let provider = Arc::new(MockLLMProvider::failing());
    let engine = ScanEngine::new(provider);

    let result = engine.scan("code", "app.py", "python").await;
    assert!(result.is_err(), "all-or-nothing join must surface the failure");
}

#[tokio::test]
async fn test_prose_only_replies_yield_a_clean_empty_report() {
    init_tracing();

    let provider = Arc::new(
        MockLLMProvider::new().with_default_reply(json!("I cannot find any issues.")),
    );
    let engine = ScanEngine::new(provider);

    let report = engine.scan("print('ok')", "clean.py", "python").await.unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_truncated_reply_recovers_complete_findings_end_to_end() {
    init_tracing();

    let truncated = "[\
        {\"vulnerability_type\":\"Hardcoded Secret\",\"severity\":\"CRITICAL\",\"line_number\":3,\"code_snippet\":\"API_KEY = \\\"sk-live\\\"\",\"explanation\":\"live key\",\"fix_suggestion\":\"env var\",\"confidence\":0.95},\
        {\"vulnerability_type\":\"Hardcoded Secret\",\"severity\":\"HIGH\",\"line_number\":9,\"code_snippet\":\"pw\",\"explanation\":\"password\",\"fix_suggestion\":\"env var\",\"confidence\":0.9},\
        {\"vulnerability_type\":\"Hardcoded Sec";

    let provider = Arc::new(
        MockLLMProvider::new().with_reply("hardcoded secret", json!(truncated)),
    );
    let engine = ScanEngine::new(provider);

    let report = engine.scan("creds", "creds.py", "python").await.unwrap();
    assert_eq!(report.summary().by_detector.secret_exposure, 2);
    let lines: Vec<u32> = report.findings().iter().map(|f| f.line_number).collect();
    assert_eq!(lines, vec![3, 9]);
}

#[tokio::test]
async fn test_nested_transport_shape_resolves_end_to_end() {
    init_tracing();

    // Reply text buried one level deep under transport keys.
    let provider = Arc::new(MockLLMProvider::new().with_reply(
        "cross-site scripting",
        json!({
            "message": {
                "content": "[{\"vulnerability_type\":\"Cross-Site Scripting\",\"severity\":\"HIGH\",\"line_number\":4,\"code_snippet\":\"html\",\"explanation\":\"unescaped\",\"fix_suggestion\":\"escape\",\"confidence\":0.8}]"
            }
        }),
    ));
    let engine = ScanEngine::new(provider);

    let report = engine.scan("html = name", "view.py", "python").await.unwrap();
    assert_eq!(report.summary().by_detector.cross_site_scripting, 1);
    assert_eq!(report.findings()[0].line_number, 4);
}

#[tokio::test]
async fn test_detector_instances_differ_only_by_category_default() {
    init_tracing();

    // A stub candidate with no vulnerability_type takes each detector's own
    // default category.
    let stub = json!("[{\"line_number\": 6, \"explanation\": \"anonymous finding\"}]");
    let provider = Arc::new(MockLLMProvider::new().with_default_reply(stub));

    for (detector, expected) in [
        (Detector::injection(provider.clone()), "SQL Injection"),
        (
            Detector::cross_site_scripting(provider.clone()),
            "Cross-Site Scripting",
        ),
        (Detector::secret_exposure(provider.clone()), "Hardcoded Secret"),
    ] {
        let findings = detector.detect("x = 1", "a.py", "python").await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].vulnerability_type, expected);
        assert_eq!(findings[0].severity, Severity::High);
    }
}
