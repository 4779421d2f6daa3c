//! Cross-module properties of the resolve -> extract -> normalize chain.

use codesentry_detectors::core::{Finding, Severity};
use codesentry_detectors::llm::{extract_candidates, normalize, resolve_text, ExtractionStage};
use serde_json::{json, Value};
use std::collections::BTreeSet;

const CLEAN_ARRAY: &str = r#"[{"vulnerability_type":"SQL Injection","severity":"CRITICAL","line_number":7,"code_snippet":"q","explanation":"e","fix_suggestion":"f","confidence":0.95},{"vulnerability_type":"SQL Injection","severity":"HIGH","line_number":11,"code_snippet":"q2","explanation":"e2","fix_suggestion":"f2","confidence":0.8}]"#;

#[test]
fn test_direct_parse_equals_structural_parse() {
    let extraction = extract_candidates(CLEAN_ARRAY);
    assert_eq!(extraction.stage, ExtractionStage::Direct);
    assert!(extraction.recovered.is_empty(), "no repair side effects");

    let direct: Vec<Value> = serde_json::from_str(CLEAN_ARRAY).unwrap();
    assert_eq!(extraction.candidates, direct);
}

#[test]
fn test_truncation_keeps_no_fewer_than_complete_objects() {
    // Cut the clean array mid second object: exactly one complete object
    // remains before the truncation point.
    let cut = &CLEAN_ARRAY[..CLEAN_ARRAY.find("\"line_number\":11").unwrap() + 5];
    let extraction = extract_candidates(cut);
    assert!(
        extraction.candidates.len() >= 1,
        "complete objects before the cut must survive"
    );
    assert_eq!(extraction.candidates[0]["line_number"], 7);
}

#[test]
fn test_recovery_covers_all_textually_signaled_lines() {
    // One healthy object, one mangled object, one loose fragment. Every
    // line number textually present must be represented in the output.
    let mangled = r#"[
        {"vulnerability_type":"X","severity":"HIGH","line_number":4,"code_snippet":"a","explanation":"ok","fix_suggestion":"f","confidence":0.9},
        {"vulnerability_type":"X","severity":oops,"line_number":13,"code_snippet":"b","explanation":"broken sibling","fix_suggestion":"f","confidence":0.9},
        "line_number": 27, "explanation": "loose tail"
    "#;

    let extraction = extract_candidates(mangled);
    let lines: BTreeSet<u64> = extraction
        .candidates
        .iter()
        .filter_map(|c| c.get("line_number").and_then(Value::as_u64))
        .collect();

    for signaled in [4u64, 13, 27] {
        assert!(lines.contains(&signaled), "line {signaled} was lost");
    }
}

#[test]
fn test_recovered_stubs_normalize_into_valid_findings() {
    let mangled = r#"[
        {"vulnerability_type":"Cross-Site Scripting","severity":broken,"line_number":17,"code_snippet":"html += q","explanation":"Unescaped parameter","fix_suggestion":"escape","confidence":0.8}
    ]"#;

    let extraction = extract_candidates(mangled);
    assert!(!extraction.recovered.is_empty());

    for candidate in &extraction.candidates {
        let finding = normalize(candidate, "Cross-Site Scripting")
            .expect("stub candidates carry a line number, so they are not noise");
        assert!((0.0..=1.0).contains(&finding.confidence));
        assert_eq!(finding.severity, Severity::High, "stub takes the fixed fallback");
    }
}

#[test]
fn test_normalizer_is_idempotent_over_the_wire_format() {
    let extraction = extract_candidates(CLEAN_ARRAY);
    for candidate in &extraction.candidates {
        let first = normalize(candidate, "SQL Injection").unwrap();
        let second = normalize(&serde_json::to_value(&first).unwrap(), "SQL Injection").unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_severity_and_confidence_closure_for_hostile_inputs() {
    let hostile = json!([
        { "vulnerability_type": "A", "severity": null, "confidence": null },
        { "vulnerability_type": "B", "severity": "ULTRA", "confidence": -3.0 },
        { "vulnerability_type": "C", "severity": 9, "confidence": 42.0 },
        { "vulnerability_type": "D", "severity": "low", "confidence": "0.2" }
    ]);

    for candidate in hostile.as_array().unwrap() {
        let finding = normalize(candidate, "X").unwrap();
        assert!((0.0..=1.0).contains(&finding.confidence));
        assert!(matches!(
            finding.severity,
            Severity::Critical | Severity::High | Severity::Medium | Severity::Low
        ));
    }
}

#[test]
fn test_resolver_feeds_extractor_across_reply_shapes() {
    let shapes = [
        json!(CLEAN_ARRAY),
        json!({ "content": CLEAN_ARRAY }),
        json!({ "result": { "text": CLEAN_ARRAY } }),
    ];

    for shape in &shapes {
        let text = resolve_text(shape).expect("shape should resolve");
        let extraction = extract_candidates(&text);
        assert_eq!(extraction.candidates.len(), 2, "shape {shape}");
    }
}

#[test]
fn test_refusal_text_is_zero_findings_not_an_error() {
    let text = resolve_text(&json!("I cannot find any issues.")).unwrap();
    let extraction = extract_candidates(&text);
    assert_eq!(extraction.stage, ExtractionStage::Empty);
    assert!(extraction.candidates.is_empty());
}

#[test]
fn test_canonical_finding_round_trips_through_serde() {
    let finding = Finding::new("Hardcoded Secret", Severity::Critical)
        .with_line(3)
        .with_snippet("API_KEY = \"sk-live\"")
        .with_explanation("live credential committed")
        .with_fix("read it from the environment")
        .with_confidence(0.92);

    let json = serde_json::to_string(&finding).unwrap();
    let back: Finding = serde_json::from_str(&json).unwrap();
    assert_eq!(back, finding);
}
