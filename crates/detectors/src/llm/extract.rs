//! Layered, fault-tolerant extraction of finding candidates from resolved
//! model text.
//!
//! Model output is asked to be a single compact JSON array, but arrives
//! wrapped in prose or markdown, truncated by output-length limits, or with
//! individual objects mangled. Stages escalate strictly: each is attempted
//! only when the previous one failed to produce a usable array, and each
//! trades precision for recall. Over-recovery (a stub candidate with a vague
//! explanation) is preferred to silently dropping a signaled vulnerability.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Which stage produced the candidate array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    /// Stage 3: the trimmed text parsed directly as an array.
    Direct,
    /// Stage 4: the text was truncated mid-array and repaired at the last
    /// complete object boundary.
    TruncationRepair,
    /// Stage 5 (possibly augmented by stage 6): objects were recovered
    /// one by one.
    ObjectRecovery,
    /// Nothing recoverable.
    Empty,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    /// Raw candidates in text order, pre-normalization. Includes `recovered`.
    pub candidates: Vec<Value>,
    /// Stub candidates synthesized by line-number reconciliation, kept
    /// separately for observability and tests.
    pub recovered: Vec<Value>,
    pub stage: ExtractionStage,
}

impl Extraction {
    fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            recovered: Vec::new(),
            stage: ExtractionStage::Empty,
        }
    }
}

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fenced block pattern"));

static OBJECT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\{\s*"vulnerability_type"\s*:\s*"(?:[^"\\]|\\.)*".*?\}"#)
        .expect("object pattern")
});

static LINE_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""line_number"\s*:\s*"?(\d+)"?"#).expect("line number pattern"));

static EXPLANATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""explanation"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("explanation pattern")
});

pub fn extract_candidates(text: &str) -> Extraction {
    // Stage 1: markdown unwrap.
    let unwrapped = unwrap_fenced_block(text);

    // Stage 2: array boundary trim. No opener means nothing recoverable.
    let Some(start) = unwrapped.find('[') else {
        debug!(stage = "boundary_trim", "no array opener in resolved text");
        return Extraction::empty();
    };
    let trimmed = &unwrapped[start..];

    // Stage 3: direct parse. The fast, common path.
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        debug!(stage = "direct", candidates = items.len(), "parsed findings array");
        return Extraction {
            candidates: items,
            recovered: Vec::new(),
            stage: ExtractionStage::Direct,
        };
    }

    // Stage 4: truncation repair. Cut at the last complete object boundary
    // and close the array.
    if !trimmed.trim_end().ends_with(']') {
        if let Some(end) = trimmed.rfind('}') {
            let repaired = format!("{}]", &trimmed[..=end]);
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&repaired) {
                warn!(
                    stage = "truncation_repair",
                    candidates = items.len(),
                    dropped_tail_bytes = trimmed.len() - end - 1,
                    "repaired truncated findings array"
                );
                return Extraction {
                    candidates: items,
                    recovered: Vec::new(),
                    stage: ExtractionStage::TruncationRepair,
                };
            }
        }
    }

    // Stage 5: per-object recovery. A malformed object must not take its
    // siblings with it.
    let mut candidates: Vec<Value> = Vec::new();
    for matched in OBJECT_PATTERN.find_iter(unwrapped) {
        match serde_json::from_str::<Value>(matched.as_str()) {
            Ok(candidate @ Value::Object(_)) => candidates.push(candidate),
            _ => debug!(stage = "object_recovery", "skipping unparsable object candidate"),
        }
    }
    debug!(stage = "object_recovery", candidates = candidates.len(), "scanned for standalone objects");

    // Stage 6: line-number reconciliation over the entire raw text. A single
    // malformed field must not make its finding vanish while the line number
    // is still textually present.
    let signaled: BTreeSet<u64> = LINE_NUMBER_PATTERN
        .captures_iter(text)
        .filter_map(|captures| captures[1].parse::<u64>().ok())
        .collect();

    let mut recovered: Vec<Value> = Vec::new();
    if signaled.len() > candidates.len() {
        let covered: BTreeSet<u64> = candidates.iter().filter_map(candidate_line).collect();

        for line in signaled.difference(&covered) {
            let explanation = scrape_explanation(text, *line).unwrap_or_else(|| {
                "Recovered from partially malformed detector output".to_string()
            });
            recovered.push(serde_json::json!({
                "line_number": line,
                "explanation": explanation,
            }));
        }

        if !recovered.is_empty() {
            warn!(
                stage = "line_reconciliation",
                signaled = signaled.len(),
                parsed = candidates.len(),
                synthesized = recovered.len(),
                "synthesized stub candidates for uncovered line numbers"
            );
            candidates.extend(recovered.iter().cloned());
        }
    }

    let stage = if candidates.is_empty() {
        ExtractionStage::Empty
    } else {
        ExtractionStage::ObjectRecovery
    };

    Extraction {
        candidates,
        recovered,
        stage,
    }
}

fn unwrap_fenced_block(text: &str) -> &str {
    FENCED_BLOCK
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|interior| interior.as_str())
        .unwrap_or(text)
}

/// Line number of a candidate, tolerating numeric strings.
fn candidate_line(candidate: &Value) -> Option<u64> {
    match candidate.get("line_number")? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Best-effort explanation for a synthesized stub: a narrow window anchored
/// just past the line number's own occurrence.
fn scrape_explanation(text: &str, line: u64) -> Option<String> {
    let anchor = Regex::new(&format!(r#""line_number"\s*:\s*"?{line}\b"#)).ok()?;
    let found = anchor.find(text)?;
    let window: String = text[found.end()..].chars().take(500).collect();

    EXPLANATION_PATTERN
        .captures(&window)
        .map(|captures| captures[1].replace("\\\"", "\""))
}
