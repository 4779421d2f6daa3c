//! Coerces raw extracted candidates into canonical [`Finding`] records.
//!
//! This is the sole boundary that guarantees the data-model invariants:
//! whatever shape a candidate arrived in, the emitted record has a closed-set
//! severity, a non-negative line number, and a confidence inside [0, 1].

use crate::core::{Finding, Severity, DEFAULT_CONFIDENCE};
use serde_json::{Map, Value};
use tracing::debug;

/// Pure candidate-to-record coercion. Returns `None` for candidates with no
/// identifying signal at all (none of `vulnerability_type`, `line_number`,
/// `code_snippet`); those are noise, not errors.
pub fn normalize(candidate: &Value, default_vulnerability_type: &str) -> Option<Finding> {
    let object = candidate.as_object()?;

    let has_identity = object.contains_key("vulnerability_type")
        || object.contains_key("line_number")
        || object.contains_key("code_snippet");
    if !has_identity {
        debug!("discarding candidate with no identifying signal");
        return None;
    }

    Some(Finding {
        vulnerability_type: string_field(object, "vulnerability_type")
            .unwrap_or_else(|| default_vulnerability_type.to_string()),
        severity: severity_field(object.get("severity")),
        line_number: line_field(object.get("line_number")),
        code_snippet: string_field(object, "code_snippet").unwrap_or_default(),
        explanation: string_field(object, "explanation").unwrap_or_default(),
        fix_suggestion: string_field(object, "fix_suggestion").unwrap_or_default(),
        confidence: confidence_field(object.get("confidence")),
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn severity_field(value: Option<&Value>) -> Severity {
    match value {
        Some(Value::String(text)) => Severity::parse_lenient(text).unwrap_or_default(),
        _ => Severity::default(),
    }
}

fn line_field(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(number)) => {
            if let Some(unsigned) = number.as_u64() {
                u32::try_from(unsigned).unwrap_or(u32::MAX)
            } else if let Some(float) = number.as_f64() {
                if float.is_finite() && float >= 0.0 {
                    float as u32
                } else {
                    0
                }
            } else {
                0
            }
        }
        Some(Value::String(text)) => text.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    }
}

fn confidence_field(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}
