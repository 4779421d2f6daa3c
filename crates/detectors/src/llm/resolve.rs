//! Extracts a single text string from a provider's raw reply.
//!
//! The reply shape is transport-specific and not statically known: a bare
//! string, an object carrying text under one of several known keys, or the
//! same one level deeper. Strategies are tried strictly in order, most
//! specific first. A miss is reported as `None`, never an error: the caller
//! must stay able to distinguish "model said nothing usable" from "model said
//! there are no findings".

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Transport keys known to carry reply text, in probe order.
const CANDIDATE_KEYS: &[&str] = &[
    "text",
    "content",
    "completion",
    "output_text",
    "response",
    "result",
    "message",
];

static FINDINGS_ARRAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)\[\s*\\?\{.*?\\?"vulnerability_type\\?".*\]"#).expect("findings array pattern")
});

pub fn resolve_text(value: &Value) -> Option<String> {
    // (a) already a string
    if let Value::String(text) = value {
        return Some(text.clone());
    }

    if let Value::Object(map) = value {
        // (b) direct candidate key
        for key in CANDIDATE_KEYS {
            if let Some(Value::String(text)) = map.get(*key) {
                debug!(key, "resolved reply text from top-level field");
                return Some(text.clone());
            }
        }

        // (c) candidate key one level down
        for key in CANDIDATE_KEYS {
            if let Some(Value::Object(inner)) = map.get(*key) {
                for inner_key in CANDIDATE_KEYS {
                    if let Some(Value::String(text)) = inner.get(*inner_key) {
                        debug!(outer = key, inner = inner_key, "resolved reply text from nested field");
                        return Some(text.clone());
                    }
                }
            }
        }
    }

    // (d) last resort: serialize the whole structure and look for a substring
    // shaped like a findings array. Quotes may arrive escaped when the array
    // sits inside a serialized string field.
    let serialized = value.to_string();
    if let Some(found) = FINDINGS_ARRAY.find(&serialized) {
        debug!(length = found.as_str().len(), "resolved findings array from serialized reply");
        let text = found.as_str().replace("\\\"", "\"").replace("\\n", "\n");
        return Some(text);
    }

    None
}
