use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed severity set for emitted findings. Model output naming anything
/// outside this set is coerced by the normalizer, never passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

impl Default for Severity {
    /// Fallback for unrecognized or missing severities. Findings signal real
    /// issues often enough that under-ranking them is the worse failure.
    fn default() -> Self {
        Self::High
    }
}

impl Severity {
    /// Case-insensitive parse of the four canonical names. Anything else is
    /// `None`; the caller decides the fallback.
    pub fn parse_lenient(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Self::Critical),
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}
