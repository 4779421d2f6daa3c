use crate::core::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One vulnerability category pipeline. Each kind differs only in prompt
/// template, default category string, and its diagnostic interest pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Injection,
    CrossSiteScripting,
    SecretExposure,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 3] = [
        DetectorKind::Injection,
        DetectorKind::CrossSiteScripting,
        DetectorKind::SecretExposure,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Injection => "injection",
            Self::CrossSiteScripting => "cross_site_scripting",
            Self::SecretExposure => "secret_exposure",
        }
    }

    /// Category assigned to candidates the model returned without a
    /// `vulnerability_type` of their own.
    pub fn default_vulnerability_type(&self) -> &'static str {
        match self {
            Self::Injection => "SQL Injection",
            Self::CrossSiteScripting => "Cross-Site Scripting",
            Self::SecretExposure => "Hardcoded Secret",
        }
    }

    pub fn template_name(&self) -> &'static str {
        self.id()
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Substituted when a candidate carries no usable confidence.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Canonical, fully-validated vulnerability record. Every instance emitted by
/// the normalizer satisfies the field constraints below regardless of how
/// malformed the upstream model text was:
///
/// - `severity` is one of the four closed enum values
/// - `line_number` is 1-based; 0 means unknown/unresolved
/// - `confidence` lies in [0.0, 1.0]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub vulnerability_type: String,
    pub severity: Severity,
    pub line_number: u32,
    pub code_snippet: String,
    pub explanation: String,
    pub fix_suggestion: String,
    pub confidence: f64,
}

impl Finding {
    pub fn new(vulnerability_type: impl Into<String>, severity: Severity) -> Self {
        Self {
            vulnerability_type: vulnerability_type.into(),
            severity,
            line_number: 0,
            code_snippet: String::new(),
            explanation: String::new(),
            fix_suggestion: String::new(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    pub fn with_line(mut self, line_number: u32) -> Self {
        self.line_number = line_number;
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.code_snippet = snippet.into();
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_fix(mut self, fix_suggestion: impl Into<String>) -> Self {
        self.fix_suggestion = fix_suggestion.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}
