//! One detector: prompt construction, model invocation, text resolution,
//! extraction, and normalization behind a single `detect` operation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::core::{DetectorKind, Finding};

use super::{
    extract::extract_candidates,
    normalize::normalize,
    prompts::{number_source_lines, PromptBuilder, OUTPUT_CONTRACT},
    provider::{ChatMessage, LLMError, LLMProvider, LLMRequest},
    resolve::resolve_text,
};

/// Low variance keeps the three detectors' output stable across runs.
pub const DETECTOR_TEMPERATURE: f32 = 0.1;

/// High ceiling to minimize truncation. The repair pipeline exists because
/// truncation still happens anyway.
pub const DETECTOR_MAX_TOKENS: u32 = 8192;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

static INJECTION_INTEREST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(select|insert|update|delete|drop|union)\b.*("\s*\+|\+\s*"|%s|\{|format\()"#)
        .expect("injection interest pattern")
});

static XSS_INTEREST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(innerHTML|document\.write|dangerouslySetInnerHTML|mark_safe|render_template_string|<\s*script)")
        .expect("xss interest pattern")
});

static SECRET_INTEREST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(api[_-]?key|secret|password|token|credential)\s*[:=]\s*["']"#)
        .expect("secret interest pattern")
});

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl DetectorConfig {
    pub fn for_kind(kind: DetectorKind) -> Self {
        Self {
            kind,
            temperature: DETECTOR_TEMPERATURE,
            max_tokens: DETECTOR_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct Detector {
    provider: Arc<dyn LLMProvider>,
    prompts: PromptBuilder,
    config: DetectorConfig,
}

impl Detector {
    pub fn new(kind: DetectorKind, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(),
            config: DetectorConfig::for_kind(kind),
        }
    }

    pub fn injection(provider: Arc<dyn LLMProvider>) -> Self {
        Self::new(DetectorKind::Injection, provider)
    }

    pub fn cross_site_scripting(provider: Arc<dyn LLMProvider>) -> Self {
        Self::new(DetectorKind::CrossSiteScripting, provider)
    }

    pub fn secret_exposure(provider: Arc<dyn LLMProvider>) -> Self {
        Self::new(DetectorKind::SecretExposure, provider)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn kind(&self) -> DetectorKind {
        self.config.kind
    }

    /// Runs the full pipeline for this detector's category.
    ///
    /// Empty (post-trim) source short-circuits to an empty result without
    /// invoking the model. Resolution and parse failures degrade to an empty
    /// result with a diagnostic; only transport-layer failures surface as
    /// errors. The returned findings always satisfy the canonical record
    /// invariants.
    pub async fn detect(
        &self,
        code: &str,
        filename: &str,
        language: &str,
    ) -> Result<Vec<Finding>, LLMError> {
        if code.trim().is_empty() {
            debug!(detector = %self.config.kind, "empty source, skipping model invocation");
            return Ok(Vec::new());
        }

        self.tag_lines_of_interest(code);

        let mut variables = HashMap::new();
        variables.insert("language".to_string(), language.to_string());
        variables.insert("filename".to_string(), filename.to_string());
        variables.insert("numbered_source".to_string(), number_source_lines(code));
        variables.insert("output_contract".to_string(), OUTPUT_CONTRACT.to_string());

        let (system_prompt, user_prompt) = self
            .prompts
            .build_prompt(self.config.kind.template_name(), variables)
            .map_err(|e| LLMError::Configuration(e.to_string()))?;

        let request = LLMRequest {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let started = Instant::now();
        let reply = tokio::time::timeout(self.config.timeout, self.provider.invoke(request))
            .await
            .map_err(|_| LLMError::Timeout(self.config.timeout.as_secs()))??;
        debug!(
            detector = %self.config.kind,
            model = self.provider.model_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model invocation finished"
        );

        let Some(text) = resolve_text(&reply) else {
            // Indistinguishable from a clean scan for callers; the event is
            // the only trace.
            warn!(detector = %self.config.kind, "no text resolved from model reply, treating as zero findings");
            return Ok(Vec::new());
        };

        let extraction = extract_candidates(&text);
        debug!(
            detector = %self.config.kind,
            stage = ?extraction.stage,
            candidates = extraction.candidates.len(),
            synthesized = extraction.recovered.len(),
            "extraction finished"
        );

        let findings: Vec<Finding> = extraction
            .candidates
            .iter()
            .filter_map(|candidate| {
                normalize(candidate, self.config.kind.default_vulnerability_type())
            })
            .collect();

        info!(
            detector = %self.config.kind,
            findings = findings.len(),
            "detector finished"
        );

        Ok(findings)
    }

    /// Pre-invocation diagnostic only: tags source lines matching this
    /// category's interest pattern so prompt/response mismatches can be
    /// debugged. Has no effect on results.
    fn tag_lines_of_interest(&self, code: &str) {
        let pattern: &Regex = match self.config.kind {
            DetectorKind::Injection => &INJECTION_INTEREST,
            DetectorKind::CrossSiteScripting => &XSS_INTEREST,
            DetectorKind::SecretExposure => &SECRET_INTEREST,
        };

        for (index, line) in code.lines().enumerate() {
            if pattern.is_match(line) {
                debug!(
                    detector = %self.config.kind,
                    line = index + 1,
                    "line matches detector interest pattern"
                );
            }
        }
    }
}
