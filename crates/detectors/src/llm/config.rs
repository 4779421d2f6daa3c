//! Environment-driven assembly of a ready-to-scan engine.
//!
//! The model capability is a hard precondition: an unbuildable provider is a
//! configuration failure surfaced before any scan runs, never a silent
//! degradation. Temperature and token ceiling are deliberately not knobs;
//! all three detectors run fixed low-variance settings.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::llm::provider::{LLMError, LLMProvider, OpenAIProvider};
use crate::runner::engine::ScanEngine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Model identifier passed to the transport. `None` takes the provider
    /// default.
    pub model: Option<String>,

    /// Per-detector invocation deadline. A hung invocation becomes a
    /// `Timeout` failure instead of hanging the scan.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl LLMConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.trim().is_empty() {
                config.model = Some(model);
            }
        }

        if let Ok(timeout) = std::env::var("LLM_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.trim().parse::<u64>() {
                config.timeout_seconds = seconds;
            }
        }

        config
    }

    /// Builds the engine or fails with `LLMError::Configuration` when the
    /// provider cannot be constructed (e.g. missing API key).
    pub fn build_engine(&self) -> Result<ScanEngine, LLMError> {
        let provider = OpenAIProvider::from_env(self.model.clone())?;
        debug!(model = provider.model_name(), timeout_seconds = self.timeout_seconds, "building scan engine");

        Ok(ScanEngine::with_timeout(
            Arc::new(provider),
            Duration::from_secs(self.timeout_seconds),
        ))
    }
}
