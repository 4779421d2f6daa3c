//! CodeSentry Detectors - LLM-backed security finding extraction
//!
//! Turns a generative model's free-text answer into reliable, structured
//! security-finding records, three detector categories at a time. The model
//! is asked for a strict JSON array; the pipeline assumes that ask can fail
//! and escalates through increasingly permissive recovery strategies rather
//! than dropping signaled vulnerabilities.
//!
//! The crate deliberately ends at `(source_code, filename, language_tag)` in
//! and [`core::ScanReport`] out. Upload validation, HTTP routing, and result
//! persistence belong to whatever embeds it.

pub mod core;
pub mod llm;
pub mod runner;

pub use crate::core::{DetectorKind, Finding, ScanReport, ScanSummary, Severity};
pub use llm::{Detector, LLMConfig, LLMError, LLMProvider, MockLLMProvider, OpenAIProvider};
pub use runner::ScanEngine;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
