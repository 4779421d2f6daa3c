//! Canonical data model shared by every detector and the orchestrator.

pub mod finding;
pub mod report;
pub mod severity;

pub use finding::{DetectorKind, Finding, DEFAULT_CONFIDENCE};
pub use report::{DetectorCount, ScanReport, ScanSummary, SeverityCount};
pub use severity::Severity;
