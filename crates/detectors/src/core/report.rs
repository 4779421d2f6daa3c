use crate::core::{DetectorKind, Finding, Severity};
use anyhow::Result;
use serde::Serialize;

/// Aggregated output of one scan: the merged findings of all detectors plus
/// summary counts. Built once per scan request and immutable afterward;
/// persistence belongs to whatever sits above the core.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    findings: Vec<Finding>,
    summary: ScanSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub by_severity: SeverityCount,
    pub by_detector: DetectorCount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCount {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectorCount {
    pub injection: usize,
    pub cross_site_scripting: usize,
    pub secret_exposure: usize,
}

impl ScanReport {
    /// Merges per-detector outputs in invocation order, then stable-sorts by
    /// line number so ties keep that order regardless of completion timing.
    pub fn new(outputs: Vec<(DetectorKind, Vec<Finding>)>) -> Self {
        let mut by_detector = DetectorCount::default();
        let mut findings = Vec::new();

        for (kind, detector_findings) in outputs {
            match kind {
                DetectorKind::Injection => by_detector.injection += detector_findings.len(),
                DetectorKind::CrossSiteScripting => {
                    by_detector.cross_site_scripting += detector_findings.len()
                }
                DetectorKind::SecretExposure => {
                    by_detector.secret_exposure += detector_findings.len()
                }
            }
            findings.extend(detector_findings);
        }

        findings.sort_by_key(|f| f.line_number);

        let mut by_severity = SeverityCount::default();
        for finding in &findings {
            match finding.severity {
                Severity::Critical => by_severity.critical += 1,
                Severity::High => by_severity.high += 1,
                Severity::Medium => by_severity.medium += 1,
                Severity::Low => by_severity.low += 1,
            }
        }

        let summary = ScanSummary {
            total: findings.len(),
            by_severity,
            by_detector,
        };

        Self { findings, summary }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
