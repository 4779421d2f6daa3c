use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::core::{DetectorKind, ScanReport};
use crate::llm::provider::{LLMError, LLMProvider};
use crate::llm::scanner::Detector;

/// Fans one submitted file out to the three detectors concurrently and folds
/// their outputs into a single report.
///
/// The join is all-or-nothing: one detector's transport failure fails the
/// whole scan and the healthy detectors' results are discarded. Parsing-layer
/// problems never reach this level; they degrade to empty per-detector
/// results further down.
pub struct ScanEngine {
    injection: Detector,
    cross_site_scripting: Detector,
    secret_exposure: Detector,
}

impl ScanEngine {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            injection: Detector::injection(provider.clone()),
            cross_site_scripting: Detector::cross_site_scripting(provider.clone()),
            secret_exposure: Detector::secret_exposure(provider),
        }
    }

    /// Bounded deadline applied to every detector's model invocation.
    pub fn with_timeout(provider: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self {
            injection: Detector::injection(provider.clone()).with_timeout(timeout),
            cross_site_scripting: Detector::cross_site_scripting(provider.clone())
                .with_timeout(timeout),
            secret_exposure: Detector::secret_exposure(provider).with_timeout(timeout),
        }
    }

    pub async fn scan(
        &self,
        code: &str,
        filename: &str,
        language: &str,
    ) -> Result<ScanReport, LLMError> {
        info!(filename, language, bytes = code.len(), "starting scan");

        let (injection, cross_site_scripting, secret_exposure) = tokio::try_join!(
            self.injection.detect(code, filename, language),
            self.cross_site_scripting.detect(code, filename, language),
            self.secret_exposure.detect(code, filename, language),
        )?;

        let report = ScanReport::new(vec![
            (DetectorKind::Injection, injection),
            (DetectorKind::CrossSiteScripting, cross_site_scripting),
            (DetectorKind::SecretExposure, secret_exposure),
        ]);

        info!(
            filename,
            total = report.summary().total,
            critical = report.summary().by_severity.critical,
            high = report.summary().by_severity.high,
            "scan complete"
        );

        Ok(report)
    }
}
