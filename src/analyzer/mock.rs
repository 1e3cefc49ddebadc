//! Mock analyzer
//!
//! Stand-in for the model service: waits a configurable delay, then returns
//! uniform random signals with the vocabulary of each input kind.

use std::time::Duration;

use rand::Rng;

use super::{SignalAnalyzer, SignalReport};
use crate::risk::rules::{
    FRAUD_PROBABILITY, MALWARE_PROBABILITY, METADATA_SUSPICION, PHISHING_PROBABILITY,
    STEGANOGRAPHY_SCORE,
};
use crate::risk::SignalBundle;
use crate::AppResult;

/// Fraud probability above which the text sentiment reads negative
const NEGATIVE_SENTIMENT_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct MockAnalyzer {
    latency: Duration,
}

impl MockAnalyzer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// No artificial delay
    #[cfg(test)]
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    async fn simulate_processing(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn probability() -> f64 {
    rand::thread_rng().gen_range(0.0..=1.0)
}

/// Lowercased extension, or "unknown"
fn file_extension(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "unknown".to_string(),
    }
}

#[axum::async_trait]
impl SignalAnalyzer for MockAnalyzer {
    async fn analyze_text(&self, content: &str) -> AppResult<SignalReport> {
        self.simulate_processing().await;

        let fraud = probability();
        let sentiment = if fraud > NEGATIVE_SENTIMENT_THRESHOLD { "negative" } else { "neutral" };

        tracing::debug!("Mock text analysis ({} chars): fraud={:.3}", content.chars().count(), fraud);

        Ok(SignalReport::new(SignalBundle::new().with(FRAUD_PROBABILITY, fraud))
            .attribute("sentiment", sentiment))
    }

    async fn analyze_url(&self, url: &str) -> AppResult<SignalReport> {
        self.simulate_processing().await;

        let phishing = probability();
        tracing::debug!("Mock URL analysis {}: phishing={:.3}", url, phishing);

        Ok(SignalReport::new(SignalBundle::new().with(PHISHING_PROBABILITY, phishing))
            .attribute("domain_age", "1 month"))
    }

    async fn analyze_document(&self, filename: &str, content: &[u8]) -> AppResult<SignalReport> {
        self.simulate_processing().await;

        let malware = probability();
        tracing::debug!("Mock document analysis {} ({} bytes): malware={:.3}", filename, content.len(), malware);

        Ok(SignalReport::new(SignalBundle::new().with(MALWARE_PROBABILITY, malware))
            .attribute("file_type", file_extension(filename)))
    }

    async fn analyze_image(&self, filename: &str, content: &[u8]) -> AppResult<SignalReport> {
        self.simulate_processing().await;

        let metadata = probability();
        let steganography = probability();
        tracing::debug!(
            "Mock image analysis {} ({} bytes): metadata={:.3}, stego={:.3}",
            filename, content.len(), metadata, steganography
        );

        let signals = SignalBundle::new()
            .with(METADATA_SUSPICION, metadata)
            .with(STEGANOGRAPHY_SCORE, steganography);

        Ok(SignalReport::new(signals).attribute("format", file_extension(filename)))
    }
}
