//! Analysis collaborator
//!
//! `SignalAnalyzer` is the seam between the HTTP layer and whatever model
//! service produces signals. The scoring core only sees the `SignalBundle`.

pub mod mock;

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::risk::{InputKind, SignalBundle};
use crate::AppResult;

pub use mock::MockAnalyzer;

/// A submission with its content
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Text { content: String },
    Url { url: String },
    Document { filename: String, bytes: Vec<u8> },
    Image { filename: String, bytes: Vec<u8> },
}

impl AnalysisInput {
    pub fn kind(&self) -> InputKind {
        match self {
            AnalysisInput::Text { .. } => InputKind::Text,
            AnalysisInput::Url { .. } => InputKind::Url,
            AnalysisInput::Document { .. } => InputKind::Document,
            AnalysisInput::Image { .. } => InputKind::Image,
        }
    }

    fn content_bytes(&self) -> &[u8] {
        match self {
            AnalysisInput::Text { content } => content.as_bytes(),
            AnalysisInput::Url { url } => url.as_bytes(),
            AnalysisInput::Document { bytes, .. } | AnalysisInput::Image { bytes, .. } => bytes,
        }
    }

    /// SHA-256 of the submitted content, lowercase hex
    pub fn content_hash(&self) -> String {
        format!("{:x}", Sha256::digest(self.content_bytes()))
    }

    /// Blank text or URL. Uploads are empty only at zero bytes.
    pub fn is_empty(&self) -> bool {
        match self {
            AnalysisInput::Text { content } => content.trim().is_empty(),
            AnalysisInput::Url { url } => url.trim().is_empty(),
            AnalysisInput::Document { bytes, .. } | AnalysisInput::Image { bytes, .. } => bytes.is_empty(),
        }
    }
}

/// Output of one analysis call
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalReport {
    pub signals: SignalBundle,
    /// Non-numeric extras (sentiment, file type, ...)
    pub attributes: BTreeMap<String, String>,
}

impl SignalReport {
    pub fn new(signals: SignalBundle) -> Self {
        Self {
            signals,
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Flat JSON object stored as the record's `details`
    pub fn to_details(&self) -> serde_json::Value {
        let mut details = serde_json::Map::new();
        for (name, value) in self.signals.iter() {
            details.insert(name.to_string(), serde_json::json!(value));
        }
        for (name, value) in &self.attributes {
            details.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        serde_json::Value::Object(details)
    }
}

/// Produces signals for one submission kind per method
#[axum::async_trait]
pub trait SignalAnalyzer: Send + Sync {
    async fn analyze_text(&self, content: &str) -> AppResult<SignalReport>;

    async fn analyze_url(&self, url: &str) -> AppResult<SignalReport>;

    async fn analyze_document(&self, filename: &str, content: &[u8]) -> AppResult<SignalReport>;

    async fn analyze_image(&self, filename: &str, content: &[u8]) -> AppResult<SignalReport>;
}

/// Dispatch a submission to the matching analyzer method
pub async fn analyze(analyzer: &dyn SignalAnalyzer, input: &AnalysisInput) -> AppResult<SignalReport> {
    match input {
        AnalysisInput::Text { content } => analyzer.analyze_text(content).await,
        AnalysisInput::Url { url } => analyzer.analyze_url(url).await,
        AnalysisInput::Document { filename, bytes } => analyzer.analyze_document(filename, bytes).await,
        AnalysisInput::Image { filename, bytes } => analyzer.analyze_image(filename, bytes).await,
    }
}
