//! Risk Types
//!
//! Data structures for the scoring core. No scoring logic here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// INPUT KIND
// ============================================================================

/// Kind of submission being scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputKind {
    Text,
    Url,
    /// Uploaded file. `FILE` is accepted as a legacy alias.
    #[serde(alias = "FILE")]
    Document,
    Image,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "TEXT",
            InputKind::Url => "URL",
            InputKind::Document => "DOCUMENT",
            InputKind::Image => "IMAGE",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = UnrecognizedInputKind;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(InputKind::Text),
            "URL" => Ok(InputKind::Url),
            "DOCUMENT" | "FILE" => Ok(InputKind::Document),
            "IMAGE" => Ok(InputKind::Image),
            _ => Err(UnrecognizedInputKind(s.to_string())),
        }
    }
}

/// Raised for an input kind tag outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized input kind: {0:?}")]
pub struct UnrecognizedInputKind(pub String);

// ============================================================================
// SIGNAL BUNDLE (from the analysis service)
// ============================================================================

/// Named probability signals. A missing signal reads as 0.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalBundle(BTreeMap<String, f64>);

impl SignalBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.0.insert(name.to_string(), value);
    }

    /// Signal value, or 0.0 when absent ("no signal").
    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SignalBundle {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ============================================================================
// RISK LEVEL / DECISION
// ============================================================================

/// Ordered risk levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    /// Action taken for this level
    pub fn decision(&self) -> Decision {
        match self {
            RiskLevel::Low => Decision::Allow,
            RiskLevel::Medium => Decision::Flag,
            RiskLevel::High => Decision::Block,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final action for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Flag,
    Block,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Flag => "FLAG",
            Decision::Block => "BLOCK",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = UnrecognizedDecision;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(Decision::Allow),
            "FLAG" => Ok(Decision::Flag),
            "BLOCK" => Ok(Decision::Block),
            _ => Err(UnrecognizedDecision(s.to_string())),
        }
    }
}

/// Raised for a decision filter outside ALLOW / FLAG / BLOCK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized decision: {0:?}")]
pub struct UnrecognizedDecision(pub String);

// ============================================================================
// RISK OUTCOME
// ============================================================================

/// Result of scoring one submission. Write-once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskOutcome {
    /// Clamped to [0, 1], rounded to 4 decimal places
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub decision: Decision,
}
