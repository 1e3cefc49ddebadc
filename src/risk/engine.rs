//! Risk Engine
//!
//! Signal adapter + decision classifier. Pure functions, no I/O, no logging.
//! Input: InputKind, SignalBundle
//! Output: RiskOutcome

use super::rules::{
    FRAUD_PROBABILITY, HIGH_RISK_THRESHOLD, IMAGE_METADATA_WEIGHT, IMAGE_STEGANOGRAPHY_WEIGHT,
    MALWARE_PROBABILITY, MEDIUM_RISK_THRESHOLD, METADATA_SUSPICION, PHISHING_PROBABILITY,
    SCORE_DECIMALS, STEGANOGRAPHY_SCORE, THRESHOLD_DECIMALS,
};
use super::types::{InputKind, RiskLevel, RiskOutcome, SignalBundle};

// ============================================================================
// SIGNAL ADAPTER
// ============================================================================

/// Raw (unclamped) risk for a submission kind
pub fn compute_raw_risk(kind: InputKind, signals: &SignalBundle) -> f64 {
    match kind {
        InputKind::Text => signals.get(FRAUD_PROBABILITY),
        InputKind::Url => signals.get(PHISHING_PROBABILITY),
        InputKind::Document => signals.get(MALWARE_PROBABILITY),
        InputKind::Image => {
            IMAGE_METADATA_WEIGHT * signals.get(METADATA_SUSPICION)
                + IMAGE_STEGANOGRAPHY_WEIGHT * signals.get(STEGANOGRAPHY_SCORE)
        }
    }
}

// ============================================================================
// DECISION CLASSIFIER
// ============================================================================

/// Clamp into [0, 1]. NaN maps to 1.0.
pub fn clamp_risk(raw: f64) -> f64 {
    if raw.is_nan() {
        return 1.0;
    }
    raw.clamp(0.0, 1.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round half away from zero to `SCORE_DECIMALS` places
pub fn round_score(value: f64) -> f64 {
    round_to(value, SCORE_DECIMALS)
}

/// Level for a clamped score. Thresholds are strict.
pub fn risk_level_for(score: f64) -> RiskLevel {
    if score > HIGH_RISK_THRESHOLD {
        RiskLevel::High
    } else if score > MEDIUM_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Main classification function
///
/// Thresholds are applied to the clamped value before score rounding, so a
/// raw risk of 0.8000001 is HIGH even though its persisted score is 0.8.
/// Arithmetic noise below `THRESHOLD_DECIMALS` never moves a value across a
/// threshold.
pub fn classify(raw_risk: f64) -> RiskOutcome {
    let clamped = clamp_risk(raw_risk);
    let risk_level = risk_level_for(round_to(clamped, THRESHOLD_DECIMALS));

    RiskOutcome {
        risk_score: round_score(clamped),
        risk_level,
        decision: risk_level.decision(),
    }
}

/// Adapter + classifier in one call
pub fn evaluate(kind: InputKind, signals: &SignalBundle) -> RiskOutcome {
    classify(compute_raw_risk(kind, signals))
}

// ============================================================================
// TESTS
// ============================================================================
