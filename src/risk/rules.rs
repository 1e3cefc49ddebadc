//! Risk Scoring Rules & Thresholds
//!
//! Constants only. Classification logic lives in `engine.rs`.

// ============================================================================
// DECISION THRESHOLDS (strict: score must exceed the threshold)
// ============================================================================

/// Above this score = HIGH / BLOCK
pub const HIGH_RISK_THRESHOLD: f64 = 0.8;

/// Above this score = MEDIUM / FLAG
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// Decimal places kept in the persisted risk score
pub const SCORE_DECIMALS: i32 = 4;

/// Decimal places kept before thresholding. Drops f64 noise from the image
/// weighting (0.6 * 0.14 + 0.4 * 0.79 = 0.4000000000000001) while keeping
/// sub-score-precision values such as 0.8000001 above the line.
pub const THRESHOLD_DECIMALS: i32 = 9;

// ============================================================================
// IMAGE WEIGHTS
// ============================================================================

/// Weight of EXIF/metadata anomalies in the image score (60%)
pub const IMAGE_METADATA_WEIGHT: f64 = 0.6;

/// Weight of steganography detection in the image score (40%)
pub const IMAGE_STEGANOGRAPHY_WEIGHT: f64 = 0.4;

// ============================================================================
// SIGNAL KEYS (vocabulary of the analysis service)
// ============================================================================

pub const FRAUD_PROBABILITY: &str = "fraud_probability";
pub const PHISHING_PROBABILITY: &str = "phishing_probability";
pub const MALWARE_PROBABILITY: &str = "malware_probability";
pub const METADATA_SUSPICION: &str = "metadata_suspicion";
pub const STEGANOGRAPHY_SCORE: &str = "steganography_score";
