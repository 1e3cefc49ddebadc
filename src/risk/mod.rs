//! Risk Scoring Module
//!
//! Maps analysis signals to a risk score, level and decision.
//!
//! - `types`: InputKind, SignalBundle, RiskOutcome
//! - `rules`: thresholds, weights, signal keys
//! - `engine`: signal adapter and decision classifier

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::evaluate;
pub use types::{
    Decision, InputKind, RiskOutcome, SignalBundle, UnrecognizedDecision, UnrecognizedInputKind,
};
