//! Probability → severity tier

use super::Severity;

/// Anything at or below this is not a threat.
pub const THREAT_THRESHOLD: f64 = 0.8;

/// Classify an estimator probability. Severity is `None` exactly when the
/// result is not a threat.
pub fn classify(probability: f64) -> (bool, Option<Severity>) {
    let severity = if probability > 0.95 {
        Some(Severity::Critical)
    } else if probability > 0.9 {
        Some(Severity::High)
    } else if probability > 0.85 {
        Some(Severity::Medium)
    } else if probability > THREAT_THRESHOLD {
        Some(Severity::Low)
    } else {
        None
    };
    (severity.is_some(), severity)
}
