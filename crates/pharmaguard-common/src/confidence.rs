/// Confidence arithmetic for fused pharmacogenomic decisions.

/// Multiplier applied to the model confidence when the model's label
/// contradicts a codified clinical rule (a fixed 30% penalty).
pub const DISAGREEMENT_PENALTY: f64 = 0.70;

/// Round a confidence to 3 decimal places.
pub fn round_confidence(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Confidence of a fused decision where model and rule disagree.
pub fn disagreement_confidence(raw: f64) -> f64 {
    round_confidence(raw * DISAGREEMENT_PENALTY)
}

/// A usable confidence is finite and lies in [0.0, 1.0].
pub fn is_valid_confidence(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}
