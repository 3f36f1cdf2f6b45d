//! Predictor boundary.
//!
//! The fusion engine only ever sees a well-formed [`PredictionResult`].
//! Implementations report failure as [`Prediction::Unavailable`], which is
//! collapsed into the fallback sentinel at this boundary.

use std::collections::HashMap;

use pharmaguard_common::confidence::is_valid_confidence;
use pharmaguard_common::PredictionResult;

use crate::rules::RuleKey;

/// Outcome of one classifier invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Success(PredictionResult),
    /// The model could not be applied (unseen category, missing artifact, ...).
    Unavailable(String),
}

impl Prediction {
    /// A model prediction, or `Unavailable` when the confidence is unusable.
    pub fn from_model(label: impl Into<String>, confidence: f64) -> Self {
        if is_valid_confidence(confidence) {
            Prediction::Success(PredictionResult::from_model(label, confidence))
        } else {
            Prediction::Unavailable(format!("confidence {} outside [0, 1]", confidence))
        }
    }

    /// Collapse into the result the fusion engine consumes. A `Success`
    /// whose confidence is non-finite or outside `[0, 1]` is treated as
    /// unavailable, whichever constructor produced it.
    pub fn into_result(self) -> PredictionResult {
        match self {
            Prediction::Success(result) if is_valid_confidence(result.confidence()) => result,
            Prediction::Success(result) => {
                tracing::warn!(
                    confidence = result.confidence(),
                    prediction = result.prediction(),
                    "Predictor returned an invalid confidence; using fallback prediction"
                );
                PredictionResult::fallback()
            }
            Prediction::Unavailable(reason) => {
                tracing::debug!(reason = %reason, "Model unavailable; using fallback prediction");
                PredictionResult::fallback()
            }
        }
    }
}

/// Statistical risk classifier for a (drug, gene, diplotype) triple.
///
/// Implementations must never panic on unseen input; they report it as
/// [`Prediction::Unavailable`].
pub trait Predictor: Send + Sync {
    fn predict(&self, drug: &str, gene: &str, diplotype: &str) -> Prediction;
}

// ── Fixed-answer predictors ─────────────────────────────────────────────────

/// Predictor with hardcoded answers, for tests and offline runs.
/// Unlisted triples are `Unavailable`.
#[derive(Debug, Default)]
pub struct StaticPredictor {
    answers: HashMap<RuleKey, (String, f64)>,
}

impl StaticPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer for a (drug, gene, diplotype) triple.
    pub fn with(mut self, drug: &str, gene: &str, diplotype: &str, label: &str, confidence: f64) -> Self {
        self.answers.insert(RuleKey::new(drug, gene, diplotype), (label.to_string(), confidence));
        self
    }
}

impl Predictor for StaticPredictor {
    fn predict(&self, drug: &str, gene: &str, diplotype: &str) -> Prediction {
        match self.answers.get(&RuleKey::new(drug, gene, diplotype)) {
            Some((label, confidence)) => Prediction::from_model(label.clone(), *confidence),
            None => Prediction::Unavailable(format!("no answer for {}/{}/{}", drug, gene, diplotype)),
        }
    }
}

/// Predictor used when no model artifacts are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailablePredictor;

impl Predictor for UnavailablePredictor {
    fn predict(&self, _drug: &str, _gene: &str, _diplotype: &str) -> Prediction {
        Prediction::Unavailable("no model artifacts loaded".to_string())
    }
}
