//! Decision fusion: reconcile the rule table with the model prediction.
//!
//! A matching rule is always authoritative for the clinical fields. The
//! model only moves the confidence: it is taken as-is when the model agrees
//! with the rule and penalised when it does not. Without a rule the model's
//! label is used directly.

use std::sync::Arc;

use pharmaguard_common::confidence::{disagreement_confidence, round_confidence};
use pharmaguard_common::entities::{NO_RULE_RECOMMENDATION, UNKNOWN};
use pharmaguard_common::{FusionDecision, PharmaGuardError, PredictionResult, Result, RuleEntry, Severity};

use crate::predictor::Predictor;
use crate::rules::RuleStore;

/// Combine an optional rule with a prediction. Pure; never fails.
pub fn fuse_decision(rule: Option<&RuleEntry>, prediction: &PredictionResult) -> FusionDecision {
    match rule {
        Some(rule) => {
            // Case-sensitive: "safe" does not agree with "Safe".
            let agreement = prediction.prediction() == rule.risk_label;
            let confidence_score = if agreement {
                round_confidence(prediction.confidence())
            } else {
                disagreement_confidence(prediction.confidence())
            };

            FusionDecision {
                risk_label: rule.risk_label.clone(),
                phenotype: rule.phenotype.clone(),
                severity: rule.severity,
                recommendation: rule.recommendation().to_string(),
                confidence_score,
                rule_used: true,
                model_used: prediction.model_used(),
                agreement: Some(agreement),
            }
        }
        None => FusionDecision {
            risk_label: prediction.prediction().to_string(),
            phenotype: UNKNOWN.to_string(),
            severity: Severity::Unknown,
            recommendation: NO_RULE_RECOMMENDATION.to_string(),
            confidence_score: round_confidence(prediction.confidence()),
            rule_used: false,
            model_used: prediction.model_used(),
            agreement: None,
        },
    }
}

fn require_identifier(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PharmaGuardError::MalformedInput { field });
    }
    Ok(())
}

/// Queries the rule store and the predictor, then fuses their answers.
#[derive(Clone)]
pub struct FusionEngine {
    rules: Arc<RuleStore>,
    predictor: Arc<dyn Predictor>,
}

impl FusionEngine {
    pub fn new(rules: Arc<RuleStore>, predictor: Arc<dyn Predictor>) -> Self {
        Self { rules, predictor }
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Fuse a decision for one (drug, gene, diplotype) request.
    ///
    /// Fails only when an identifier is empty or whitespace. A missing rule
    /// and an unavailable model are both absorbed into the decision.
    pub fn fuse(&self, drug: &str, gene: &str, diplotype: &str) -> Result<FusionDecision> {
        require_identifier("drug", drug)?;
        require_identifier("gene", gene)?;
        require_identifier("diplotype", diplotype)?;

        let rule = self.rules.lookup(drug, gene, diplotype);
        let prediction = self.predictor.predict(drug, gene, diplotype).into_result();
        let decision = fuse_decision(rule, &prediction);

        if decision.agreement == Some(false) && decision.model_used {
            tracing::warn!(
                drug = drug.trim(),
                gene = gene.trim(),
                diplotype = diplotype.trim(),
                rule_label = %decision.risk_label,
                model_label = prediction.prediction(),
                "Model disagrees with clinical rule; confidence penalised"
            );
        }

        tracing::debug!(
            drug = drug.trim(),
            gene = gene.trim(),
            diplotype = diplotype.trim(),
            risk_label = %decision.risk_label,
            rule_used = decision.rule_used,
            model_used = decision.model_used,
            agreement = ?decision.agreement,
            confidence = decision.confidence_score,
            "Fusion decision"
        );

        Ok(decision)
    }
}
