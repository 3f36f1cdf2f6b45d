//! Structured pharmacogenomic report.
//!
//! The section and field names below are consumed by external clients and
//! must stay stable.

use chrono::{DateTime, Utc};
use pharmaguard_common::{FusionDecision, NarrativeExplanation, Severity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::normalise_symbol;

pub const FUSION_STRATEGY: &str = "Rule + ML";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_label: String,
    pub confidence_score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacogenomicProfile {
    pub primary_gene: String,
    pub diplotype: String,
    pub phenotype: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecommendation {
    pub recommendation: String,
    pub action_required: String,
    pub monitoring_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub rule_engine_used: bool,
    pub ml_model_used: bool,
    pub fusion_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Opaque per-report identifier; never reused across calls.
    pub patient_id: String,
    pub drug: String,
    pub timestamp: DateTime<Utc>,
    pub risk_assessment: RiskAssessment,
    pub pharmacogenomic_profile: PharmacogenomicProfile,
    pub detected_variants: Vec<String>,
    pub clinical_recommendation: ClinicalRecommendation,
    pub llm_generated_explanation: NarrativeExplanation,
    pub quality_metrics: QualityMetrics,
}

fn new_case_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("PATIENT_{}", &hex[..6])
}

/// Map a fusion decision and its case context into a report.
/// Pure field mapping plus the monitoring flag; never fails.
pub fn assemble(
    drug: &str,
    gene: &str,
    diplotype: &str,
    variant_ids: &[String],
    decision: &FusionDecision,
) -> Report {
    assemble_with_explanation(drug, gene, diplotype, variant_ids, decision, NarrativeExplanation::placeholder())
}

pub fn assemble_with_explanation(
    drug: &str,
    gene: &str,
    diplotype: &str,
    variant_ids: &[String],
    decision: &FusionDecision,
    explanation: NarrativeExplanation,
) -> Report {
    Report {
        patient_id: new_case_id(),
        drug: normalise_symbol(drug),
        timestamp: Utc::now(),
        risk_assessment: RiskAssessment {
            risk_label: decision.risk_label.clone(),
            confidence_score: decision.confidence_score,
            severity: decision.severity,
        },
        pharmacogenomic_profile: PharmacogenomicProfile {
            primary_gene: normalise_symbol(gene),
            diplotype: diplotype.trim().to_string(),
            phenotype: decision.phenotype.clone(),
        },
        detected_variants: variant_ids.to_vec(),
        clinical_recommendation: ClinicalRecommendation {
            recommendation: decision.recommendation.clone(),
            action_required: decision.risk_label.clone(),
            monitoring_required: decision.severity.requires_monitoring(),
        },
        llm_generated_explanation: explanation,
        quality_metrics: QualityMetrics {
            rule_engine_used: decision.rule_used,
            ml_model_used: decision.model_used,
            fusion_strategy: FUSION_STRATEGY.to_string(),
        },
    }
}
