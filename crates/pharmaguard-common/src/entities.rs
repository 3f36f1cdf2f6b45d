/// Core pharmacogenomic entity types shared by the rule store, the
/// predictor boundary, the fusion engine and the report assembler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PharmaGuardError;

/// Risk label and phenotype used when nothing better is known.
pub const UNKNOWN: &str = "Unknown";

/// Recommendation attached to a rule that does not carry its own.
pub const GENERIC_RECOMMENDATION: &str = "Follow clinical guideline.";

/// Recommendation attached to decisions made without a matching rule.
pub const NO_RULE_RECOMMENDATION: &str = "No clinical guideline found. ML-based estimation.";

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Clinical severity of a drug-gene-diplotype outcome.
/// Serialized in lowercase; "severe" is accepted as an alias of `critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
    #[default]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low      => "low",
            Severity::Moderate => "moderate",
            Severity::High     => "high",
            Severity::Critical => "critical",
            Severity::Unknown  => "unknown",
        }
    }

    /// High and critical outcomes require clinical monitoring.
    pub fn requires_monitoring(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl FromStr for Severity {
    type Err = PharmaGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low"                => Ok(Severity::Low),
            "moderate"           => Ok(Severity::Moderate),
            "high"               => Ok(Severity::High),
            "critical" | "severe" => Ok(Severity::Critical),
            "unknown"            => Ok(Severity::Unknown),
            _                    => Err(PharmaGuardError::UnknownSeverity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = PharmaGuardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Severity> for &'static str {
    fn from(severity: Severity) -> Self {
        severity.as_str()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rule entry
// ---------------------------------------------------------------------------

/// Clinical outcome codified for one (drug, gene, diplotype) key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub phenotype: String,
    pub risk_label: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl RuleEntry {
    pub fn new(phenotype: impl Into<String>, risk_label: impl Into<String>, severity: Severity) -> Self {
        Self {
            phenotype: phenotype.into(),
            risk_label: risk_label.into(),
            severity,
            recommendation: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// The rule's recommendation, or the generic guideline referral.
    pub fn recommendation(&self) -> &str {
        self.recommendation.as_deref().unwrap_or(GENERIC_RECOMMENDATION)
    }
}

// ---------------------------------------------------------------------------
// Prediction result
// ---------------------------------------------------------------------------

/// Output of the statistical classifier for one request.
///
/// Fields are private so the fallback contract holds: a result with
/// `model_used == false` always carries `"Unknown"` at confidence 0.0.
/// The confidence range of model results is checked where predictions
/// enter the fusion engine (`Prediction::into_result`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    prediction: String,
    confidence: f64,
    model_used: bool,
}

impl PredictionResult {
    /// A prediction actually produced by the model.
    pub fn from_model(prediction: impl Into<String>, confidence: f64) -> Self {
        Self {
            prediction: prediction.into(),
            confidence,
            model_used: true,
        }
    }

    /// Sentinel returned whenever the model could not be applied.
    pub fn fallback() -> Self {
        Self {
            prediction: UNKNOWN.to_string(),
            confidence: 0.0,
            model_used: false,
        }
    }

    pub fn prediction(&self) -> &str {
        &self.prediction
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn model_used(&self) -> bool {
        self.model_used
    }
}

// ---------------------------------------------------------------------------
// Fusion decision
// ---------------------------------------------------------------------------

/// The fusion engine's authoritative answer for one request.
/// `agreement` is `None` exactly when no rule was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionDecision {
    pub risk_label: String,
    pub phenotype: String,
    pub severity: Severity,
    pub recommendation: String,
    pub confidence_score: f64,
    pub rule_used: bool,
    pub model_used: bool,
    pub agreement: Option<bool>,
}

// ---------------------------------------------------------------------------
// Narrative explanation
// ---------------------------------------------------------------------------

/// Human-readable prose attached to a report after fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeExplanation {
    pub summary: String,
    pub clinical_significance: String,
    #[serde(default)]
    pub interaction_warnings: Vec<String>,
    #[serde(default)]
    pub additional_notes: String,
}

impl NarrativeExplanation {
    /// Placeholder used when no explanation was requested or generation failed.
    pub fn placeholder() -> Self {
        Self {
            summary: "Analysis complete".to_string(),
            clinical_significance: "Standard interpretation applies".to_string(),
            interaction_warnings: vec![],
            additional_notes: String::new(),
        }
    }
}

impl Default for NarrativeExplanation {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(" Moderate ".parse::<Severity>().unwrap(), Severity::Moderate);
        assert_eq!("Severe".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("catastrophic".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let back: Severity = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(back, Severity::High);
    }

    #[test]
    fn test_monitoring_only_for_high_and_critical() {
        assert!(Severity::High.requires_monitoring());
        assert!(Severity::Critical.requires_monitoring());
        assert!(!Severity::Moderate.requires_monitoring());
        assert!(!Severity::Low.requires_monitoring());
        assert!(!Severity::Unknown.requires_monitoring());
    }

    #[test]
    fn test_rule_recommendation_defaults_to_generic() {
        let rule = RuleEntry::new("PM", "Ineffective", Severity::Moderate);
        assert_eq!(rule.recommendation(), GENERIC_RECOMMENDATION);
        let rule = rule.with_recommendation("Avoid codeine.");
        assert_eq!(rule.recommendation(), "Avoid codeine.");
    }

    #[test]
    fn test_fallback_contract() {
        let fb = PredictionResult::fallback();
        assert_eq!(fb.prediction(), UNKNOWN);
        assert_eq!(fb.confidence(), 0.0);
        assert!(!fb.model_used());
    }
}
