//! Narrative explanations for fused decisions.
//!
//! Enrichment is best-effort: [`NarrativeExplainer::explain_or_placeholder`]
//! never fails and never blocks report assembly for longer than its timeout.

use std::sync::Arc;
use std::time::Duration;

use pharmaguard_common::{NarrativeExplanation, Severity};
use serde::Deserialize;

use crate::backend::{LlmBackend, LlmError, LlmRequest, Message};

const SYSTEM_PROMPT: &str = "You are a clinical pharmacogenomics expert.";

/// The tuple an explanation is generated from.
#[derive(Debug, Clone, Copy)]
pub struct CaseSummary<'a> {
    pub drug: &'a str,
    pub gene: &'a str,
    pub diplotype: &'a str,
    pub risk_label: &'a str,
    pub severity: Severity,
}

pub fn build_prompt(case: &CaseSummary<'_>) -> String {
    format!(
        "You are a pharmacogenomics clinical assistant.\n\n\
         Drug: {}\nGene: {}\nDiplotype: {}\nRisk: {}\nSeverity: {}\n\n\
         Respond with a JSON object with the keys \"summary\" (clinical interpretation \
         and a short patient-friendly explanation), \"clinical_significance\" (dosing \
         recommendation), \"interaction_warnings\" (array of strings) and \
         \"additional_notes\" (monitoring advice).",
        case.drug, case.gene, case.diplotype, case.risk_label, case.severity
    )
}

#[derive(Deserialize)]
struct ExplanationPayload {
    summary: String,
    #[serde(default)]
    clinical_significance: Option<String>,
    #[serde(default)]
    interaction_warnings: Vec<String>,
    #[serde(default)]
    additional_notes: String,
}

/// Interpret a completion. Structured JSON is preferred; free text becomes
/// the summary.
pub fn parse_explanation(content: &str) -> Option<NarrativeExplanation> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    let placeholder = NarrativeExplanation::placeholder();
    match serde_json::from_str::<ExplanationPayload>(unfenced) {
        Ok(payload) => Some(NarrativeExplanation {
            summary: payload.summary,
            clinical_significance: payload
                .clinical_significance
                .unwrap_or(placeholder.clinical_significance),
            interaction_warnings: payload.interaction_warnings,
            additional_notes: payload.additional_notes,
        }),
        Err(_) => Some(NarrativeExplanation {
            summary: trimmed.to_string(),
            ..placeholder
        }),
    }
}

pub struct NarrativeExplainer {
    backend: Arc<dyn LlmBackend>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl NarrativeExplainer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            temperature: 0.3,
            max_tokens: 1024,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn explain(&self, case: &CaseSummary<'_>) -> Result<NarrativeExplanation, LlmError> {
        let req = LlmRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(build_prompt(case))],
            model: None,
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let resp = tokio::time::timeout(self.timeout, self.backend.complete(req))
            .await
            .map_err(|_| LlmError::Unavailable(format!("timed out after {:?}", self.timeout)))??;

        tracing::info!(
            model = %resp.model,
            is_local = self.backend.is_local(),
            prompt_tokens = resp.prompt_tokens,
            completion_tokens = resp.completion_tokens,
            "Narrative explanation generated"
        );

        parse_explanation(&resp.content)
            .ok_or_else(|| LlmError::EmptyCompletion(self.backend.model_id().to_string()))
    }

    /// Like [`explain`](Self::explain), but any failure yields the placeholder.
    pub async fn explain_or_placeholder(&self, case: &CaseSummary<'_>) -> NarrativeExplanation {
        match self.explain(case).await {
            Ok(explanation) => explanation,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    model = self.backend.model_id(),
                    drug = case.drug,
                    "Narrative explanation failed; using placeholder"
                );
                NarrativeExplanation::placeholder()
            }
        }
    }
}
