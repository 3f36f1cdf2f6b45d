//! CPIC-style prescribing guidelines keyed by (gene, phenotype, drug).

use serde::{Deserialize, Serialize};

use crate::rules::normalise_symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineEntry {
    pub gene: String,
    pub phenotype: String,
    pub drug: String,
    /// Action code, e.g. `AVOID` or `ALTERNATIVE_THERAPY`.
    pub action: String,
    pub summary: String,
    pub evidence_level: String,
}

impl GuidelineEntry {
    /// Recommendation text attached to rules covered by this guideline.
    pub fn recommendation_text(&self) -> String {
        format!("{}: {} ({})", self.action, self.summary, self.evidence_level)
    }
}

/// Expand metabolizer abbreviations to the names guidelines are keyed by.
/// Anything else is returned trimmed but otherwise unchanged.
pub fn expand_phenotype(phenotype: &str) -> &str {
    match phenotype.trim() {
        "PM" => "Poor Metabolizer",
        "IM" => "Intermediate Metabolizer",
        "NM" => "Normal Metabolizer",
        "RM" => "Rapid Metabolizer",
        "UM" => "Ultra-rapid Metabolizer",
        other => other,
    }
}

#[derive(Debug, Clone, Default)]
pub struct GuidelineStore {
    entries: Vec<GuidelineEntry>,
}

impl GuidelineStore {
    pub fn new(entries: Vec<GuidelineEntry>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        let entry = |gene: &str, phenotype: &str, drug: &str, action: &str, summary: &str| GuidelineEntry {
            gene: gene.to_string(),
            phenotype: phenotype.to_string(),
            drug: drug.to_string(),
            action: action.to_string(),
            summary: summary.to_string(),
            evidence_level: "CPIC Level A".to_string(),
        };

        Self::new(vec![
            entry("CYP2D6", "Poor Metabolizer", "CODEINE", "AVOID",
                "Avoid codeine due to reduced morphine formation."),
            entry("CYP2D6", "Ultra-rapid Metabolizer", "CODEINE", "AVOID",
                "Increased morphine formation may cause toxicity."),
            entry("CYP2C19", "Poor Metabolizer", "CLOPIDOGREL", "ALTERNATIVE_THERAPY",
                "Reduced activation of clopidogrel."),
        ])
    }

    pub fn lookup(&self, gene: &str, phenotype: &str, drug: &str) -> Option<&GuidelineEntry> {
        let gene = normalise_symbol(gene);
        let drug = normalise_symbol(drug);
        let phenotype = expand_phenotype(phenotype);

        self.entries.iter().find(|g| {
            normalise_symbol(&g.gene) == gene
                && g.phenotype.trim() == phenotype
                && normalise_symbol(&g.drug) == drug
        })
    }
}
