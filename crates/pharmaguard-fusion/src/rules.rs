//! Static pharmacogenomic rule table.
//!
//! Maps a normalised (drug, gene, diplotype) key to the clinical outcome
//! codified for it. The table is built once at startup and is read-only
//! afterwards, so a single `Arc<RuleStore>` can be shared by every request.

use std::collections::HashMap;
use std::path::Path;

use pharmaguard_common::entities::{RuleEntry, Severity};
use pharmaguard_common::{PharmaGuardError, Result};
use serde::{Deserialize, Serialize};

use crate::guidelines::GuidelineStore;

/// Normalised lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub drug: String,
    pub gene: String,
    pub diplotype: String,
}

impl RuleKey {
    /// Drug and gene are trimmed and upper-cased. The diplotype is an
    /// opaque token: only surrounding whitespace is removed.
    pub fn new(drug: &str, gene: &str, diplotype: &str) -> Self {
        Self {
            drug: normalise_symbol(drug),
            gene: normalise_symbol(gene),
            diplotype: diplotype.trim().to_string(),
        }
    }
}

pub fn normalise_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One row of a rule table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    pub drug: String,
    pub gene: String,
    pub diplotype: String,
    pub phenotype: String,
    pub risk_label: String,
    pub severity: Severity,
    #[serde(default)]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleTableFile {
    rules: Vec<RuleRecord>,
}

// ── Reference table ───────────────────────────────────────────────────────────

// (drug, gene, diplotype, phenotype, risk label, severity)
const BUILTIN_RULES: &[(&str, &str, &str, &str, &str, Severity)] = &[
    ("CODEINE",      "CYP2D6",  "*4/*4",     "PM",              "Ineffective",   Severity::Moderate),
    ("CODEINE",      "CYP2D6",  "*1/*1",     "NM",              "Safe",          Severity::Low),
    ("CODEINE",      "CYP2D6",  "*1/*2",     "IM",              "Adjust Dosage", Severity::Moderate),
    ("CODEINE",      "CYP2D6",  "*1xN/*1xN", "UM",              "Toxic",         Severity::High),
    ("CLOPIDOGREL",  "CYP2C19", "*2/*2",     "PM",              "Ineffective",   Severity::High),
    ("CLOPIDOGREL",  "CYP2C19", "*1/*1",     "NM",              "Safe",          Severity::Low),
    ("CLOPIDOGREL",  "CYP2C19", "*1/*2",     "IM",              "Adjust Dosage", Severity::Moderate),
    ("WARFARIN",     "CYP2C9",  "*3/*3",     "PM",              "Toxic",         Severity::High),
    ("WARFARIN",     "CYP2C9",  "*1/*1",     "NM",              "Safe",          Severity::Low),
    ("WARFARIN",     "CYP2C9",  "*1/*3",     "IM",              "Adjust Dosage", Severity::Moderate),
    ("SIMVASTATIN",  "SLCO1B1", "*5/*5",     "Low Function",    "Toxic",         Severity::High),
    ("SIMVASTATIN",  "SLCO1B1", "*1/*1",     "Normal Function", "Safe",          Severity::Low),
    ("AZATHIOPRINE", "TPMT",    "*3A/*3A",   "Low Activity",    "Toxic",         Severity::Critical),
    ("AZATHIOPRINE", "TPMT",    "*1/*1",     "Normal Activity", "Safe",          Severity::Low),
    ("FLUOROURACIL", "DPYD",    "*2A/*2A",   "Deficient",       "Toxic",         Severity::Critical),
    ("FLUOROURACIL", "DPYD",    "*1/*1",     "Normal",          "Safe",          Severity::Low),
];

// ── Store ─────────────────────────────────────────────────────────────────────

/// Immutable (drug, gene, diplotype) → rule mapping.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    entries: HashMap<RuleKey, RuleEntry>,
}

impl RuleStore {
    /// An empty table; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The reference table, with recommendations filled in from the
    /// builtin guideline table where one applies to the rule's phenotype.
    pub fn builtin() -> Self {
        let guidelines = GuidelineStore::builtin();
        let mut entries = HashMap::with_capacity(BUILTIN_RULES.len());

        for &(drug, gene, diplotype, phenotype, risk_label, severity) in BUILTIN_RULES {
            let mut entry = RuleEntry::new(phenotype, risk_label, severity);
            if let Some(guideline) = guidelines.lookup(gene, phenotype, drug) {
                entry = entry.with_recommendation(guideline.recommendation_text());
            }
            entries.insert(RuleKey::new(drug, gene, diplotype), entry);
        }

        Self { entries }
    }

    /// Build a table from records, rejecting keys that collide after
    /// normalisation.
    pub fn from_records(records: impl IntoIterator<Item = RuleRecord>) -> Result<Self> {
        let mut entries = HashMap::new();

        for record in records {
            let key = RuleKey::new(&record.drug, &record.gene, &record.diplotype);
            if key.drug.is_empty() || key.gene.is_empty() || key.diplotype.is_empty() {
                return Err(PharmaGuardError::Config(format!(
                    "rule with empty key component: {}/{}/{}",
                    record.drug, record.gene, record.diplotype
                )));
            }

            let entry = RuleEntry {
                phenotype: record.phenotype,
                risk_label: record.risk_label,
                severity: record.severity,
                recommendation: record.recommendation,
            };

            if entries.contains_key(&key) {
                return Err(PharmaGuardError::Config(format!(
                    "duplicate rule for {}/{}/{}",
                    key.drug, key.gene, key.diplotype
                )));
            }
            entries.insert(key, entry);
        }

        Ok(Self { entries })
    }

    /// Parse a YAML rule table of the form `rules: [{drug, gene, diplotype, ...}]`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: RuleTableFile = serde_yaml::from_str(yaml)?;
        Self::from_records(file.rules)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let store = Self::from_yaml_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            rules = store.len(),
            "Loaded rule table"
        );
        Ok(store)
    }

    /// Replace or add entries from `other`. Returns how many existing
    /// entries were overridden.
    pub fn override_with(&mut self, other: RuleStore) -> usize {
        let mut overridden = 0;
        for (key, entry) in other.entries {
            if let Some(previous) = self.entries.insert(key.clone(), entry) {
                overridden += 1;
                tracing::debug!(
                    drug = %key.drug,
                    gene = %key.gene,
                    diplotype = %key.diplotype,
                    previous_label = %previous.risk_label,
                    "Rule overridden"
                );
            }
        }
        overridden
    }

    /// Exact-match lookup. An unseen diplotype is a miss, never a
    /// nearest-rule guess.
    pub fn lookup(&self, drug: &str, gene: &str, diplotype: &str) -> Option<&RuleEntry> {
        self.entries.get(&RuleKey::new(drug, gene, diplotype))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct drugs covered by the table, sorted.
    pub fn drugs(&self) -> Vec<&str> {
        let mut drugs: Vec<&str> = self.entries.keys().map(|k| k.drug.as_str()).collect();
        drugs.sort_unstable();
        drugs.dedup();
        drugs
    }

    /// All rows, sorted by key.
    pub fn records(&self) -> Vec<RuleRecord> {
        let mut rows: Vec<(&RuleKey, &RuleEntry)> = self.entries.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows.into_iter()
            .map(|(key, entry)| RuleRecord {
                drug: key.drug.clone(),
                gene: key.gene.clone(),
                diplotype: key.diplotype.clone(),
                phenotype: entry.phenotype.clone(),
                risk_label: entry.risk_label.clone(),
                severity: entry.severity,
                recommendation: entry.recommendation.clone(),
            })
            .collect()
    }

    /// Serialize in the same format `from_yaml_str` reads.
    pub fn to_yaml_string(&self) -> Result<String> {
        let file = RuleTableFile { rules: self.records() };
        Ok(serde_yaml::to_string(&file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmaguard_common::entities::GENERIC_RECOMMENDATION;

    #[test]
    fn test_builtin_codeine_poor_metabolizer() {
        let store = RuleStore::builtin();
        let rule = store.lookup("CODEINE", "CYP2D6", "*4/*4").unwrap();
        assert_eq!(rule.phenotype, "PM");
        assert_eq!(rule.risk_label, "Ineffective");
        assert_eq!(rule.severity, Severity::Moderate);
    }

    #[test]
    fn test_lookup_normalises_drug_and_gene() {
        let store = RuleStore::builtin();
        let upper = store.lookup("CODEINE", "CYP2D6", "*4/*4");
        let lower = store.lookup("  codeine ", "cyp2d6", " *4/*4 ");
        assert!(upper.is_some());
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_unseen_diplotype_is_a_miss() {
        let store = RuleStore::builtin();
        assert!(store.lookup("CODEINE", "CYP2D6", "*4/*41").is_none());
        assert!(store.lookup("CODEINE", "CYP2D6", "*4").is_none());
        // Diplotype comparison is exact, so allele order matters.
        assert!(store.lookup("CODEINE", "CYP2D6", "*2/*1").is_none());
    }

    #[test]
    fn test_builtin_recommendations() {
        let store = RuleStore::builtin();
        let pm = store.lookup("CODEINE", "CYP2D6", "*4/*4").unwrap();
        assert!(pm.recommendation().starts_with("AVOID"));
        let nm = store.lookup("WARFARIN", "CYP2C9", "*1/*1").unwrap();
        assert_eq!(nm.recommendation(), GENERIC_RECOMMENDATION);
    }

    #[test]
    fn test_builtin_drugs() {
        let store = RuleStore::builtin();
        assert_eq!(store.len(), 16);
        assert_eq!(
            store.drugs(),
            vec!["AZATHIOPRINE", "CLOPIDOGREL", "CODEINE", "FLUOROURACIL", "SIMVASTATIN", "WARFARIN"]
        );
    }

    #[test]
    fn test_yaml_table() {
        let yaml = r#"
rules:
  - drug: tamoxifen
    gene: cyp2d6
    diplotype: "*4/*4"
    phenotype: PM
    risk_label: Ineffective
    severity: High
    recommendation: Consider an aromatase inhibitor.
"#;
        let store = RuleStore::from_yaml_str(yaml).unwrap();
        let rule = store.lookup("TAMOXIFEN", "CYP2D6", "*4/*4").unwrap();
        assert_eq!(rule.severity, Severity::High);
        assert_eq!(rule.recommendation(), "Consider an aromatase inhibitor.");
    }

    #[test]
    fn test_yaml_duplicate_after_normalisation_rejected() {
        let yaml = r#"
rules:
  - { drug: CODEINE, gene: CYP2D6, diplotype: "*1/*1", phenotype: NM, risk_label: Safe, severity: low }
  - { drug: codeine, gene: cyp2d6, diplotype: " *1/*1", phenotype: NM, risk_label: Toxic, severity: high }
"#;
        let err = RuleStore::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, PharmaGuardError::Config(_)));
    }

    #[test]
    fn test_yaml_unknown_severity_rejected() {
        let yaml = r#"
rules:
  - { drug: CODEINE, gene: CYP2D6, diplotype: "*1/*1", phenotype: NM, risk_label: Safe, severity: mild }
"#;
        assert!(RuleStore::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_override_replaces_existing_rule() {
        let mut store = RuleStore::builtin();
        let custom = RuleStore::from_records(vec![RuleRecord {
            drug: "codeine".to_string(),
            gene: "CYP2D6".to_string(),
            diplotype: "*1/*1".to_string(),
            phenotype: "NM".to_string(),
            risk_label: "Adjust Dosage".to_string(),
            severity: Severity::Moderate,
            recommendation: None,
        }])
        .unwrap();

        assert_eq!(store.override_with(custom), 1);
        assert_eq!(store.len(), 16);
        assert_eq!(store.lookup("CODEINE", "CYP2D6", "*1/*1").unwrap().risk_label, "Adjust Dosage");
    }

    #[test]
    fn test_exported_yaml_loads_back() {
        let store = RuleStore::builtin();
        let yaml = store.to_yaml_string().unwrap();
        let reloaded = RuleStore::from_yaml_str(&yaml).unwrap();
        assert_eq!(reloaded.len(), store.len());
        assert_eq!(
            reloaded.lookup("AZATHIOPRINE", "TPMT", "*3A/*3A"),
            store.lookup("AZATHIOPRINE", "TPMT", "*3A/*3A")
        );
    }

    #[test]
    fn test_empty_store_misses() {
        let store = RuleStore::empty();
        assert!(store.is_empty());
        assert!(store.lookup("CODEINE", "CYP2D6", "*4/*4").is_none());
    }

    #[test]
    fn test_override_with_empty_is_noop() {
        let mut store = RuleStore::builtin();
        assert_eq!(store.override_with(RuleStore::empty()), 0);
        assert_eq!(store.len(), 16);
        assert_eq!(store.lookup("CODEINE", "CYP2D6", "*1/*1").unwrap().risk_label, "Safe");
    }
}
