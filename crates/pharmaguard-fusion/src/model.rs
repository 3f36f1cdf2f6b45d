//! Trained classifier artifacts and the predictor that applies them.
//!
//! Artifacts are exported by the offline training job as JSON:
//!
//! ```json
//! {
//!   "encoders": { "drug": ["CODEINE"], "gene": ["CYP2D6"], "star": ["*1/*1", "*4/*4"] },
//!   "classes": ["Ineffective", "Safe"],
//!   "rows": [ { "drug": 0, "gene": 0, "star": 1, "proba": [0.91, 0.09] } ]
//! }
//! ```
//!
//! They are loaded once, validated, and handed to [`ModelPredictor`] as an
//! `Arc`, so every request shares the same immutable copy.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use pharmaguard_common::confidence::{is_valid_confidence, round_confidence};
use pharmaguard_common::{PharmaGuardError, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::predictor::{Prediction, Predictor};
use crate::rules::normalise_symbol;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("unseen {column} category: {value}")]
    UnseenCategory { column: &'static str, value: String },
    #[error("no probability row for encoded triple {0:?}")]
    MissingRow([usize; 3]),
}

// ── Encoders ──────────────────────────────────────────────────────────────────

/// Label encoder for one categorical column: category → dense index.
///
/// Categories are stored in the same normal form requests are looked up
/// with, so artifacts exported with lowercase symbols still match.
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    column: &'static str,
    index: HashMap<String, usize>,
}

fn trim_token(raw: &str) -> String {
    raw.trim().to_string()
}

impl CategoryEncoder {
    pub fn new(column: &'static str, categories: &[String], normalise: fn(&str) -> String) -> Result<Self> {
        let mut index = HashMap::with_capacity(categories.len());
        for (i, category) in categories.iter().enumerate() {
            if index.insert(normalise(category), i).is_some() {
                return Err(PharmaGuardError::Model(format!(
                    "duplicate {} category: {}", column, category
                )));
            }
        }
        Ok(Self { column, index })
    }

    pub fn transform(&self, value: &str) -> std::result::Result<usize, ModelError> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| ModelError::UnseenCategory {
                column: self.column,
                value: value.to_string(),
            })
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

// ── Artifact file format ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSet {
    pub drug: Vec<String>,
    pub gene: Vec<String>,
    pub star: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityRow {
    pub drug: usize,
    pub gene: usize,
    pub star: usize,
    pub proba: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub encoders: EncoderSet,
    pub classes: Vec<String>,
    pub rows: Vec<ProbabilityRow>,
}

// ── Artifacts ─────────────────────────────────────────────────────────────────

/// Validated, immutable classifier state.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    drug: CategoryEncoder,
    gene: CategoryEncoder,
    star: CategoryEncoder,
    classes: Vec<String>,
    table: HashMap<[usize; 3], Vec<f64>>,
}

impl ModelArtifacts {
    pub fn from_file_format(file: ArtifactFile) -> Result<Self> {
        if file.classes.is_empty() {
            return Err(PharmaGuardError::Model("artifact has no classes".to_string()));
        }

        let drug = CategoryEncoder::new("drug", &file.encoders.drug, normalise_symbol)?;
        let gene = CategoryEncoder::new("gene", &file.encoders.gene, normalise_symbol)?;
        let star = CategoryEncoder::new("star", &file.encoders.star, trim_token)?;

        let mut table = HashMap::with_capacity(file.rows.len());
        for row in file.rows {
            let key = [row.drug, row.gene, row.star];
            if row.drug >= drug.len() || row.gene >= gene.len() || row.star >= star.len() {
                return Err(PharmaGuardError::Model(format!(
                    "row {:?} references a category outside the encoders", key
                )));
            }
            if row.proba.len() != file.classes.len() {
                return Err(PharmaGuardError::Model(format!(
                    "row {:?} has {} probabilities for {} classes",
                    key, row.proba.len(), file.classes.len()
                )));
            }
            if !row.proba.iter().all(|p| is_valid_confidence(*p)) {
                return Err(PharmaGuardError::Model(format!(
                    "row {:?} has a probability outside [0, 1]", key
                )));
            }
            if table.insert(key, row.proba).is_some() {
                return Err(PharmaGuardError::Model(format!("duplicate row {:?}", key)));
            }
        }

        Ok(Self { drug, gene, star, classes: file.classes, table })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ArtifactFile = serde_json::from_str(json)?;
        Self::from_file_format(file)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let artifacts = Self::from_json_str(&content)?;
        tracing::info!(
            path = %path.as_ref().display(),
            classes = artifacts.classes.len(),
            rows = artifacts.table.len(),
            "Loaded model artifacts"
        );
        Ok(artifacts)
    }

    /// Most probable class and its probability.
    pub fn classify(&self, drug: &str, gene: &str, star: &str) -> std::result::Result<(&str, f64), ModelError> {
        let key = [
            self.drug.transform(drug)?,
            self.gene.transform(gene)?,
            self.star.transform(star)?,
        ];
        let proba = self.table.get(&key).ok_or(ModelError::MissingRow(key))?;

        // First maximum wins on ties, matching argmax.
        let (best, p) = proba
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc });

        Ok((self.classes[best].as_str(), p))
    }
}

// ── Predictor ─────────────────────────────────────────────────────────────────

/// Predictor backed by loaded [`ModelArtifacts`].
#[derive(Debug, Clone)]
pub struct ModelPredictor {
    artifacts: Arc<ModelArtifacts>,
}

impl ModelPredictor {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }
}

impl Predictor for ModelPredictor {
    fn predict(&self, drug: &str, gene: &str, diplotype: &str) -> Prediction {
        let drug = normalise_symbol(drug);
        let gene = normalise_symbol(gene);

        match self.artifacts.classify(&drug, &gene, diplotype.trim()) {
            Ok((label, p)) => Prediction::from_model(label, round_confidence(p)),
            Err(e) => Prediction::Unavailable(e.to_string()),
        }
    }
}
