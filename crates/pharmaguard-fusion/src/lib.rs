//! pharmaguard-fusion — Rule table, predictor boundary, decision fusion and report assembly.
//!
//! Request flow: (drug, gene, diplotype) → [`FusionEngine::fuse`] queries the
//! [`RuleStore`] and a [`Predictor`] → [`FusionDecision`] → [`report::assemble`].

pub mod rules;
pub mod guidelines;
pub mod genes;
pub mod predictor;
pub mod model;
pub mod fusion;
pub mod report;

pub use fusion::{fuse_decision, FusionEngine};
pub use model::{ModelArtifacts, ModelPredictor};
pub use pharmaguard_common::FusionDecision;
pub use predictor::{Prediction, Predictor, StaticPredictor, UnavailablePredictor};
pub use report::{assemble, assemble_with_explanation, Report};
pub use rules::RuleStore;
