//! pharmaguard-common — Shared types, errors, and confidence arithmetic used across all PharmaGuard crates.

pub mod error;
pub mod entities;
pub mod confidence;

// Re-export commonly used types
pub use entities::{FusionDecision, NarrativeExplanation, PredictionResult, RuleEntry, Severity};
pub use error::{PharmaGuardError, Result};
