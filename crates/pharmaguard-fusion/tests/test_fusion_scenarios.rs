//! End-to-end fusion scenarios against the builtin rule table.

use std::sync::Arc;
use std::thread;

use pharmaguard_common::{PredictionResult, Severity};
use pharmaguard_fusion::{
    assemble, FusionEngine, ModelArtifacts, ModelPredictor, Prediction, Predictor, RuleStore,
    StaticPredictor, UnavailablePredictor,
};

fn engine_with(predictor: impl Predictor + 'static) -> FusionEngine {
    FusionEngine::new(Arc::new(RuleStore::builtin()), Arc::new(predictor))
}

#[test]
fn scenario_rule_and_model_agree() {
    let engine = engine_with(
        StaticPredictor::new().with("CODEINE", "CYP2D6", "*4/*4", "Ineffective", 0.91),
    );
    let d = engine.fuse("CODEINE", "CYP2D6", "*4/*4").unwrap();

    assert_eq!(d.risk_label, "Ineffective");
    assert_eq!(d.confidence_score, 0.91);
    assert_eq!(d.agreement, Some(true));
    assert!(d.rule_used);
    assert!(d.model_used);
}

#[test]
fn scenario_model_disagrees_with_rule() {
    let engine = engine_with(
        StaticPredictor::new().with("CODEINE", "CYP2D6", "*4/*4", "Safe", 0.8),
    );
    let d = engine.fuse("CODEINE", "CYP2D6", "*4/*4").unwrap();

    assert_eq!(d.risk_label, "Ineffective");
    assert_eq!(d.confidence_score, 0.56);
    assert_eq!(d.agreement, Some(false));
}

#[test]
fn scenario_no_rule_and_model_unavailable() {
    let engine = engine_with(UnavailablePredictor);
    let d = engine.fuse("CODEINE", "CYP2D6", "*10/*17").unwrap();

    assert_eq!(d.risk_label, "Unknown");
    assert_eq!(d.phenotype, "Unknown");
    assert_eq!(d.severity, Severity::Unknown);
    assert!(!d.rule_used);
    assert!(!d.model_used);
    assert_eq!(d.agreement, None);
    assert_eq!(d.confidence_score, 0.0);
}

#[test]
fn agreement_is_null_exactly_when_no_rule() {
    let engine = engine_with(
        StaticPredictor::new()
            .with("CODEINE", "CYP2D6", "*1/*1", "Safe", 0.7)
            .with("TAMOXIFEN", "CYP2D6", "*4/*4", "Ineffective", 0.6),
    );
    for (drug, gene, diplotype) in [
        ("CODEINE", "CYP2D6", "*1/*1"),
        ("TAMOXIFEN", "CYP2D6", "*4/*4"),
        ("WARFARIN", "CYP2C9", "*1/*3"),
        ("WARFARIN", "CYP2C9", "*2/*2"),
    ] {
        let d = engine.fuse(drug, gene, diplotype).unwrap();
        assert_eq!(d.agreement.is_none(), !d.rule_used, "{drug}/{gene}/{diplotype}");
    }
}

#[test]
fn fusion_is_idempotent() {
    let engine = engine_with(
        StaticPredictor::new().with("CLOPIDOGREL", "CYP2C19", "*2/*2", "Adjust Dosage", 0.67),
    );
    let first = engine.fuse("CLOPIDOGREL", "CYP2C19", "*2/*2").unwrap();
    let second = engine.fuse("CLOPIDOGREL", "CYP2C19", "*2/*2").unwrap();
    assert_eq!(first, second);
}

#[test]
fn drug_and_gene_are_case_insensitive() {
    let engine = engine_with(
        StaticPredictor::new().with("CODEINE", "CYP2D6", "*4/*4", "Ineffective", 0.91),
    );
    let lower = engine.fuse("codeine", "cyp2d6", "*4/*4").unwrap();
    let upper = engine.fuse("CODEINE", "CYP2D6", "*4/*4").unwrap();
    assert_eq!(lower, upper);
}

#[test]
fn engine_is_shared_across_threads() {
    let engine = engine_with(
        StaticPredictor::new().with("FLUOROURACIL", "DPYD", "*2A/*2A", "Toxic", 0.95),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || engine.fuse("FLUOROURACIL", "DPYD", "*2A/*2A").unwrap())
        })
        .collect();

    for handle in handles {
        let d = handle.join().unwrap();
        assert_eq!(d.severity, Severity::Critical);
        assert_eq!(d.confidence_score, 0.95);
    }
}

#[test]
fn model_predictor_with_unseen_star_keeps_rule() {
    let artifacts = ModelArtifacts::from_json_str(
        r#"{
            "encoders": { "drug": ["SIMVASTATIN"], "gene": ["SLCO1B1"], "star": ["*1/*1"] },
            "classes": ["Safe", "Toxic"],
            "rows": [ { "drug": 0, "gene": 0, "star": 0, "proba": [0.83, 0.17] } ]
        }"#,
    )
    .unwrap();
    let predictor = ModelPredictor::new(Arc::new(artifacts));
    assert!(matches!(
        predictor.predict("SIMVASTATIN", "SLCO1B1", "*5/*5"),
        Prediction::Unavailable(_)
    ));

    let engine = engine_with(predictor);
    let known = engine.fuse("simvastatin", "slco1b1", "*1/*1").unwrap();
    assert_eq!(known.risk_label, "Safe");
    assert_eq!(known.confidence_score, 0.83);
    assert_eq!(known.agreement, Some(true));

    let unseen = engine.fuse("SIMVASTATIN", "SLCO1B1", "*5/*5").unwrap();
    assert_eq!(unseen.risk_label, "Toxic");
    assert_eq!(unseen.severity, Severity::High);
    assert!(unseen.rule_used);
    assert!(!unseen.model_used);
    assert_eq!(unseen.confidence_score, 0.0);
}

#[test]
fn report_from_fused_decision() {
    let engine = engine_with(
        StaticPredictor::new().with("AZATHIOPRINE", "TPMT", "*3A/*3A", "Toxic", 0.9),
    );
    let d = engine.fuse("AZATHIOPRINE", "TPMT", "*3A/*3A").unwrap();
    let report = assemble("AZATHIOPRINE", "TPMT", "*3A/*3A", &["rs1800460".to_string()], &d);

    assert!(report.clinical_recommendation.monitoring_required);
    assert_eq!(report.risk_assessment.severity, Severity::Critical);
    assert!(report.quality_metrics.rule_engine_used);
    assert!(report.quality_metrics.ml_model_used);
}

/// Returns a fixed confidence without going through `Prediction::from_model`.
struct RawConfidencePredictor(f64);

impl Predictor for RawConfidencePredictor {
    fn predict(&self, _drug: &str, _gene: &str, _diplotype: &str) -> Prediction {
        Prediction::Success(PredictionResult::from_model("Safe", self.0))
    }
}

#[test]
fn out_of_range_confidence_never_reaches_decision() {
    let with_rule = engine_with(RawConfidencePredictor(1.5));
    let d = with_rule.fuse("CODEINE", "CYP2D6", "*1/*1").unwrap();
    assert_eq!(d.risk_label, "Safe");
    assert!(!d.model_used);
    assert_eq!(d.confidence_score, 0.0);

    let no_rule = engine_with(RawConfidencePredictor(f64::NAN));
    let d = no_rule.fuse("CODEINE", "CYP2D6", "*10/*17").unwrap();
    assert_eq!(d.risk_label, "Unknown");
    assert!(!d.model_used);
    assert!((0.0..=1.0).contains(&d.confidence_score));
}
