//! PharmaGuard — pharmacogenomic drug-response risk estimation.
//! Entry point for the `pharmaguard` binary.

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pharmaguard_common::NarrativeExplanation;
use pharmaguard_fusion::genes::primary_gene;
use pharmaguard_fusion::{
    assemble_with_explanation, FusionEngine, ModelArtifacts, ModelPredictor, Predictor, RuleStore,
    UnavailablePredictor,
};
use pharmaguard_llm::{CaseSummary, LlmBackend, NarrativeExplainer, OllamaBackend, OpenAiBackend};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LlmConfig, LlmMode, ModelConfig, RulesConfig};

#[derive(Debug, Parser)]
#[command(name = "pharmaguard", version, about = "Fuse clinical PGx rules with a trained classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Produce a risk report for one drug and diplotype.
    Analyze {
        #[arg(long)]
        drug: String,
        /// Defaults to the pharmacogene that governs the drug.
        #[arg(long)]
        gene: Option<String>,
        #[arg(long)]
        diplotype: String,
        /// Detected variant identifiers (repeatable), e.g. rs3892097.
        #[arg(long = "variant")]
        variants: Vec<String>,
        /// Attach an LLM-generated narrative explanation.
        #[arg(long)]
        explain: bool,
    },
    /// Print the loaded rule table as YAML.
    Rules,
}

fn build_rule_store(cfg: &RulesConfig) -> anyhow::Result<RuleStore> {
    let Some(path) = cfg.table_path.as_deref() else {
        return Ok(RuleStore::builtin());
    };

    let custom = RuleStore::from_yaml_file(path)?;
    if cfg.replace_builtin {
        return Ok(custom);
    }

    let mut store = RuleStore::builtin();
    let overridden = store.override_with(custom);
    tracing::info!(overridden, total = store.len(), "Custom rules merged over builtin table");
    Ok(store)
}

fn build_predictor(cfg: &ModelConfig) -> anyhow::Result<Arc<dyn Predictor>> {
    match cfg.artifacts_path.as_deref() {
        Some(path) => {
            let artifacts = Arc::new(ModelArtifacts::from_json_file(path)?);
            Ok(Arc::new(ModelPredictor::new(artifacts)))
        }
        None => {
            tracing::warn!("No model artifacts configured (model.artifacts_path); predictions will fall back to Unknown");
            Ok(Arc::new(UnavailablePredictor))
        }
    }
}

fn build_explainer(cfg: &LlmConfig) -> Option<NarrativeExplainer> {
    let backend: Arc<dyn LlmBackend> = match cfg.mode {
        LlmMode::Disabled => return None,
        LlmMode::Ollama => Arc::new(OllamaBackend::new(cfg.ollama_base_url(), cfg.model_name())),
        LlmMode::OpenAi => {
            let key = std::env::var(&cfg.api_key_env).unwrap_or_default();
            if key.is_empty() {
                tracing::warn!(
                    env = %cfg.api_key_env,
                    "OpenAI configured but no API key found; explanations disabled"
                );
                return None;
            }
            let backend = OpenAiBackend::new(key, cfg.model_name());
            let backend = match cfg.base_url.as_deref() {
                Some(base_url) => backend.with_base_url(base_url),
                None => backend,
            };
            Arc::new(backend)
        }
    };

    Some(
        NarrativeExplainer::new(backend)
            .with_temperature(cfg.temperature)
            .with_max_tokens(cfg.max_tokens)
            .with_timeout(Duration::from_secs(cfg.timeout_secs)),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = Config::load()?;

    // Initialise structured logging on stderr so stdout stays a clean report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    match &config_path {
        Some(path) => tracing::info!(path = %path.display(), "Configuration loaded"),
        None => tracing::info!(path = %Config::path().display(), "No config file found; using defaults"),
    }

    let rules = Arc::new(build_rule_store(&config.rules)?);

    match cli.command {
        Command::Rules => {
            print!("{}", rules.to_yaml_string()?);
        }

        Command::Analyze { drug, gene, diplotype, variants, explain } => {
            let gene = match gene {
                Some(gene) => gene,
                None => primary_gene(&drug)?.to_string(),
            };

            let engine = FusionEngine::new(rules, build_predictor(&config.model)?);
            let decision = engine.fuse(&drug, &gene, &diplotype)?;

            let explanation = if explain {
                match build_explainer(&config.llm) {
                    Some(explainer) => {
                        let case = CaseSummary {
                            drug: &drug,
                            gene: &gene,
                            diplotype: &diplotype,
                            risk_label: &decision.risk_label,
                            severity: decision.severity,
                        };
                        explainer.explain_or_placeholder(&case).await
                    }
                    None => {
                        tracing::warn!("--explain requested but llm.mode is disabled; using placeholder");
                        NarrativeExplanation::placeholder()
                    }
                }
            } else {
                NarrativeExplanation::placeholder()
            };

            let report = assemble_with_explanation(&drug, &gene, &diplotype, &variants, &decision, explanation);
            tracing::info!(
                case_id = %report.patient_id,
                risk_label = %report.risk_assessment.risk_label,
                confidence = report.risk_assessment.confidence_score,
                "Report assembled"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
