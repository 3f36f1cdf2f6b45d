use thiserror::Error;

#[derive(Debug, Error)]
pub enum PharmaGuardError {
    #[error("Malformed input: {field} must be a non-empty identifier")]
    MalformedInput { field: &'static str },

    #[error("Unsupported drug: {0}")]
    UnsupportedDrug(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model artifact error: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PharmaGuardError>;
