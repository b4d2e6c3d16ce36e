use std::path::PathBuf;

/// Failures reported by a [`ContentSource`](crate::quiz_engine::content::ContentSource).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContentError {
    #[error("unknown competition: {0}")]
    UnknownCompetition(String),
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A difficulty predictor could not produce a usable value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictorError {
    #[error("prediction failed: {0}")]
    Failed(String),
    #[error("prediction is not a finite number: {0}")]
    NonFinite(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("history store error: {0}")]
    History(String),
    #[error("invalid performance blob: {0}")]
    Blob(#[from] serde_json::Error),
}
