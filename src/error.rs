use crate::Direction;

/// Malformed threshold configuration. Always fatal, reported before any evaluation happens.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{metric}: critical bound {critical} is not worse than warning bound {warning} ({direction})")]
    InvertedBounds {
        metric: String,
        warning: f64,
        critical: f64,
        direction: Direction,
    },
    #[error("{metric}: {kind} bound must be a finite number")]
    NonFiniteBound { metric: String, kind: &'static str },
    #[error("duplicate threshold rule for metric {0}")]
    DuplicateRule(String),
    #[error("rule for {rule} was applied to sample {sample}")]
    MetricMismatch { rule: String, sample: String },
}

/// The miner API could not be queried or answered with something unusable.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API error: {message} (code {code})")]
    Api { code: i64, message: String },
    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("invalid thresholds: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
}
