use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a routing table, or when a
/// caller names a scenario the table does not define.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("failed to read routing table '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse routing table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("scenario '{scenario}' references unknown collection '{collection}'")]
    UnknownCollection { scenario: String, collection: String },

    #[error("unknown scenario: {name}")]
    UnknownScenario { name: String },

    #[error("scenario '{name}' is defined more than once")]
    DuplicateScenario { name: String },

    #[error("scenario name '{name}' is reserved")]
    ReservedScenario { name: String },

    #[error("scenario '{scenario}' has no keywords")]
    EmptyKeywords { scenario: String },

    #[error("scenario '{scenario}' has no required collections")]
    EmptyRequired { scenario: String },

    #[error("routing table fallback order is empty")]
    EmptyFallback,
}
