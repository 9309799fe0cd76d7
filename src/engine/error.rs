use thiserror::Error;

use crate::gateway::GatewayError;
use crate::routing::RoutingError;
use crate::scoring::ScoringError;

/// Errors surfaced by [`Engine`](super::Engine).
///
/// Request-time entry points only fail on caller misuse; environmental
/// failures degrade the answer instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown scenario: {name}")]
    UnknownScenario { name: String },

    #[error("unknown collection: {collection}")]
    UnknownCollection { collection: String },

    #[error("engine is missing a {component}")]
    MissingComponent { component: &'static str },

    #[error("invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("routing table rejected: {0}")]
    Routing(#[from] RoutingError),

    #[error("gateway registry check failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("reranker setup failed: {0}")]
    Scoring(#[from] ScoringError),
}
