use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by a collection gateway.
pub enum GatewayError {
    /// The collection did not answer within its timeout.
    #[error("query to '{collection}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Collection name.
        collection: String,
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// Transport or server failure.
    #[error("query to '{collection}' failed: {message}")]
    RequestFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// The gateway does not serve this collection.
    #[error("collection not found: {collection}")]
    UnknownCollection {
        /// Collection name.
        collection: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response from '{collection}': {message}")]
    InvalidResponse {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// The collection registry could not be fetched.
    #[error("failed to list collections: {message}")]
    RegistryUnavailable {
        /// Error message.
        message: String,
    },
}

impl GatewayError {
    /// `true` for failures worth retrying on a later request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Timeout { .. } | GatewayError::RequestFailed { .. }
        )
    }
}
