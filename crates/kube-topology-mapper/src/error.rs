//! Error types for the mapper crate.

use thiserror::Error;

/// Errors that can occur while mapping and dispatching topology records.
#[derive(Error, Debug)]
pub enum TopologyError {
    /// The resource kind is not one the topology tracks.
    #[error("Unsupported kind: {0}")]
    UnsupportedKind(String),

    /// A raw object of a supported kind could not be decoded.
    #[error("Failed to decode {kind}: {reason}")]
    Decode {
        /// Kind the object was decoded as.
        kind: String,
        /// Decoder error message.
        reason: String,
    },

    /// A nested structure could not be flattened to text.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink rejected a record (closed, or full without blocking).
    #[error("Sink unavailable: {0}")]
    SinkUnavailable(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The keepalive scheduler cannot make the requested transition.
    #[error("Keepalive scheduler is {0}")]
    InvalidState(&'static str),

    /// Jobs can no longer be accepted because shutdown has begun.
    #[error("Dispatcher is shutting down")]
    ShuttingDown,
}

impl TopologyError {
    /// Check if this error only affects a single key.
    ///
    /// Key-local errors are logged and skipped; everything else concerns the
    /// pipeline as a whole.
    #[must_use]
    pub fn is_key_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKind(_)
                | Self::Decode { .. }
                | Self::Serialization(_)
                | Self::SinkUnavailable(_)
        )
    }
}

/// A specialized Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_local_classification() {
        assert!(TopologyError::UnsupportedKind("Deployment".into()).is_key_local());
        assert!(TopologyError::SinkUnavailable("full".into()).is_key_local());
        assert!(!TopologyError::ShuttingDown.is_key_local());
        assert!(!TopologyError::Config("bad".into()).is_key_local());
    }
}
