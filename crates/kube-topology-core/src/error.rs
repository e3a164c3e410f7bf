//! Common error types for kube-topology.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the kube-topology system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The resource kind is not one the topology tracks.
    #[error("unsupported kind: {0}")]
    UnsupportedKind(String),

    /// The relation name does not match any known relation kind.
    #[error("unknown relation: {0}")]
    UnknownRelation(String),

    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),
}
