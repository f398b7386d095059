//! Custom error types for pagemark
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

use crate::dom::NodeId;

/// Main error type for pagemark operations
#[derive(Error, Debug)]
pub enum PageError {
    /// A live DOM read failed (detached node, style computation race)
    #[error("DOM error: {0}")]
    Dom(String),

    /// The node handle does not refer to an element of this document
    #[error("Node {0} not found in document")]
    NodeNotFound(NodeId),

    /// Malformed selector string
    #[error("Selector error: {0}")]
    Selector(String),

    /// Page fixture could not be turned into a document
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document URL could not be parsed
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for pagemark operations
pub type Result<T> = std::result::Result<T, PageError>;

impl PageError {
    /// Create a DOM read error
    pub fn dom(msg: impl Into<String>) -> Self {
        Self::Dom(msg.into())
    }

    /// Create a selector error
    pub fn selector(msg: impl Into<String>) -> Self {
        Self::Selector(msg.into())
    }

    /// Create a fixture error
    pub fn fixture(msg: impl Into<String>) -> Self {
        Self::Fixture(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
