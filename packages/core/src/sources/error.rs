//! Error types for source adapters

use thiserror::Error;

/// Errors a single source adapter can fail with.
///
/// Either one fails the whole adapter call; the aggregator isolates it from
/// the other sources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network failure, timeout, or a non-2xx upstream status.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The upstream answered, but not in the shape the adapter expects.
    #[error("Upstream format error: {message}")]
    UpstreamFormat { message: String },
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::UpstreamFormat { message: message.into() }
    }
}

/// Result type for adapter operations
pub type SourceResult<T> = Result<T, SourceError>;
