use thiserror::Error;

/// Unified process-level error.
///
/// Source and aggregation failures never reach this type; they are
/// absorbed by the event service. What is left is startup and serving.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
