//! Logger errors.

/// Failures while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The filter directive string did not parse.
    #[error("invalid filter directive: {0}")]
    Filter(String),

    /// Unknown output format name.
    #[error("unknown log format: {0:?}")]
    Format(String),

    /// A global subscriber was already set.
    #[error("logger already initialized: {0}")]
    AlreadyInitialized(String),
}
