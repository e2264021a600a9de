use thiserror::Error;

/// Errors from document store operations (used by trait definitions in scriptdesk-core).
///
/// These never reach registry callers: the persistent store adapter absorbs
/// them and logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query error: {0}")]
    Query(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Errors from the assistant-response backend.
///
/// The core only observes that a generation failed; the variant and message
/// are for logs.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("backend returned no text")]
    EmptyResponse,

    #[error("generation timed out after {0}s")]
    Timeout(u64),

    #[error("generator panicked")]
    Panicked,

    #[error("API key not found in environment variable '{0}'")]
    MissingApiKey(String),
}

/// Errors from building runtime components out of configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown generator provider: '{0}'")]
    UnknownProvider(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}
