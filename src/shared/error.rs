use thiserror::Error;

/// Engine-wide error taxonomy.
///
/// Transient network problems and hard push rejections are deliberately
/// separate variants: the scheduler retries the former and never retries
/// the latter past the configured ceiling. Conflicts are not errors and
/// never appear here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Network operation timed out")]
    Timeout,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
