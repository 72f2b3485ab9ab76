/// Core error types for Lyre
use thiserror::Error;

/// Result type alias using `LyreError`
pub type Result<T> = std::result::Result<T, LyreError>;

/// Core error type for Lyre
#[derive(Error, Debug)]
pub enum LyreError {
    /// Catalog could not be read or is malformed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LyreError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}
