//! Error types for playback management
//!
//! Engine operations never return these to callers: faults degrade to a
//! logged no-op. They surface from the storage seam, where the host decides
//! what to log.

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Key/value store read or write failed
    #[error("Store error: {0}")]
    Store(String),

    /// Persisted snapshot could not be decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
