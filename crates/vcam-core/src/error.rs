//! Error types for the camera core.
//!
//! Runtime conditions (empty selection, invalid blend durations, stale
//! candidates, re-entrant updates) are normalized rather than reported.
//! Only configuration and blend table input can fail.

use thiserror::Error;

/// Result type for camera core operations.
pub type CameraResult<T> = Result<T, CameraError>;

/// Errors that can occur while configuring the camera core.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid blend table: {0}")]
    InvalidBlendTable(String),

    #[error("Invalid instruction list: {0}")]
    InvalidInstructions(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl CameraError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an invalid blend table error.
    pub fn invalid_blend_table(message: impl Into<String>) -> Self {
        Self::InvalidBlendTable(message.into())
    }

    /// Create an invalid instruction list error.
    pub fn invalid_instructions(message: impl Into<String>) -> Self {
        Self::InvalidInstructions(message.into())
    }
}
