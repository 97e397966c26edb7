//! Simulation error types.

use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),

    #[error("Camera error: {0}")]
    Camera(#[from] vcam_core::CameraError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
