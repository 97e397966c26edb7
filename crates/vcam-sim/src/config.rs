//! Simulation configuration.

use std::path::PathBuf;

use vcam_core::{BlendTable, OrchestratorConfig};

use crate::error::{SimError, SimResult};

/// Simulation configuration.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of frames to simulate
    pub frames: u64,
    /// Frames per second
    pub fps: f64,
    /// Log the published state every N frames (0 disables)
    pub report_every: u64,
    /// Print the Prometheus render when the run completes
    pub print_metrics: bool,
    /// Optional JSON blend table replacing the built-in one
    pub blend_table_path: Option<PathBuf>,
    /// Optional JSON orchestrator config replacing the `VCAM_*` environment
    pub camera_config_path: Option<PathBuf>,
    /// Orchestrator configuration
    pub camera: OrchestratorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            fps: 60.0,
            report_every: 30,
            print_metrics: true,
            blend_table_path: None,
            camera_config_path: None,
            camera: OrchestratorConfig::default(),
        }
    }
}

impl SimConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            frames: std::env::var("SIM_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(600),
            fps: std::env::var("SIM_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60.0),
            report_every: std::env::var("SIM_REPORT_EVERY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            print_metrics: std::env::var("SIM_PRINT_METRICS")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            blend_table_path: std::env::var("SIM_BLEND_TABLE").ok().map(PathBuf::from),
            camera_config_path: std::env::var("SIM_CAMERA_CONFIG").ok().map(PathBuf::from),
            camera: OrchestratorConfig::from_env(),
        }
    }

    /// Seconds per frame.
    pub fn frame_time(&self) -> f64 {
        1.0 / self.fps
    }

    /// Validate all parameters.
    pub fn validate(&self) -> SimResult<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(SimError::config_error(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if self.frames == 0 {
            return Err(SimError::config_error("frames must be at least 1"));
        }
        self.camera.validate()?;
        Ok(())
    }

    /// Replace the camera config from `camera_config_path`, if set.
    pub fn load_camera_config(&mut self) -> SimResult<()> {
        if let Some(path) = &self.camera_config_path {
            let json = std::fs::read_to_string(path)?;
            self.camera = OrchestratorConfig::from_json(&json)?;
        }
        Ok(())
    }

    /// Blend table from `blend_table_path`, if set.
    pub fn load_blend_table(&self) -> SimResult<Option<BlendTable>> {
        match &self.blend_table_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                Ok(Some(BlendTable::from_json(&json)?))
            }
            None => Ok(None),
        }
    }
}
