//! Configuration for arbitration and orchestration.
//!
//! Centralizes the tunable timing parameters so presets and environment
//! overrides share one definition.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::candidate::ALL_CHANNELS;
use crate::error::{CameraError, CameraResult};
use vcam_models::{BlendCurve, BlendDefinition};

/// Built-in candidate scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Greatest priority wins, ties by declaration order
    #[default]
    Priority,
    /// Greatest priority, then greatest shot quality
    Quality,
}

impl FromStr for ScoringMode {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(ScoringMode::Priority),
            "quality" | "best_shot" => Ok(ScoringMode::Quality),
            other => Err(CameraError::invalid_config(format!("unknown scoring mode '{}'", other))),
        }
    }
}

/// Scheduling pass a frame update is issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePhase {
    /// Fixed-timestep (physics) pass
    Fixed,
    /// End-of-frame pass
    #[default]
    Late,
}

/// Which scheduling passes drive an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMethod {
    /// Only fixed-timestep updates are processed
    Fixed,
    /// Only end-of-frame updates are processed
    Late,
    /// Whichever pass arrives first in a frame is processed
    #[default]
    Smart,
}

impl UpdateMethod {
    /// Whether an update issued from `phase` should be processed.
    pub fn accepts(self, phase: UpdatePhase) -> bool {
        match self {
            UpdateMethod::Fixed => phase == UpdatePhase::Fixed,
            UpdateMethod::Late => phase == UpdatePhase::Late,
            UpdateMethod::Smart => true,
        }
    }
}

impl FromStr for UpdateMethod {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(UpdateMethod::Fixed),
            "late" => Ok(UpdateMethod::Late),
            "smart" => Ok(UpdateMethod::Smart),
            other => Err(CameraError::invalid_config(format!("unknown update method '{}'", other))),
        }
    }
}

/// Configuration for live-candidate arbitration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrationConfig {
    /// Built-in scoring strategy used by `default_scorer`.
    pub scoring: ScoringMode,

    /// Seconds a candidate must stay best before it is promoted.
    /// Default: 0.0 (immediate)
    pub activate_after: f64,

    /// Seconds the live candidate is held before it may be replaced.
    /// Default: 0.0
    pub min_duration: f64,

    /// Allow a pending candidate with strictly higher priority to
    /// preempt the live one before `min_duration` has elapsed.
    /// Default: false
    pub priority_overrides_min_duration: bool,

    /// Break full priority/quality ties randomly instead of by declaration order.
    /// Default: false
    pub randomize_ties: bool,

    /// Also reshuffle the tie order on every pending check, not only when an
    /// activation is confirmed.
    /// Default: false
    pub rerandomize_while_pending: bool,

    /// Seed for tie randomization. `None` seeds from the OS.
    pub random_seed: Option<u64>,

    /// Only candidates whose channel intersects this mask compete.
    /// Default: all channels
    pub channel_mask: u32,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringMode::Priority,
            activate_after: 0.0,
            min_duration: 0.0,
            priority_overrides_min_duration: false,
            randomize_ties: false,
            rerandomize_while_pending: false,
            random_seed: None,
            channel_mask: ALL_CHANNELS,
        }
    }
}

impl ArbitrationConfig {
    /// Best-shot selection: quality ranking with a short confirmation delay
    /// and a minimum hold.
    pub fn best_shot() -> Self {
        Self {
            scoring: ScoringMode::Quality,
            activate_after: 0.25,
            min_duration: 1.0,
            ..Default::default()
        }
    }

    /// State-driven selection: minimum hold that higher priorities may cut short.
    pub fn state_driven() -> Self {
        Self {
            min_duration: 0.5,
            priority_overrides_min_duration: true,
            ..Default::default()
        }
    }

    /// Whether any activation delay or minimum hold is configured.
    pub fn has_hysteresis(&self) -> bool {
        self.activate_after > 0.0 || self.min_duration > 0.0
    }

    /// Validate timing parameters.
    pub fn validate(&self) -> CameraResult<()> {
        if !self.activate_after.is_finite() || self.activate_after < 0.0 {
            return Err(CameraError::invalid_config(format!(
                "activate_after must be a non-negative number of seconds, got {}",
                self.activate_after
            )));
        }
        if !self.min_duration.is_finite() || self.min_duration < 0.0 {
            return Err(CameraError::invalid_config(format!(
                "min_duration must be a non-negative number of seconds, got {}",
                self.min_duration
            )));
        }
        if self.channel_mask == 0 {
            return Err(CameraError::invalid_config(
                "channel_mask of 0 excludes every candidate",
            ));
        }
        Ok(())
    }
}

/// Configuration for a per-frame orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Arbitration parameters.
    pub arbitration: ArbitrationConfig,

    /// Blend used when the blend lookup has no entry for a transition.
    /// Default: ease-in-out over 2 seconds
    pub default_blend: BlendDefinition,

    /// Which scheduling passes are processed.
    pub update_method: UpdateMethod,

    /// World up handed to candidates when they become live.
    pub world_up: DVec3,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            arbitration: ArbitrationConfig::default(),
            default_blend: BlendDefinition::default(),
            update_method: UpdateMethod::Smart,
            world_up: DVec3::Y,
        }
    }
}

impl OrchestratorConfig {
    /// Quick transitions and immediate switching.
    pub fn responsive() -> Self {
        Self {
            default_blend: BlendDefinition::new(BlendCurve::EaseInOut, 0.5),
            ..Default::default()
        }
    }

    /// Slow transitions with a long minimum hold.
    pub fn stable() -> Self {
        Self {
            arbitration: ArbitrationConfig {
                activate_after: 0.5,
                min_duration: 2.0,
                ..Default::default()
            },
            default_blend: BlendDefinition::new(BlendCurve::EaseInOut, 2.0),
            ..Default::default()
        }
    }

    /// Quality-ranked best-shot selection.
    pub fn best_shot() -> Self {
        Self {
            arbitration: ArbitrationConfig::best_shot(),
            default_blend: BlendDefinition::new(BlendCurve::EaseInOut, 1.0),
            ..Default::default()
        }
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> CameraResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Create config from environment variables, starting from defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let arbitration = ArbitrationConfig {
            scoring: env_parse("VCAM_SCORING").unwrap_or(defaults.arbitration.scoring),
            activate_after: env_parse("VCAM_ACTIVATE_AFTER")
                .unwrap_or(defaults.arbitration.activate_after),
            min_duration: env_parse("VCAM_MIN_DURATION")
                .unwrap_or(defaults.arbitration.min_duration),
            priority_overrides_min_duration: env_parse("VCAM_PRIORITY_OVERRIDES_MIN_DURATION")
                .unwrap_or(defaults.arbitration.priority_overrides_min_duration),
            randomize_ties: env_parse("VCAM_RANDOMIZE_TIES")
                .unwrap_or(defaults.arbitration.randomize_ties),
            rerandomize_while_pending: env_parse("VCAM_RERANDOMIZE_WHILE_PENDING")
                .unwrap_or(defaults.arbitration.rerandomize_while_pending),
            random_seed: env_parse("VCAM_RANDOM_SEED").or(defaults.arbitration.random_seed),
            channel_mask: env_parse("VCAM_CHANNEL_MASK")
                .unwrap_or(defaults.arbitration.channel_mask),
        };

        let default_blend = BlendDefinition {
            curve: std::env::var("VCAM_DEFAULT_BLEND_CURVE")
                .ok()
                .and_then(|s| parse_curve(&s))
                .unwrap_or(defaults.default_blend.curve),
            duration: env_parse("VCAM_DEFAULT_BLEND_SECONDS")
                .unwrap_or(defaults.default_blend.duration),
        };

        Self {
            arbitration,
            default_blend,
            update_method: env_parse("VCAM_UPDATE_METHOD").unwrap_or(defaults.update_method),
            world_up: defaults.world_up,
        }
    }

    /// Validate all parameters.
    pub fn validate(&self) -> CameraResult<()> {
        self.arbitration.validate()?;
        if !self.world_up.is_finite() || self.world_up.length_squared() < 1e-12 {
            return Err(CameraError::invalid_config(format!(
                "world_up must be a finite non-zero vector, got {}",
                self.world_up
            )));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Parse a curve name such as `ease_in_out` or `linear`.
pub fn parse_curve(name: &str) -> Option<BlendCurve> {
    serde_json::from_value(serde_json::Value::String(name.trim().to_lowercase())).ok()
}
