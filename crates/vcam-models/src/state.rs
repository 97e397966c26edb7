//! Fully resolved per-frame camera state.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::hints::BlendHints;
use crate::lens::LensParameters;

/// Opaque payload carried through blends and weighted by blend progress.
///
/// The core never interprets the payload; it only tracks the id and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomBlendable {
    /// Identity of the external payload (e.g. an overlay effect)
    pub id: String,
    /// Contribution weight
    pub weight: f64,
}

impl CustomBlendable {
    /// Create a new blendable entry.
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

/// One candidate's fully resolved output for the current frame.
///
/// A published `CameraState` is never mutated; corrections accumulate only
/// while a composer pass is building it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    /// Position computed by the candidate's own algorithm
    pub raw_position: DVec3,
    /// Orientation computed by the candidate's own algorithm
    pub raw_orientation: DQuat,
    /// Accumulated position correction (collision, noise, ...)
    pub position_correction: DVec3,
    /// Accumulated orientation correction, applied after the raw orientation
    pub orientation_correction: DQuat,
    /// Lens settings
    pub lens: LensParameters,
    /// World up used by correction stages
    pub reference_up: DVec3,
    /// Aim target, if any
    pub reference_look_at: Option<DVec3>,
    /// Blend behavior overrides for this state
    pub blend_hints: BlendHints,
    /// Heuristic shot score used by quality arbitration
    pub shot_quality: f64,
    /// Opaque weighted payloads
    pub custom_blendables: Vec<CustomBlendable>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            raw_position: DVec3::ZERO,
            raw_orientation: DQuat::IDENTITY,
            position_correction: DVec3::ZERO,
            orientation_correction: DQuat::IDENTITY,
            lens: LensParameters::default(),
            reference_up: DVec3::Y,
            reference_look_at: None,
            blend_hints: BlendHints::empty(),
            shot_quality: 1.0,
            custom_blendables: Vec::new(),
        }
    }
}

impl CameraState {
    /// Create a state at the given pose with default lens.
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            raw_position: position,
            raw_orientation: orientation,
            ..Default::default()
        }
    }

    /// Placeholder state published when no candidate is live.
    ///
    /// Carries `NO_TRANSFORM | NO_LENS` so sinks leave the physical camera alone.
    pub fn neutral() -> Self {
        Self {
            blend_hints: BlendHints::NEUTRAL,
            ..Default::default()
        }
    }

    /// Whether this is a placeholder that must not move the physical camera.
    pub fn is_neutral(&self) -> bool {
        self.blend_hints.contains(BlendHints::NEUTRAL)
    }

    /// Position after corrections.
    #[inline]
    pub fn final_position(&self) -> DVec3 {
        self.raw_position + self.position_correction
    }

    /// Orientation after corrections.
    #[inline]
    pub fn final_orientation(&self) -> DQuat {
        (self.raw_orientation * self.orientation_correction).normalize()
    }

    /// Whether an aim target is present.
    #[inline]
    pub fn has_look_at(&self) -> bool {
        self.reference_look_at.is_some()
    }

    /// Accumulate a position correction.
    pub fn add_position_correction(&mut self, delta: DVec3) {
        self.position_correction += delta;
    }

    /// Accumulate an orientation correction.
    pub fn add_orientation_correction(&mut self, delta: DQuat) {
        self.orientation_correction = (self.orientation_correction * delta).normalize();
    }

    /// Add a weighted payload, merging with an existing entry of the same id.
    pub fn add_custom_blendable(&mut self, blendable: CustomBlendable) {
        match self
            .custom_blendables
            .iter_mut()
            .find(|b| b.id == blendable.id)
        {
            Some(existing) => existing.weight += blendable.weight,
            None => self.custom_blendables.push(blendable),
        }
    }

    /// Builder-style helper setting the aim target.
    pub fn with_look_at(mut self, target: DVec3) -> Self {
        self.reference_look_at = Some(target);
        self
    }

    /// Builder-style helper setting blend hints.
    pub fn with_hints(mut self, hints: BlendHints) -> Self {
        self.blend_hints = hints;
        self
    }

    /// Builder-style helper setting the lens.
    pub fn with_lens(mut self, lens: LensParameters) -> Self {
        self.lens = lens;
        self
    }

    /// Builder-style helper setting the shot quality.
    pub fn with_shot_quality(mut self, shot_quality: f64) -> Self {
        self.shot_quality = shot_quality;
        self
    }
}
