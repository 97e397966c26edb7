//! Reference stage components for the scripted scene.
//!
//! Fixed and dolly mounts, an aim that tracks the look-at target, procedural
//! handheld noise and a floor clamp extension.

use glam::{DMat3, DQuat, DVec3};
use tracing::trace;

use vcam_core::{CameraExtension, CameraState, Stage, StageComponent};

/// Places the camera at a fixed world position.
#[derive(Debug, Clone)]
pub struct FixedBody {
    pub position: DVec3,
}

impl FixedBody {
    pub fn new(position: DVec3) -> Self {
        Self { position }
    }
}

impl StageComponent for FixedBody {
    fn stage(&self) -> Stage {
        Stage::Body
    }

    fn mutate(&mut self, state: &mut CameraState, _delta_time: f64) {
        state.raw_position = self.position;
    }
}

/// Moves the camera toward a target along a straight track at constant speed.
#[derive(Debug, Clone)]
pub struct DollyBody {
    pub from: DVec3,
    pub to: DVec3,
    /// Units per second
    pub speed: f64,
    travelled: f64,
}

impl DollyBody {
    pub fn new(from: DVec3, to: DVec3, speed: f64) -> Self {
        Self {
            from,
            to,
            speed,
            travelled: 0.0,
        }
    }
}

impl StageComponent for DollyBody {
    fn stage(&self) -> Stage {
        Stage::Body
    }

    fn mutate(&mut self, state: &mut CameraState, delta_time: f64) {
        let length = self.from.distance(self.to);
        if length <= f64::EPSILON {
            state.raw_position = self.to;
            return;
        }
        if delta_time > 0.0 {
            self.travelled = (self.travelled + self.speed * delta_time).min(length);
        }
        state.raw_position = self.from.lerp(self.to, self.travelled / length);
    }

    fn on_transition(&mut self, _previous: &CameraState, _world_up: DVec3) {
        self.travelled = 0.0;
    }
}

/// Orients the camera so that -Z faces the state's look-at target.
///
/// Without a target the orientation from the previous stage is kept.
#[derive(Debug, Clone, Default)]
pub struct LookAtAim;

impl StageComponent for LookAtAim {
    fn stage(&self) -> Stage {
        Stage::Aim
    }

    fn mutate(&mut self, state: &mut CameraState, _delta_time: f64) {
        let Some(target) = state.reference_look_at else {
            return;
        };
        if let Some(orientation) = look_rotation(target - state.raw_position, state.reference_up) {
            state.raw_orientation = orientation;
        }
    }
}

/// Rotation whose -Z axis points along `direction`, rolled to `up`.
pub fn look_rotation(direction: DVec3, up: DVec3) -> Option<DQuat> {
    let forward = direction.try_normalize()?;
    let right = match forward.cross(up).try_normalize() {
        Some(right) => right,
        // Looking straight along up, so there is no roll reference
        None => return Some(DQuat::from_rotation_arc(DVec3::NEG_Z, forward)),
    };
    let true_up = right.cross(forward);
    Some(DQuat::from_mat3(&DMat3::from_cols(right, true_up, -forward)).normalize())
}

/// Handheld-style positional wobble.
#[derive(Debug, Clone)]
pub struct SineNoise {
    /// Peak offset per axis
    pub amplitude: DVec3,
    /// Hertz
    pub frequency: f64,
    elapsed: f64,
}

impl SineNoise {
    pub fn new(amplitude: DVec3, frequency: f64) -> Self {
        Self {
            amplitude,
            frequency,
            elapsed: 0.0,
        }
    }
}

impl StageComponent for SineNoise {
    fn stage(&self) -> Stage {
        Stage::Noise
    }

    fn mutate(&mut self, state: &mut CameraState, delta_time: f64) {
        if delta_time > 0.0 {
            self.elapsed += delta_time;
        }
        let phase = self.elapsed * self.frequency * std::f64::consts::TAU;
        let offset = DVec3::new(
            phase.sin() * self.amplitude.x,
            (phase * 1.3).sin() * self.amplitude.y,
            (phase * 0.7).cos() * self.amplitude.z,
        );
        state.add_position_correction(offset);
    }
}

/// Keeps the final camera position above a floor height.
#[derive(Debug, Clone)]
pub struct FloorClamp {
    pub floor: f64,
}

impl CameraExtension for FloorClamp {
    fn post_stage(&mut self, stage: Stage, state: &mut CameraState, _delta_time: f64) {
        if stage != Stage::Finalize {
            return;
        }
        let height = state.final_position().y;
        if height < self.floor {
            trace!(height, floor = self.floor, "Clamping camera above floor");
            state.add_position_correction(DVec3::new(0.0, self.floor - height, 0.0));
        }
    }
}
