//! Lens model carried by every camera state.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Projection mode of a lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LensMode {
    /// Perspective projection driven by `field_of_view`
    #[default]
    Perspective,
    /// Orthographic projection driven by `orthographic_size`
    Orthographic,
    /// Perspective projection derived from physical sensor parameters
    Physical,
}

/// Physical-camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalLens {
    /// Sensor size in millimetres
    pub sensor_size: DVec2,
    /// Lens shift as a fraction of sensor size
    pub lens_shift: DVec2,
    /// Focus distance in world units
    pub focus_distance: f64,
    /// Aperture f-stop
    pub aperture: f64,
}

impl Default for PhysicalLens {
    fn default() -> Self {
        Self {
            // Super 35
            sensor_size: DVec2::new(36.0, 24.0),
            lens_shift: DVec2::ZERO,
            focus_distance: 10.0,
            aperture: 5.6,
        }
    }
}

/// Field of view, clip planes and physical parameters of a camera.
///
/// Lens settings are blended independently of the pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LensParameters {
    /// Vertical field of view in degrees
    pub field_of_view: f64,
    /// Half-height of the view volume for orthographic projection
    pub orthographic_size: f64,
    /// Near clip plane distance
    pub near_clip_plane: f64,
    /// Far clip plane distance
    pub far_clip_plane: f64,
    /// Camera roll in degrees
    pub dutch: f64,
    /// Projection mode
    pub mode: LensMode,
    /// Physical-camera parameters
    pub physical: PhysicalLens,
}

impl Default for LensParameters {
    fn default() -> Self {
        Self {
            field_of_view: 40.0,
            orthographic_size: 10.0,
            near_clip_plane: 0.1,
            far_clip_plane: 5000.0,
            dutch: 0.0,
            mode: LensMode::Perspective,
            physical: PhysicalLens::default(),
        }
    }
}

impl LensParameters {
    /// Perspective lens with the given vertical field of view.
    pub fn with_field_of_view(field_of_view: f64) -> Self {
        Self {
            field_of_view,
            ..Default::default()
        }
    }

    /// Interpolate between two lenses.
    ///
    /// Every scalar is interpolated linearly. The projection mode is discrete
    /// and switches to `b`'s mode at the halfway point.
    pub fn lerp(a: &LensParameters, b: &LensParameters, t: f64) -> LensParameters {
        let t = t.clamp(0.0, 1.0);
        LensParameters {
            field_of_view: lerp(a.field_of_view, b.field_of_view, t),
            orthographic_size: lerp(a.orthographic_size, b.orthographic_size, t),
            near_clip_plane: lerp(a.near_clip_plane, b.near_clip_plane, t),
            far_clip_plane: lerp(a.far_clip_plane, b.far_clip_plane, t),
            dutch: lerp(a.dutch, b.dutch, t),
            mode: if t >= 0.5 { b.mode } else { a.mode },
            physical: PhysicalLens {
                sensor_size: a.physical.sensor_size.lerp(b.physical.sensor_size, t),
                lens_shift: a.physical.lens_shift.lerp(b.physical.lens_shift, t),
                focus_distance: lerp(a.physical.focus_distance, b.physical.focus_distance, t),
                aperture: lerp(a.physical.aperture, b.physical.aperture, t),
            },
        }
    }
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
