//! Interpolation between two camera states.

use glam::{DQuat, DVec3};

use vcam_models::{BlendHints, CameraState, CustomBlendable, LensParameters};

/// Hints that suppress one applied channel.
const CHANNEL_HINTS: BlendHints = BlendHints::NO_POSITION
    .union(BlendHints::NO_ORIENTATION)
    .union(BlendHints::NO_LENS);

/// Below this distance from the pivot spherical blending degrades to linear.
const MIN_PIVOT_DISTANCE: f64 = 1e-6;

/// Interpolate from `a` to `b` by weight `t` in `[0, 1]`.
///
/// `t <= 0` returns `a` and `t >= 1` returns `b` unchanged. A `HARD_CUT` hint
/// on either side or a NaN weight jumps straight to `b`.
///
/// A channel suppressed on one side only takes the other side's value in full.
pub fn lerp_states(a: &CameraState, b: &CameraState, t: f64) -> CameraState {
    let hard_cut = a.blend_hints.contains(BlendHints::HARD_CUT)
        || b.blend_hints.contains(BlendHints::HARD_CUT);
    if hard_cut || t.is_nan() || t >= 1.0 {
        return b.clone();
    }
    if t <= 0.0 {
        return a.clone();
    }

    let hints = a.blend_hints | b.blend_hints;
    let ignore_look_at = hints.contains(BlendHints::IGNORE_LOOK_AT);
    let w_position = channel_weight(a, b, BlendHints::NO_POSITION, t);
    let w_orientation = channel_weight(a, b, BlendHints::NO_ORIENTATION, t);
    let w_lens = channel_weight(a, b, BlendHints::NO_LENS, t);

    let look_at = match (a.reference_look_at, b.reference_look_at) {
        _ if ignore_look_at => b.reference_look_at,
        (Some(la), Some(lb)) => Some(la.lerp(lb, t)),
        (la, lb) => {
            if t < 0.5 {
                la
            } else {
                lb
            }
        }
    };

    let spherical = hints.contains(BlendHints::SPHERICAL_POSITION) && !ignore_look_at;
    let raw_position = match (a.reference_look_at, b.reference_look_at) {
        (Some(la), Some(lb)) if spherical => {
            spherical_position(a.raw_position, la, b.raw_position, lb, w_position)
        }
        _ => a.raw_position.lerp(b.raw_position, w_position),
    };

    let reference_up = a
        .reference_up
        .lerp(b.reference_up, t)
        .try_normalize()
        .unwrap_or(b.reference_up);

    let mut state = CameraState {
        raw_position,
        raw_orientation: a.raw_orientation.slerp(b.raw_orientation, w_orientation),
        position_correction: a.position_correction.lerp(b.position_correction, w_position),
        orientation_correction: a
            .orientation_correction
            .slerp(b.orientation_correction, w_orientation),
        lens: LensParameters::lerp(&a.lens, &b.lens, w_lens),
        reference_up,
        reference_look_at: look_at,
        blend_hints: (a.blend_hints & b.blend_hints & CHANNEL_HINTS)
            | (hints & BlendHints::IGNORE_LOOK_AT),
        shot_quality: lerp(a.shot_quality, b.shot_quality, t),
        custom_blendables: Vec::with_capacity(a.custom_blendables.len() + b.custom_blendables.len()),
    };

    for blendable in &a.custom_blendables {
        state.add_custom_blendable(CustomBlendable::new(
            blendable.id.clone(),
            blendable.weight * (1.0 - t),
        ));
    }
    for blendable in &b.custom_blendables {
        state.add_custom_blendable(CustomBlendable::new(
            blendable.id.clone(),
            blendable.weight * t,
        ));
    }

    state
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn channel_weight(a: &CameraState, b: &CameraState, hint: BlendHints, t: f64) -> f64 {
    match (a.blend_hints.contains(hint), b.blend_hints.contains(hint)) {
        (true, false) => 1.0,
        (false, true) => 0.0,
        _ => t,
    }
}

/// Swing the camera around the interpolated pivot, blending distance linearly.
fn spherical_position(pa: DVec3, la: DVec3, pb: DVec3, lb: DVec3, t: f64) -> DVec3 {
    let pivot = la.lerp(lb, t);
    let (da, db) = (pa - la, pb - lb);
    let (ra, rb) = (da.length(), db.length());
    if ra < MIN_PIVOT_DISTANCE || rb < MIN_PIVOT_DISTANCE {
        return pa.lerp(pb, t);
    }
    let arc = DQuat::from_rotation_arc(da / ra, db / rb);
    let direction = DQuat::IDENTITY.slerp(arc, t) * (da / ra);
    pivot + direction * lerp(ra, rb, t)
}
