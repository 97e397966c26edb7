//! Blend curves and blend definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One key of a custom blend curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CurveKey {
    /// Normalized time in `[0, 1]`
    pub time: f64,
    /// Blend weight at `time`
    pub value: f64,
}

impl CurveKey {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Shape of a blend over normalized time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendCurve {
    /// Zero-length switch
    Cut,
    /// S-shaped: slow start and slow end
    #[default]
    EaseInOut,
    /// Slow start, linear arrival
    EaseIn,
    /// Linear start, slow arrival
    EaseOut,
    /// Slow start, accelerating into the arrival
    HardIn,
    /// Fast start, decelerating arrival
    HardOut,
    /// Constant rate
    Linear,
    /// Piecewise-linear through the given keys
    Custom(Vec<CurveKey>),
}

impl BlendCurve {
    /// Custom curve through `keys`, sorted by time with non-finite keys dropped.
    ///
    /// Curves built here evaluate without allocating.
    pub fn custom(keys: Vec<CurveKey>) -> Self {
        BlendCurve::Custom(normalize_keys(keys))
    }

    /// Map normalized time to blend weight. Input is clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f64) -> f64 {
        if t.is_nan() {
            return 1.0;
        }
        let t = t.clamp(0.0, 1.0);
        match self {
            BlendCurve::Cut => 1.0,
            BlendCurve::Linear => t,
            BlendCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
            BlendCurve::EaseIn => ease_in(t),
            BlendCurve::EaseOut => 1.0 - ease_in(1.0 - t),
            BlendCurve::HardIn => t * t,
            BlendCurve::HardOut => 1.0 - (1.0 - t) * (1.0 - t),
            BlendCurve::Custom(keys) => evaluate_keys(keys, t),
        }
    }

    /// Human-readable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlendCurve::Cut => "cut",
            BlendCurve::EaseInOut => "ease_in_out",
            BlendCurve::EaseIn => "ease_in",
            BlendCurve::EaseOut => "ease_out",
            BlendCurve::HardIn => "hard_in",
            BlendCurve::HardOut => "hard_out",
            BlendCurve::Linear => "linear",
            BlendCurve::Custom(_) => "custom",
        }
    }
}

// Zero slope at the start, unit slope at the end.
#[inline]
fn ease_in(t: f64) -> f64 {
    t * t * (2.0 - t)
}

fn evaluate_keys(keys: &[CurveKey], t: f64) -> f64 {
    if is_normalized(keys) {
        return interpolate_sorted(keys, t);
    }
    interpolate_sorted(&normalize_keys(keys.to_vec()), t)
}

fn is_finite_key(key: &CurveKey) -> bool {
    key.time.is_finite() && key.value.is_finite()
}

fn is_normalized(keys: &[CurveKey]) -> bool {
    keys.iter().all(is_finite_key) && keys.windows(2).all(|pair| pair[0].time <= pair[1].time)
}

fn normalize_keys(mut keys: Vec<CurveKey>) -> Vec<CurveKey> {
    keys.retain(is_finite_key);
    keys.sort_by(|a, b| a.time.total_cmp(&b.time));
    keys
}

// Keys must be finite and sorted by time.
fn interpolate_sorted(keys: &[CurveKey], t: f64) -> f64 {
    let Some(first) = keys.first() else {
        return t;
    };
    if t <= first.time {
        return first.value;
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.time {
            let span = b.time - a.time;
            if span <= f64::EPSILON {
                return b.value;
            }
            return a.value + (b.value - a.value) * (t - a.time) / span;
        }
    }
    keys[keys.len() - 1].value
}

/// Curve and duration of a transition between two candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlendDefinition {
    /// Blend curve
    pub curve: BlendCurve,
    /// Duration in seconds
    pub duration: f64,
}

impl Default for BlendDefinition {
    fn default() -> Self {
        Self {
            curve: BlendCurve::EaseInOut,
            duration: 2.0,
        }
    }
}

impl BlendDefinition {
    /// Create a new blend definition.
    pub fn new(curve: BlendCurve, duration: f64) -> Self {
        Self { curve, duration }
    }

    /// An instantaneous switch.
    pub fn cut() -> Self {
        Self {
            curve: BlendCurve::Cut,
            duration: 0.0,
        }
    }

    /// Whether this definition produces no blend at all.
    ///
    /// Non-positive and non-finite durations are cuts, not faults.
    pub fn is_cut(&self) -> bool {
        matches!(self.curve, BlendCurve::Cut) || !self.duration.is_finite() || self.duration <= 0.0
    }
}
