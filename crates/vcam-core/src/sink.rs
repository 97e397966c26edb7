//! Destination of the published camera state.

use vcam_models::CameraState;

/// Applies the final state to a physical camera or renderer.
///
/// Called exactly once per processed frame. A state carrying `NO_TRANSFORM`
/// or `NO_LENS` hints must leave the matching channel untouched.
pub trait OutputSink {
    fn apply(&mut self, state: &CameraState);
}

impl<F> OutputSink for F
where
    F: FnMut(&CameraState),
{
    fn apply(&mut self, state: &CameraState) {
        self(state)
    }
}

/// Sink discarding every state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn apply(&mut self, _state: &CameraState) {}
}
