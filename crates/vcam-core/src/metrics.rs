//! Metrics emitted by the camera core.
//!
//! Nothing is recorded unless the host installs a `metrics` recorder.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    // Frame loop
    pub const FRAMES_PROCESSED_TOTAL: &str = "vcam_frames_processed_total";
    pub const FRAMES_SKIPPED_TOTAL: &str = "vcam_frames_skipped_total";

    // Arbitration
    pub const ELIGIBLE_CANDIDATES: &str = "vcam_eligible_candidates";
    pub const LIVE_CHANGES_TOTAL: &str = "vcam_live_changes_total";

    // Blending
    pub const EVENTS_TOTAL: &str = "vcam_events_total";
    pub const BLEND_INTERRUPTS_TOTAL: &str = "vcam_blend_interrupts_total";
    pub const BLEND_DURATION_SECONDS: &str = "vcam_blend_duration_seconds";
    pub const BLEND_PROGRESS: &str = "vcam_blend_progress";
}

/// Record a processed frame.
pub fn record_frame_processed() {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
}

/// Record a frame that was skipped and why.
pub fn record_frame_skipped(reason: &'static str) {
    let labels = [("reason", reason)];
    counter!(names::FRAMES_SKIPPED_TOTAL, &labels).increment(1);
}

/// Update the eligible candidate gauge.
pub fn record_eligible_candidates(count: usize) {
    gauge!(names::ELIGIBLE_CANDIDATES).set(count as f64);
}

/// Record a change of live candidate.
pub fn record_live_change(solo: bool) {
    let labels = [("solo", if solo { "true" } else { "false" })];
    counter!(names::LIVE_CHANGES_TOTAL, &labels).increment(1);
}

/// Record an emitted event.
pub fn record_event(event: &'static str) {
    let labels = [("event", event)];
    counter!(names::EVENTS_TOTAL, &labels).increment(1);
}

/// Record a started blend.
pub fn record_blend_started(curve: &'static str, duration_secs: f64, interrupted: bool) {
    let labels = [("curve", curve)];
    histogram!(names::BLEND_DURATION_SECONDS, &labels).record(duration_secs);
    if interrupted {
        counter!(names::BLEND_INTERRUPTS_TOTAL).increment(1);
    }
}

/// Update the active blend progress gauge. Zero when not blending.
pub fn set_blend_progress(progress: f64) {
    gauge!(names::BLEND_PROGRESS).set(progress);
}
