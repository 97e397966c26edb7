//! Candidate contract consumed by the core.
//!
//! The core never owns candidates. Callers hand in a slice every frame and
//! the core keeps only ids between frames.

use glam::DVec3;
use std::collections::HashMap;

use vcam_models::{CameraState, CandidateId};

/// Channel mask matching every channel.
pub const ALL_CHANNELS: u32 = u32::MAX;

/// The camera that was live before a transition.
#[derive(Debug, Clone, Copy)]
pub struct PreviousLive<'a> {
    /// Identity of the outgoing candidate
    pub id: &'a CandidateId,
    /// The state that was on screen when the transition started
    pub state: &'a CameraState,
}

/// An entity that can be selected to drive the physical camera.
pub trait Candidate {
    /// Stable identity.
    fn id(&self) -> &CandidateId;

    /// Arbitration priority. Higher wins.
    fn priority(&self) -> i32;

    /// Whether the candidate is enabled and may be selected.
    fn is_activatable(&self) -> bool;

    /// This frame's resolved state, recomputed by the caller before the update.
    fn state(&self) -> &CameraState;

    /// Channels this candidate outputs to.
    fn channel(&self) -> u32 {
        ALL_CHANNELS
    }

    /// Recompute `state()` for the coming frame. Owners call this before
    /// handing the candidate list to the orchestrator; the core never does.
    fn prepare_frame(&mut self, _delta_time: f64) {}

    /// Called exactly once when the candidate becomes live.
    fn on_became_live(
        &mut self,
        _previous: Option<PreviousLive<'_>>,
        _world_up: DVec3,
        _delta_time: f64,
    ) {
    }
}

/// Resolves a candidate id to its current state.
///
/// `None` means the candidate no longer exists.
pub trait StateLookup {
    fn state_of(&self, id: &CandidateId) -> Option<&CameraState>;
}

impl StateLookup for [Box<dyn Candidate>] {
    fn state_of(&self, id: &CandidateId) -> Option<&CameraState> {
        self.iter().find(|c| c.id() == id).map(|c| c.state())
    }
}

impl StateLookup for Vec<Box<dyn Candidate>> {
    fn state_of(&self, id: &CandidateId) -> Option<&CameraState> {
        self.as_slice().state_of(id)
    }
}

impl StateLookup for HashMap<CandidateId, CameraState> {
    fn state_of(&self, id: &CandidateId) -> Option<&CameraState> {
        self.get(id)
    }
}

/// A candidate whose state is set directly by its owner.
#[derive(Debug, Clone)]
pub struct StaticCandidate {
    pub id: CandidateId,
    pub priority: i32,
    pub enabled: bool,
    pub channel: u32,
    pub state: CameraState,
    /// Number of times this candidate became live
    pub activations: u32,
}

impl StaticCandidate {
    /// Create an enabled candidate on all channels.
    pub fn new(id: impl Into<CandidateId>, priority: i32, state: CameraState) -> Self {
        Self {
            id: id.into(),
            priority,
            enabled: true,
            channel: ALL_CHANNELS,
            state,
            activations: 0,
        }
    }

    /// Box the candidate for use in a candidate list.
    pub fn boxed(self) -> Box<dyn Candidate> {
        Box::new(self)
    }
}

impl Candidate for StaticCandidate {
    fn id(&self) -> &CandidateId {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_activatable(&self) -> bool {
        self.enabled
    }

    fn state(&self) -> &CameraState {
        &self.state
    }

    fn channel(&self) -> u32 {
        self.channel
    }

    fn on_became_live(
        &mut self,
        _previous: Option<PreviousLive<'_>>,
        _world_up: DVec3,
        _delta_time: f64,
    ) {
        self.activations += 1;
    }
}
