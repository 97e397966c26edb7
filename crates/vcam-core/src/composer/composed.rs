//! Candidate backed by a stage composer.

use glam::DVec3;
use tracing::debug;

use super::{CameraExtension, StageComponent, StageComposer};
use crate::candidate::{Candidate, PreviousLive, ALL_CHANNELS};
use vcam_models::{BlendHints, CameraState, CandidateId};

/// A candidate that recomputes its state through a `StageComposer`.
///
/// `seed` is the raw tracking state handed to each pass (lens, up vector,
/// look-at target, hints). `refresh` must be called once per frame before
/// the orchestrator reads the candidate.
pub struct ComposedCandidate {
    id: CandidateId,
    priority: i32,
    enabled: bool,
    channel: u32,
    composer: StageComposer,
    seed: CameraState,
    state: CameraState,
}

impl ComposedCandidate {
    pub fn new(id: impl Into<CandidateId>, priority: i32, seed: CameraState) -> Self {
        Self {
            id: id.into(),
            priority,
            enabled: true,
            channel: ALL_CHANNELS,
            composer: StageComposer::new(),
            state: seed.clone(),
            seed,
        }
    }

    /// Builder-style helper installing a stage component.
    pub fn with_component(mut self, component: Box<dyn StageComponent>) -> Self {
        self.composer.set_component(component);
        self
    }

    /// Builder-style helper appending an extension.
    pub fn with_extension(mut self, extension: Box<dyn CameraExtension>) -> Self {
        self.composer.add_extension(extension);
        self
    }

    pub fn with_channel(mut self, channel: u32) -> Self {
        self.channel = channel;
        self
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn seed(&self) -> &CameraState {
        &self.seed
    }

    pub fn seed_mut(&mut self) -> &mut CameraState {
        &mut self.seed
    }

    pub fn composer_mut(&mut self) -> &mut StageComposer {
        &mut self.composer
    }

    /// Recompute this frame's state.
    pub fn refresh(&mut self, delta_time: f64) -> &CameraState {
        self.state = self.composer.compose(self.seed.clone(), delta_time);
        &self.state
    }

    /// Box the candidate for use in a candidate list.
    pub fn boxed(self) -> Box<dyn Candidate> {
        Box::new(self)
    }
}

impl Candidate for ComposedCandidate {
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

    fn prepare_frame(&mut self, delta_time: f64) {
        self.refresh(delta_time);
    }

    fn on_became_live(
        &mut self,
        previous: Option<PreviousLive<'_>>,
        world_up: DVec3,
        _delta_time: f64,
    ) {
        self.seed.reference_up = world_up;
        if let Some(previous) = previous {
            if self.seed.blend_hints.contains(BlendHints::INHERIT_POSITION) {
                debug!(
                    candidate = %self.id,
                    previous = %previous.id,
                    "Inheriting pose from outgoing camera"
                );
                self.seed.raw_position = previous.state.final_position();
                self.seed.raw_orientation = previous.state.final_orientation();
            }
            self.composer.notify_transition(previous.state, world_up);
        }
        // Re-run the pass without advancing time so the inherited pose is visible
        // on the transition frame.
        self.refresh(0.0);
    }
}
