//! Stage-ordered composition of a candidate's camera state.
//!
//! A composer pass runs the `Body`, `Aim`, `Noise` and `Finalize` stages in
//! that order. Extensions observe the state before the first stage and after
//! every stage, which is where corrections (collision, framing nudges) are
//! accumulated. The state returned from `compose` is the published value.

mod composed;

pub use composed::ComposedCandidate;

use glam::{DQuat, DVec3};
use tracing::trace;

use vcam_models::CameraState;

/// Pipeline stage a component occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Positions the camera
    Body,
    /// Orients the camera
    Aim,
    /// Adds procedural motion
    Noise,
    /// Last adjustments before publication
    Finalize,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Body, Stage::Aim, Stage::Noise, Stage::Finalize];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Body => "body",
            Stage::Aim => "aim",
            Stage::Noise => "noise",
            Stage::Finalize => "finalize",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// A mutation applied during one stage of the pass.
pub trait StageComponent {
    /// Stage this component runs in.
    fn stage(&self) -> Stage;

    /// Invalid components are skipped, e.g. while their target is missing.
    fn is_valid(&self) -> bool {
        true
    }

    /// Mutate the in-flight state.
    fn mutate(&mut self, state: &mut CameraState, delta_time: f64);

    /// The owning candidate became live after `previous`.
    fn on_transition(&mut self, _previous: &CameraState, _world_up: DVec3) {}
}

/// Hook invoked around every stage of the pass.
pub trait CameraExtension {
    /// Runs once before the first stage.
    fn pre_pipeline(&mut self, _state: &mut CameraState, _delta_time: f64) {}

    /// Runs after `stage` completed.
    fn post_stage(&mut self, stage: Stage, state: &mut CameraState, delta_time: f64);
}

/// Runs stage components and extensions over a raw state.
#[derive(Default)]
pub struct StageComposer {
    components: [Option<Box<dyn StageComponent>>; 4],
    extensions: Vec<Box<dyn CameraExtension>>,
}

impl StageComposer {
    /// Create an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a component in its stage slot, returning the one it replaces.
    pub fn set_component(
        &mut self,
        component: Box<dyn StageComponent>,
    ) -> Option<Box<dyn StageComponent>> {
        let slot = component.stage().index();
        self.components[slot].replace(component)
    }

    /// Remove the component occupying `stage`.
    pub fn remove_component(&mut self, stage: Stage) -> Option<Box<dyn StageComponent>> {
        self.components[stage.index()].take()
    }

    /// Component occupying `stage`, if any.
    pub fn component(&self, stage: Stage) -> Option<&dyn StageComponent> {
        self.components[stage.index()].as_deref()
    }

    /// Append an extension. Extensions run in registration order.
    pub fn add_extension(&mut self, extension: Box<dyn CameraExtension>) {
        self.extensions.push(extension);
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Run one pass and return the published state.
    ///
    /// Corrections carried in by `initial` are discarded: they only
    /// accumulate during the pass.
    pub fn compose(&mut self, initial: CameraState, delta_time: f64) -> CameraState {
        let mut state = initial;
        state.position_correction = DVec3::ZERO;
        state.orientation_correction = DQuat::IDENTITY;

        for extension in self.extensions.iter_mut() {
            extension.pre_pipeline(&mut state, delta_time);
        }

        for stage in Stage::ALL {
            if let Some(component) = self.components[stage.index()].as_mut() {
                if component.is_valid() {
                    component.mutate(&mut state, delta_time);
                } else {
                    trace!(stage = stage.as_str(), "Skipping invalid stage component");
                }
            }
            for extension in self.extensions.iter_mut() {
                extension.post_stage(stage, &mut state, delta_time);
            }
        }

        state
    }

    /// Forward a live transition to every component.
    pub fn notify_transition(&mut self, previous: &CameraState, world_up: DVec3) {
        for component in self.components.iter_mut().flatten() {
            component.on_transition(previous, world_up);
        }
    }
}
