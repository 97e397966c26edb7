//! Time-based blending between camera states.
//!
//! A blend interpolates an outgoing endpoint toward an incoming candidate
//! over a duration shaped by a curve. Interrupting a blend snapshots its
//! current output and blends from that snapshot, so the published state never
//! jumps.
//!
//! # Module Structure
//!
//! - `interpolate`: per-channel interpolation of two states
//! - `mixer`: N-way weighted mixing
//! - `table`: per-transition blend overrides

mod interpolate;
mod mixer;
mod table;

pub use interpolate::lerp_states;
pub use mixer::{MixOutput, WeightedMixer, DEFAULT_WEIGHT_EPSILON};
pub use table::{BlendLookup, BlendTable, BlendTableEntry, ANY_CAMERA};

use tracing::{debug, trace};

use crate::candidate::StateLookup;
use vcam_models::{BlendCurve, BlendDefinition, BlendId, CameraState, CandidateId};

/// One side of a blend.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendEndpoint {
    /// A candidate whose live state is read every frame
    Candidate(CandidateId),
    /// A frozen state, e.g. the output of an interrupted blend
    Snapshot(Box<CameraState>),
}

impl BlendEndpoint {
    /// Current state of this endpoint. A candidate that no longer exists
    /// resolves to the neutral state.
    pub fn resolve<L: StateLookup + ?Sized>(&self, lookup: &L) -> CameraState {
        match self {
            BlendEndpoint::Candidate(id) => match lookup.state_of(id) {
                Some(state) => state.clone(),
                None => {
                    trace!(candidate = %id, "Blend endpoint no longer exists");
                    CameraState::neutral()
                }
            },
            BlendEndpoint::Snapshot(state) => (**state).clone(),
        }
    }

    pub fn candidate(&self) -> Option<&CandidateId> {
        match self {
            BlendEndpoint::Candidate(id) => Some(id),
            BlendEndpoint::Snapshot(_) => None,
        }
    }
}

/// Result of asking for a new blend.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendStart {
    /// The definition resolves to an instantaneous switch
    Cut,
    /// A running blend at elapsed time zero
    Blend(BlendState),
}

/// Result of advancing a blend.
#[derive(Debug, Clone, PartialEq)]
pub enum Advanced {
    Running(BlendState),
    Finished(BlendState),
}

/// An in-progress blend.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendState {
    id: BlendId,
    outgoing: BlendEndpoint,
    incoming: CandidateId,
    curve: BlendCurve,
    duration: f64,
    elapsed: f64,
}

impl BlendState {
    /// Start a blend, or report a cut when nothing needs interpolating.
    ///
    /// No outgoing endpoint or a cut definition yields `BlendStart::Cut`.
    pub fn create(
        outgoing: Option<BlendEndpoint>,
        incoming: CandidateId,
        definition: &BlendDefinition,
    ) -> BlendStart {
        match outgoing {
            Some(outgoing) if !definition.is_cut() => BlendStart::Blend(Self {
                id: BlendId::new(),
                outgoing,
                incoming,
                curve: definition.curve.clone(),
                duration: definition.duration,
                elapsed: 0.0,
            }),
            _ => BlendStart::Cut,
        }
    }

    /// Advance by `delta_time`. A negative delta completes the blend.
    pub fn advance(mut self, delta_time: f64) -> Advanced {
        if delta_time < 0.0 || delta_time.is_nan() {
            self.elapsed = self.duration;
        } else {
            self.elapsed += delta_time;
        }
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            Advanced::Finished(self)
        } else {
            Advanced::Running(self)
        }
    }

    /// Normalized time in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Blend weight of the incoming side.
    pub fn weight(&self) -> f64 {
        self.curve.evaluate(self.progress())
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Current interpolated output. Missing endpoints resolve to neutral.
    pub fn evaluate<L: StateLookup + ?Sized>(&self, lookup: &L) -> CameraState {
        let from = self.outgoing.resolve(lookup);
        let to = match lookup.state_of(&self.incoming) {
            Some(state) => state.clone(),
            None => {
                trace!(candidate = %self.incoming, "Incoming candidate no longer exists");
                CameraState::neutral()
            }
        };
        lerp_states(&from, &to, self.weight())
    }

    /// Replace this blend with one starting from its current output.
    pub fn interrupt<L: StateLookup + ?Sized>(
        &self,
        lookup: &L,
        incoming: CandidateId,
        definition: &BlendDefinition,
    ) -> BlendStart {
        let snapshot = self.evaluate(lookup);
        debug!(
            blend = %self.id,
            progress = self.progress(),
            incoming = %incoming,
            "Interrupting blend from its current output"
        );
        Self::create(
            Some(BlendEndpoint::Snapshot(Box::new(snapshot))),
            incoming,
            definition,
        )
    }

    pub fn id(&self) -> &BlendId {
        &self.id
    }

    pub fn outgoing(&self) -> &BlendEndpoint {
        &self.outgoing
    }

    pub fn incoming(&self) -> &CandidateId {
        &self.incoming
    }

    pub fn curve(&self) -> &BlendCurve {
        &self.curve
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

/// What a transition turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Switched instantly
    Cut,
    /// Started a blend, replacing an active one if `interrupted`
    Blend { id: BlendId, interrupted: bool },
}

/// Owns the single active blend of an orchestrator.
#[derive(Debug, Clone, Default)]
pub struct BlendEngine {
    active: Option<BlendState>,
}

impl BlendEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transition to `incoming`.
    ///
    /// An active blend is interrupted and its current output becomes the
    /// outgoing side. Otherwise `outgoing` names the outgoing candidate.
    pub fn transition<L: StateLookup + ?Sized>(
        &mut self,
        lookup: &L,
        outgoing: Option<&CandidateId>,
        incoming: &CandidateId,
        definition: &BlendDefinition,
    ) -> Transition {
        let interrupted = self.active.is_some();
        let start = match self.active.take() {
            Some(active) => active.interrupt(lookup, incoming.clone(), definition),
            None => BlendState::create(
                outgoing.cloned().map(BlendEndpoint::Candidate),
                incoming.clone(),
                definition,
            ),
        };

        match start {
            BlendStart::Cut => Transition::Cut,
            BlendStart::Blend(blend) => {
                let id = blend.id().clone();
                self.active = Some(blend);
                Transition::Blend { id, interrupted }
            }
        }
    }

    /// Advance the active blend, returning it if it finished this call.
    pub fn advance(&mut self, delta_time: f64) -> Option<BlendState> {
        match self.active.take()?.advance(delta_time) {
            Advanced::Running(blend) => {
                self.active = Some(blend);
                None
            }
            Advanced::Finished(blend) => Some(blend),
        }
    }

    /// Output of the active blend, if any.
    pub fn evaluate<L: StateLookup + ?Sized>(&self, lookup: &L) -> Option<CameraState> {
        self.active.as_ref().map(|blend| blend.evaluate(lookup))
    }

    pub fn clear(&mut self) -> Option<BlendState> {
        self.active.take()
    }

    pub fn is_blending(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&BlendState> {
        self.active.as_ref()
    }
}
