//! Per-frame camera orchestration.
//!
//! Ties arbitration and blending into one update per frame:
//! 1. Pick the live candidate (solo override, else arbitration)
//! 2. On a change, notify the incoming candidate and start a cut or blend
//! 3. Advance the active blend
//! 4. Publish the resolved state to the output sink

use tracing::{debug, info, trace};

use crate::arbitration::{default_scorer, ArbitrationEngine, CandidateScorer};
use crate::blend::{BlendEngine, BlendLookup, BlendState, Transition};
use crate::candidate::{Candidate, PreviousLive, StateLookup};
use crate::config::{OrchestratorConfig, UpdatePhase};
use crate::error::CameraResult;
use crate::events::{CameraEventListener, EventHub};
use crate::metrics;
use crate::sink::OutputSink;
use vcam_models::{BlendDefinition, CameraEvent, CameraState, CandidateId};

/// One invocation of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Logical frame number. Repeated numbers are ignored.
    pub frame: u64,
    /// Clock time in seconds
    pub now: f64,
    /// Seconds since the previous frame. Negative forces an immediate resolve.
    pub delta_time: f64,
    /// Scheduling pass issuing this update
    pub phase: UpdatePhase,
}

impl FrameTick {
    /// A late-phase tick.
    pub fn new(frame: u64, now: f64, delta_time: f64) -> Self {
        Self {
            frame,
            now,
            delta_time,
            phase: UpdatePhase::Late,
        }
    }

    /// A tick that bypasses hysteresis and completes any blend.
    pub fn forced(frame: u64, now: f64) -> Self {
        Self::new(frame, now, -1.0)
    }

    pub fn with_phase(mut self, phase: UpdatePhase) -> Self {
        self.phase = phase;
        self
    }

    #[inline]
    pub fn is_forced(&self) -> bool {
        self.delta_time < 0.0
    }
}

/// Where the orchestrator stands after the last processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorStatus {
    /// Nothing live. The neutral state is published
    #[default]
    NoLiveCamera,
    /// The live candidate changed this frame without a blend
    Cut,
    /// A blend is in progress
    Blending,
    /// The live candidate is published directly
    Settled,
}

impl OrchestratorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorStatus::NoLiveCamera => "no_live_camera",
            OrchestratorStatus::Cut => "cut",
            OrchestratorStatus::Blending => "blending",
            OrchestratorStatus::Settled => "settled",
        }
    }
}

/// Drives one physical camera from a set of candidates.
///
/// The orchestrator owns its arbitration timers and blend exclusively.
/// Candidates are borrowed for the duration of `update` only.
pub struct Orchestrator<S: CandidateScorer = Box<dyn CandidateScorer>> {
    config: OrchestratorConfig,
    arbitration: ArbitrationEngine<S>,
    blender: BlendEngine,
    blend_lookup: Option<Box<dyn BlendLookup>>,
    events: EventHub,
    live: Option<CandidateId>,
    solo: Option<CandidateId>,
    last_frame: Option<u64>,
    output: CameraState,
    status: OrchestratorStatus,
}

impl Orchestrator<Box<dyn CandidateScorer>> {
    /// Create an orchestrator using the scorer named by the config.
    pub fn from_config(config: OrchestratorConfig) -> CameraResult<Self> {
        let scorer = default_scorer(&config.arbitration);
        Self::new(config, scorer)
    }
}

impl<S: CandidateScorer> Orchestrator<S> {
    /// Create an orchestrator with an explicit scorer.
    pub fn new(config: OrchestratorConfig, scorer: S) -> CameraResult<Self> {
        config.validate()?;
        info!(
            scorer = scorer.name(),
            update_method = ?config.update_method,
            default_blend = config.default_blend.curve.as_str(),
            default_blend_secs = config.default_blend.duration,
            "Camera orchestrator created"
        );
        Ok(Self {
            arbitration: ArbitrationEngine::new(config.arbitration.clone(), scorer),
            config,
            blender: BlendEngine::new(),
            blend_lookup: None,
            events: EventHub::new(),
            live: None,
            solo: None,
            last_frame: None,
            output: CameraState::neutral(),
            status: OrchestratorStatus::NoLiveCamera,
        })
    }

    /// Install the per-transition blend lookup. Unmatched transitions use
    /// the configured default blend.
    pub fn set_blend_lookup(&mut self, lookup: Box<dyn BlendLookup>) {
        self.blend_lookup = Some(lookup);
    }

    pub fn clear_blend_lookup(&mut self) {
        self.blend_lookup = None;
    }

    pub fn subscribe(&mut self, listener: Box<dyn CameraEventListener>) {
        self.events.subscribe(listener);
    }

    /// Force a candidate live regardless of arbitration, switching with a cut.
    ///
    /// The override is ignored while the candidate is missing or not
    /// activatable. `None` hands control back to arbitration.
    pub fn set_solo(&mut self, candidate: Option<CandidateId>) {
        if self.solo != candidate {
            debug!(solo = ?candidate, "Solo override changed");
        }
        self.solo = candidate;
    }

    pub fn solo(&self) -> Option<&CandidateId> {
        self.solo.as_ref()
    }

    pub fn live(&self) -> Option<&CandidateId> {
        self.live.as_ref()
    }

    pub fn status(&self) -> OrchestratorStatus {
        self.status
    }

    /// State published by the last processed frame.
    pub fn output(&self) -> &CameraState {
        &self.output
    }

    pub fn active_blend(&self) -> Option<&BlendState> {
        self.blender.active()
    }

    pub fn is_blending(&self) -> bool {
        self.blender.is_blending()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn arbitration(&self) -> &ArbitrationEngine<S> {
        &self.arbitration
    }

    pub fn scorer_mut(&mut self) -> &mut S {
        self.arbitration.scorer_mut()
    }

    /// Drop the live candidate, blend and timers. The next frame starts fresh.
    pub fn reset(&mut self) {
        self.arbitration.reset();
        self.blender.clear();
        self.live = None;
        self.last_frame = None;
        self.output = CameraState::neutral();
        self.status = OrchestratorStatus::NoLiveCamera;
    }

    /// Run one frame and return the published state.
    ///
    /// Ticks from a phase the update method does not accept, and repeated
    /// ticks for an already processed frame, return the last published state
    /// without touching timers or the sink.
    pub fn update(
        &mut self,
        tick: FrameTick,
        candidates: &mut [Box<dyn Candidate>],
        sink: &mut dyn OutputSink,
    ) -> &CameraState {
        if !self.config.update_method.accepts(tick.phase) {
            trace!(frame = tick.frame, phase = ?tick.phase, "Update phase not accepted");
            metrics::record_frame_skipped("phase");
            return &self.output;
        }
        if self.last_frame == Some(tick.frame) {
            trace!(frame = tick.frame, "Frame already processed");
            metrics::record_frame_skipped("reentrant");
            return &self.output;
        }
        self.last_frame = Some(tick.frame);

        let solo = self.active_solo(candidates);
        let is_solo = solo.is_some();
        let selected = match solo {
            Some(id) => Some(id),
            None => {
                self.arbitration
                    .select_live(candidates, self.live.as_ref(), tick.now, tick.delta_time)
                    .live
            }
        };

        let mut transition = None;
        if selected != self.live {
            transition = match selected {
                Some(incoming) => Some(self.go_live(incoming, candidates, &tick, is_solo)),
                None => {
                    self.go_dark();
                    None
                }
            };
        }

        let created = matches!(transition, Some(Transition::Blend { .. }));
        if self.blender.is_blending() && (!created || tick.is_forced()) {
            if let Some(finished) = self.blender.advance(tick.delta_time) {
                debug!(blend = %finished.id(), incoming = %finished.incoming(), "Blend finished");
                self.events.emit(CameraEvent::BlendFinished {
                    blend: finished.id().clone(),
                    incoming: finished.incoming().clone(),
                });
            }
        }

        let candidates: &[Box<dyn Candidate>] = candidates;
        self.output = match self.blender.evaluate(candidates) {
            Some(state) => state,
            None => self
                .live
                .as_ref()
                .and_then(|id| candidates.state_of(id))
                .cloned()
                .unwrap_or_else(CameraState::neutral),
        };

        self.status = match (&self.live, self.blender.active()) {
            (None, _) => OrchestratorStatus::NoLiveCamera,
            (Some(_), Some(_)) => OrchestratorStatus::Blending,
            (Some(_), None) if transition == Some(Transition::Cut) => OrchestratorStatus::Cut,
            (Some(_), None) => OrchestratorStatus::Settled,
        };
        metrics::set_blend_progress(self.blender.active().map(BlendState::progress).unwrap_or(0.0));
        metrics::record_frame_processed();

        sink.apply(&self.output);
        &self.output
    }

    /// Solo candidate, if it exists and is activatable this frame.
    fn active_solo(&self, candidates: &[Box<dyn Candidate>]) -> Option<CandidateId> {
        let solo = self.solo.as_ref()?;
        let usable = candidates
            .iter()
            .any(|c| c.id() == solo && c.is_activatable());
        if !usable {
            trace!(solo = %solo, "Solo candidate unavailable, using arbitration");
        }
        usable.then(|| solo.clone())
    }

    fn go_live(
        &mut self,
        incoming: CandidateId,
        candidates: &mut [Box<dyn Candidate>],
        tick: &FrameTick,
        is_solo: bool,
    ) -> Transition {
        let outgoing = self.live.take();
        info!(
            incoming = %incoming,
            outgoing = ?outgoing,
            solo = is_solo,
            frame = tick.frame,
            "Live camera changed"
        );
        metrics::record_live_change(is_solo);

        // The outgoing side is whatever was on screen, including a blend in progress
        let previous_state = self.output.clone();
        let previous = outgoing.as_ref().map(|id| PreviousLive {
            id,
            state: &previous_state,
        });
        if let Some(candidate) = candidates.iter_mut().find(|c| *c.id() == incoming) {
            candidate.on_became_live(previous, self.config.world_up, tick.delta_time);
        }

        self.events.emit(CameraEvent::CameraActivated {
            incoming: incoming.clone(),
            outgoing: outgoing.clone(),
        });
        if let Some(outgoing) = &outgoing {
            self.events.emit(CameraEvent::CameraDeactivated {
                candidate: outgoing.clone(),
            });
        }

        let definition = self.blend_definition(outgoing.as_ref(), &incoming, is_solo);
        let candidates: &[Box<dyn Candidate>] = candidates;
        let transition = self
            .blender
            .transition(candidates, outgoing.as_ref(), &incoming, &definition);

        match &transition {
            Transition::Cut => {
                self.events.emit(CameraEvent::CameraCut {
                    incoming: incoming.clone(),
                    outgoing,
                });
            }
            Transition::Blend { id, interrupted } => {
                metrics::record_blend_started(
                    definition.curve.as_str(),
                    definition.duration,
                    *interrupted,
                );
                self.events.emit(CameraEvent::BlendCreated {
                    blend: id.clone(),
                    outgoing,
                    incoming: incoming.clone(),
                    duration: definition.duration,
                    interrupted: *interrupted,
                });
            }
        }

        self.arbitration.note_live(incoming.clone(), tick.now);
        self.live = Some(incoming);
        transition
    }

    fn go_dark(&mut self) {
        if let Some(outgoing) = self.live.take() {
            info!(outgoing = %outgoing, "No live camera");
            if self.blender.clear().is_some() {
                debug!("Dropped active blend with the live camera");
            }
            self.events.emit(CameraEvent::CameraDeactivated { candidate: outgoing });
        }
    }

    fn blend_definition(
        &self,
        outgoing: Option<&CandidateId>,
        incoming: &CandidateId,
        is_solo: bool,
    ) -> BlendDefinition {
        if is_solo {
            return BlendDefinition::cut();
        }
        match &self.blend_lookup {
            Some(lookup) => lookup.resolve(outgoing, incoming, &self.config.default_blend),
            None => self.config.default_blend.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::StaticCandidate;
    use crate::config::UpdateMethod;
    use crate::sink::NullSink;
    use glam::{DQuat, DVec3};
    use std::cell::RefCell;
    use std::rc::Rc;
    use vcam_models::BlendCurve;

    fn at(x: f64) -> CameraState {
        CameraState::new(DVec3::new(x, 0.0, 0.0), DQuat::IDENTITY)
    }

    fn cut_config() -> OrchestratorConfig {
        OrchestratorConfig {
            default_blend: BlendDefinition::cut(),
            ..Default::default()
        }
    }

    fn recorder(orchestrator: &mut Orchestrator) -> Rc<RefCell<Vec<CameraEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        orchestrator.subscribe(Box::new(move |event: &CameraEvent| {
            sink.borrow_mut().push(event.clone());
        }));
        events
    }

    #[test]
    fn test_empty_candidates_publish_neutral_state() {
        let mut orchestrator = Orchestrator::from_config(OrchestratorConfig::default()).unwrap();
        let output = orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut [], &mut NullSink);
        assert!(output.is_neutral());
        assert_eq!(orchestrator.status(), OrchestratorStatus::NoLiveCamera);
    }

    #[test]
    fn test_first_live_is_a_cut() {
        let mut orchestrator = Orchestrator::from_config(OrchestratorConfig::default()).unwrap();
        let events = recorder(&mut orchestrator);
        let mut candidates = vec![StaticCandidate::new("a", 1, at(3.0)).boxed()];

        let output = orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut candidates, &mut NullSink);
        assert_eq!(output.raw_position.x, 3.0);
        assert_eq!(orchestrator.status(), OrchestratorStatus::Cut);
        assert_eq!(events.borrow().len(), 2);
        assert!(matches!(events.borrow()[1], CameraEvent::CameraCut { .. }));

        orchestrator.update(FrameTick::new(1, 0.016, 0.016), &mut candidates, &mut NullSink);
        assert_eq!(orchestrator.status(), OrchestratorStatus::Settled);
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn test_sink_receives_one_state_per_frame() {
        let mut orchestrator = Orchestrator::from_config(cut_config()).unwrap();
        let mut candidates = vec![StaticCandidate::new("a", 1, at(1.0)).boxed()];
        let mut applied = Vec::new();
        let mut sink = |state: &CameraState| applied.push(state.raw_position.x);

        orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut candidates, &mut sink);
        orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut candidates, &mut sink);
        orchestrator.update(FrameTick::new(1, 0.016, 0.016), &mut candidates, &mut sink);

        assert_eq!(applied, vec![1.0, 1.0]);
    }

    #[test]
    fn test_phase_gate() {
        let config = OrchestratorConfig {
            update_method: UpdateMethod::Fixed,
            ..cut_config()
        };
        let mut orchestrator = Orchestrator::from_config(config).unwrap();
        let mut candidates = vec![StaticCandidate::new("a", 1, at(1.0)).boxed()];

        orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut candidates, &mut NullSink);
        assert!(orchestrator.live().is_none());

        let tick = FrameTick::new(0, 0.0, 0.016).with_phase(UpdatePhase::Fixed);
        orchestrator.update(tick, &mut candidates, &mut NullSink);
        assert_eq!(orchestrator.live(), Some(&CandidateId::from("a")));
    }

    #[test]
    fn test_smart_update_takes_first_pass_of_each_frame() {
        let config = OrchestratorConfig {
            update_method: UpdateMethod::Smart,
            ..cut_config()
        };
        let mut orchestrator = Orchestrator::from_config(config).unwrap();
        let mut candidates = vec![
            StaticCandidate::new("a", 10, at(1.0)).boxed(),
            StaticCandidate::new("b", 0, at(2.0)).boxed(),
        ];
        let mut applied = Vec::new();
        let mut sink = |state: &CameraState| applied.push(state.raw_position.x);

        orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut candidates, &mut sink);
        let fixed = FrameTick::new(1, 0.016, 0.016).with_phase(UpdatePhase::Fixed);
        orchestrator.update(fixed, &mut candidates, &mut sink);

        // The late pass of the same frame is dropped even though b now wins
        candidates[1] = StaticCandidate::new("b", 20, at(2.0)).boxed();
        orchestrator.update(FrameTick::new(1, 0.016, 0.016), &mut candidates, &mut sink);
        assert_eq!(orchestrator.live(), Some(&CandidateId::from("a")));

        orchestrator.update(FrameTick::new(2, 0.032, 0.016), &mut candidates, &mut sink);
        assert_eq!(orchestrator.live(), Some(&CandidateId::from("b")));
        assert_eq!(applied, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_blend_is_not_advanced_on_creation_frame() {
        let config = OrchestratorConfig {
            default_blend: BlendDefinition::new(BlendCurve::Linear, 1.0),
            ..Default::default()
        };
        let mut orchestrator = Orchestrator::from_config(config).unwrap();
        let mut candidates = vec![
            StaticCandidate::new("a", 10, at(0.0)).boxed(),
            StaticCandidate::new("b", 5, at(10.0)).boxed(),
        ];
        orchestrator.update(FrameTick::new(0, 0.0, 0.1), &mut candidates, &mut NullSink);

        candidates[1] = StaticCandidate::new("b", 50, at(10.0)).boxed();
        let output = orchestrator.update(FrameTick::new(1, 0.1, 0.1), &mut candidates, &mut NullSink);
        assert_eq!(output.raw_position.x, 0.0);
        assert_eq!(orchestrator.status(), OrchestratorStatus::Blending);

        let output = orchestrator.update(FrameTick::new(2, 0.2, 0.1), &mut candidates, &mut NullSink);
        assert!((output.raw_position.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_forced_tick_completes_blend_immediately() {
        let mut orchestrator = Orchestrator::from_config(OrchestratorConfig::default()).unwrap();
        let events = recorder(&mut orchestrator);
        let mut candidates = vec![
            StaticCandidate::new("a", 10, at(0.0)).boxed(),
            StaticCandidate::new("b", 5, at(10.0)).boxed(),
        ];
        orchestrator.update(FrameTick::new(0, 0.0, 0.1), &mut candidates, &mut NullSink);

        candidates[1] = StaticCandidate::new("b", 50, at(10.0)).boxed();
        let output = orchestrator.update(FrameTick::forced(1, 0.1), &mut candidates, &mut NullSink);
        assert_eq!(output.raw_position.x, 10.0);
        assert!(!orchestrator.is_blending());
        assert!(matches!(
            events.borrow().last(),
            Some(CameraEvent::BlendFinished { .. })
        ));
    }

    #[test]
    fn test_solo_overrides_arbitration_with_cut() {
        let mut orchestrator = Orchestrator::from_config(OrchestratorConfig::default()).unwrap();
        let mut candidates = vec![
            StaticCandidate::new("a", 10, at(0.0)).boxed(),
            StaticCandidate::new("debug", 0, at(99.0)).boxed(),
        ];
        orchestrator.update(FrameTick::new(0, 0.0, 0.1), &mut candidates, &mut NullSink);

        orchestrator.set_solo(Some(CandidateId::from("debug")));
        let output = orchestrator.update(FrameTick::new(1, 0.1, 0.1), &mut candidates, &mut NullSink);
        assert_eq!(output.raw_position.x, 99.0);
        assert_eq!(orchestrator.status(), OrchestratorStatus::Cut);

        // Unknown solo candidates are ignored
        orchestrator.set_solo(Some(CandidateId::from("missing")));
        orchestrator.update(FrameTick::new(2, 0.2, 0.1), &mut candidates, &mut NullSink);
        assert_eq!(orchestrator.live(), Some(&CandidateId::from("a")));
        assert!(orchestrator.is_blending());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = OrchestratorConfig::default();
        config.arbitration.min_duration = -1.0;
        assert!(Orchestrator::from_config(config).is_err());
    }

    #[test]
    fn test_reset_starts_fresh() {
        let mut orchestrator = Orchestrator::from_config(cut_config()).unwrap();
        let mut candidates = vec![StaticCandidate::new("a", 1, at(1.0)).boxed()];
        orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut candidates, &mut NullSink);

        orchestrator.reset();
        assert!(orchestrator.live().is_none());
        assert!(orchestrator.output().is_neutral());

        // Same frame number is processed again after a reset
        orchestrator.update(FrameTick::new(0, 0.0, 0.016), &mut candidates, &mut NullSink);
        assert_eq!(orchestrator.live(), Some(&CandidateId::from("a")));
    }
}
