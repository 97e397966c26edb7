//! Scripted demo scene.
//!
//! A handful of composed rigs framing a subject at the origin, plus a cue
//! list that changes priorities, disables rigs and toggles a solo camera at
//! fixed times. `run` drives the scene through an orchestrator frame by
//! frame and tallies the transition events.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::DVec3;
use metrics::counter;
use tracing::{debug, info, warn};

use vcam_core::{
    BlendCurve, BlendDefinition, BlendHints, BlendTable, BlendTableEntry, CameraEvent,
    CameraState, Candidate, CandidateId, ComposedCandidate, FrameTick, Orchestrator, OutputSink,
    PreviousLive, ANY_CAMERA,
};

use crate::components::{DollyBody, FixedBody, FloorClamp, LookAtAim, SineNoise};
use crate::config::SimConfig;
use crate::error::SimResult;

const SUBJECT: DVec3 = DVec3::new(0.0, 1.0, 0.0);
const CUE_EPSILON: f64 = 1e-9;
const CUES_APPLIED_TOTAL: &str = "vcam_sim_cues_applied_total";

/// Shared controls for a rig that has been boxed into the candidate list.
#[derive(Debug, Clone)]
pub struct RigHandle {
    priority: Rc<Cell<i32>>,
    enabled: Rc<Cell<bool>>,
}

/// A composed candidate whose priority and enabled flag are script-driven.
pub struct Rig {
    camera: ComposedCandidate,
    handle: RigHandle,
}

impl Rig {
    pub fn new(camera: ComposedCandidate, priority: i32) -> (Self, RigHandle) {
        let handle = RigHandle {
            priority: Rc::new(Cell::new(priority)),
            enabled: Rc::new(Cell::new(true)),
        };
        let rig = Self {
            camera,
            handle: handle.clone(),
        };
        (rig, handle)
    }
}

impl Candidate for Rig {
    fn id(&self) -> &CandidateId {
        self.camera.id()
    }

    fn priority(&self) -> i32 {
        self.handle.priority.get()
    }

    fn is_activatable(&self) -> bool {
        self.handle.enabled.get()
    }

    fn state(&self) -> &CameraState {
        self.camera.state()
    }

    fn channel(&self) -> u32 {
        self.camera.channel()
    }

    fn prepare_frame(&mut self, delta_time: f64) {
        self.camera.prepare_frame(delta_time);
    }

    fn on_became_live(
        &mut self,
        previous: Option<PreviousLive<'_>>,
        world_up: DVec3,
        delta_time: f64,
    ) {
        self.camera.on_became_live(previous, world_up, delta_time);
    }
}

/// Scripted change applied at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum CueAction {
    Priority { rig: String, priority: i32 },
    Enabled { rig: String, enabled: bool },
    Solo(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Seconds from the start of the run
    pub at: f64,
    pub action: CueAction,
}

impl Cue {
    pub fn priority(at: f64, rig: &str, priority: i32) -> Self {
        Self {
            at,
            action: CueAction::Priority {
                rig: rig.to_string(),
                priority,
            },
        }
    }

    pub fn enabled(at: f64, rig: &str, enabled: bool) -> Self {
        Self {
            at,
            action: CueAction::Enabled {
                rig: rig.to_string(),
                enabled,
            },
        }
    }

    pub fn solo(at: f64, rig: Option<&str>) -> Self {
        Self {
            at,
            action: CueAction::Solo(rig.map(str::to_string)),
        }
    }
}

/// Candidates plus the cue list that drives them.
pub struct Scene {
    candidates: Vec<Box<dyn Candidate>>,
    handles: HashMap<String, RigHandle>,
    cues: Vec<Cue>,
    next_cue: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            handles: HashMap::new(),
            cues: Vec::new(),
            next_cue: 0,
        }
    }

    /// Add a rig. Declaration order is the priority tie-break order.
    pub fn add_rig(&mut self, camera: ComposedCandidate, priority: i32) {
        let name = camera.id().as_str().to_string();
        let (rig, handle) = Rig::new(camera, priority);
        self.candidates.push(Box::new(rig));
        self.handles.insert(name, handle);
    }

    /// Add a cue. Cues are kept sorted by time, stable for equal times.
    pub fn add_cue(&mut self, cue: Cue) {
        let index = self.cues.partition_point(|c| c.at <= cue.at);
        self.cues.insert(index, cue);
    }

    pub fn candidates(&self) -> &[Box<dyn Candidate>] {
        &self.candidates
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Four rigs around a subject at the origin with a ten second script.
    pub fn demo() -> Self {
        let mut scene = Self::new();
        let aimed = CameraState::default().with_look_at(SUBJECT);

        scene.add_rig(
            ComposedCandidate::new("wide", 0, aimed.clone())
                .with_component(Box::new(FixedBody::new(DVec3::new(0.0, 6.0, -18.0))))
                .with_component(Box::new(LookAtAim)),
            10,
        );
        scene.add_rig(
            ComposedCandidate::new("close", 0, aimed.clone())
                .with_component(Box::new(FixedBody::new(DVec3::new(1.5, 1.6, -3.0))))
                .with_component(Box::new(LookAtAim))
                .with_component(Box::new(SineNoise::new(DVec3::new(0.03, 0.02, 0.01), 0.8)))
                .with_extension(Box::new(FloorClamp { floor: 0.2 })),
            5,
        );
        scene.add_rig(
            ComposedCandidate::new(
                "dolly",
                0,
                aimed.clone().with_hints(BlendHints::SPHERICAL_POSITION),
            )
            .with_component(Box::new(DollyBody::new(
                DVec3::new(-8.0, 1.2, -6.0),
                DVec3::new(-2.0, 1.2, -2.0),
                1.5,
            )))
            .with_component(Box::new(LookAtAim)),
            0,
        );
        scene.add_rig(
            ComposedCandidate::new("overhead", 0, aimed)
                .with_component(Box::new(FixedBody::new(DVec3::new(0.0, 15.0, 0.5))))
                .with_component(Box::new(LookAtAim)),
            1,
        );

        scene.add_cue(Cue::priority(2.0, "close", 20));
        scene.add_cue(Cue::priority(3.0, "dolly", 30));
        scene.add_cue(Cue::solo(5.5, Some("overhead")));
        scene.add_cue(Cue::solo(6.5, None));
        scene.add_cue(Cue::enabled(7.0, "dolly", false));
        scene.add_cue(Cue::priority(8.5, "close", 0));
        scene
    }

    /// Blend table matching the demo rigs.
    pub fn demo_blend_table() -> BlendTable {
        BlendTable::new(vec![
            BlendTableEntry::new(
                ANY_CAMERA,
                "close",
                BlendDefinition::new(BlendCurve::EaseInOut, 2.0),
            ),
            BlendTableEntry::new("close", "dolly", BlendDefinition::new(BlendCurve::Linear, 1.0)),
            BlendTableEntry::new(ANY_CAMERA, "wide", BlendDefinition::new(BlendCurve::EaseOut, 1.5)),
        ])
    }

    /// Apply every cue due at `now`.
    pub fn apply_cues(&mut self, now: f64, orchestrator: &mut Orchestrator) {
        while let Some(cue) = self.cues.get(self.next_cue) {
            if cue.at > now + CUE_EPSILON {
                break;
            }
            debug!(at = cue.at, action = ?cue.action, "Applying cue");
            match &cue.action {
                CueAction::Priority { rig, priority } => match self.handles.get(rig) {
                    Some(handle) => handle.priority.set(*priority),
                    None => warn!(rig = %rig, "Cue targets unknown rig"),
                },
                CueAction::Enabled { rig, enabled } => match self.handles.get(rig) {
                    Some(handle) => handle.enabled.set(*enabled),
                    None => warn!(rig = %rig, "Cue targets unknown rig"),
                },
                CueAction::Solo(rig) => orchestrator.set_solo(rig.as_deref().map(CandidateId::from)),
            }
            counter!(CUES_APPLIED_TOTAL).increment(1);
            self.next_cue += 1;
        }
    }

    /// Recompute every rig's state for the coming frame.
    pub fn prepare_frame(&mut self, delta_time: f64) {
        for candidate in self.candidates.iter_mut() {
            candidate.prepare_frame(delta_time);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Sink that logs the published pose at a fixed frame interval.
#[derive(Debug, Default)]
pub struct TraceSink {
    report_every: u64,
    applied: u64,
    last_position: DVec3,
}

impl TraceSink {
    pub fn new(report_every: u64) -> Self {
        Self {
            report_every,
            ..Default::default()
        }
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn last_position(&self) -> DVec3 {
        self.last_position
    }
}

impl OutputSink for TraceSink {
    fn apply(&mut self, state: &CameraState) {
        self.applied += 1;
        self.last_position = state.final_position();
        if self.report_every > 0 && self.applied % self.report_every == 0 {
            info!(
                frame = self.applied,
                position = %self.last_position,
                fov = state.lens.field_of_view,
                "Camera pose"
            );
        }
    }
}

/// Counts of transition events observed during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTally {
    pub activations: usize,
    pub cuts: usize,
    pub blends_created: usize,
    pub blends_finished: usize,
}

impl EventTally {
    fn record(&mut self, event: &CameraEvent) {
        match event {
            CameraEvent::CameraActivated { .. } => self.activations += 1,
            CameraEvent::CameraCut { .. } => self.cuts += 1,
            CameraEvent::BlendCreated { .. } => self.blends_created += 1,
            CameraEvent::BlendFinished { .. } => self.blends_finished += 1,
            CameraEvent::CameraDeactivated { .. } => {}
        }
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone)]
pub struct SimReport {
    pub frames: u64,
    pub live_order: Vec<CandidateId>,
    pub events: EventTally,
    pub final_live: Option<CandidateId>,
    pub final_position: DVec3,
}

/// Drive `scene` through a fresh orchestrator for `config.frames` frames.
pub fn run(config: &SimConfig, scene: &mut Scene, blend_table: BlendTable) -> SimResult<SimReport> {
    config.validate()?;
    let mut orchestrator = Orchestrator::from_config(config.camera.clone())?;
    orchestrator.set_blend_lookup(Box::new(blend_table));

    let tally = Rc::new(RefCell::new(EventTally::default()));
    let live_order = Rc::new(RefCell::new(Vec::new()));
    {
        let tally = Rc::clone(&tally);
        let live_order = Rc::clone(&live_order);
        orchestrator.subscribe(Box::new(move |event: &CameraEvent| {
            tally.borrow_mut().record(event);
            if let CameraEvent::CameraActivated { incoming, .. } = event {
                live_order.borrow_mut().push(incoming.clone());
            }
        }));
    }

    let delta_time = config.frame_time();
    let mut sink = TraceSink::new(config.report_every);
    info!(
        frames = config.frames,
        fps = config.fps,
        rigs = scene.candidates().len(),
        cues = scene.cues().len(),
        "Starting simulation"
    );

    for frame in 0..config.frames {
        let now = frame as f64 * delta_time;
        scene.apply_cues(now, &mut orchestrator);
        scene.prepare_frame(delta_time);
        orchestrator.update(
            FrameTick::new(frame, now, delta_time),
            &mut scene.candidates,
            &mut sink,
        );
    }

    let events = tally.borrow().clone();
    let live_order = live_order.borrow().clone();
    info!(
        frames = sink.applied(),
        activations = events.activations,
        cuts = events.cuts,
        blends = events.blends_created,
        blends_finished = events.blends_finished,
        final_live = ?orchestrator.live(),
        "Simulation complete"
    );

    Ok(SimReport {
        frames: sink.applied(),
        live_order,
        events,
        final_live: orchestrator.live().cloned(),
        final_position: sink.last_position(),
    })
}
