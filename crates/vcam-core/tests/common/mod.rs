//! Shared fixtures for orchestrator integration tests.

#![allow(dead_code)]

use glam::{DQuat, DVec3};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vcam_core::{
    CameraEvent, CameraState, Candidate, CandidateId, CandidateScorer, FrameTick, Orchestrator,
    PreviousLive,
};

/// State at `x` on the X axis with identity orientation.
pub fn at(x: f64) -> CameraState {
    CameraState::new(DVec3::new(x, 0.0, 0.0), DQuat::IDENTITY)
}

/// Handles for mutating a `ScriptedCandidate` after it has been boxed.
#[derive(Clone)]
pub struct ScriptHandle {
    pub priority: Rc<Cell<i32>>,
    pub enabled: Rc<Cell<bool>>,
    pub activations: Rc<Cell<u32>>,
}

/// Candidate whose priority and enabled flag can change between frames.
pub struct ScriptedCandidate {
    id: CandidateId,
    state: CameraState,
    handle: ScriptHandle,
}

impl Candidate for ScriptedCandidate {
    fn id(&self) -> &CandidateId {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.handle.priority.get()
    }

    fn is_activatable(&self) -> bool {
        self.handle.enabled.get()
    }

    fn state(&self) -> &CameraState {
        &self.state
    }

    fn on_became_live(
        &mut self,
        _previous: Option<PreviousLive<'_>>,
        _world_up: DVec3,
        _delta_time: f64,
    ) {
        self.handle.activations.set(self.handle.activations.get() + 1);
    }
}

pub fn scripted(
    id: &str,
    priority: i32,
    state: CameraState,
) -> (Box<dyn Candidate>, ScriptHandle) {
    let handle = ScriptHandle {
        priority: Rc::new(Cell::new(priority)),
        enabled: Rc::new(Cell::new(true)),
        activations: Rc::new(Cell::new(0)),
    };
    let candidate = ScriptedCandidate {
        id: CandidateId::from(id),
        state,
        handle: handle.clone(),
    };
    (Box::new(candidate), handle)
}

/// Fixed-step frame clock. Time is derived from the frame number so that
/// timer comparisons do not accumulate rounding error.
pub struct Clock {
    frame: u64,
    step: f64,
}

impl Clock {
    pub fn new(step: f64) -> Self {
        Self { frame: 0, step }
    }

    /// Tick for the current frame, then move to the next one.
    pub fn tick(&mut self) -> FrameTick {
        let tick = self.peek();
        self.frame += 1;
        tick
    }

    /// Tick for the current frame without advancing.
    pub fn peek(&self) -> FrameTick {
        FrameTick::new(self.frame, self.frame as f64 * self.step, self.step)
    }

    pub fn now(&self) -> f64 {
        self.frame as f64 * self.step
    }
}

pub fn record_events<S: CandidateScorer>(
    orchestrator: &mut Orchestrator<S>,
) -> Rc<RefCell<Vec<CameraEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    orchestrator.subscribe(Box::new(move |event: &CameraEvent| {
        sink.borrow_mut().push(event.clone());
    }));
    events
}

pub fn count<F>(events: &Rc<RefCell<Vec<CameraEvent>>>, predicate: F) -> usize
where
    F: Fn(&CameraEvent) -> bool,
{
    events.borrow().iter().filter(|e| predicate(e)).count()
}

pub fn id(s: &str) -> CandidateId {
    CandidateId::from(s)
}
