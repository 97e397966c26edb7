//! Live-candidate arbitration.
//!
//! This module decides which candidate drives the camera each frame:
//! - A `CandidateScorer` strategy names the best eligible candidate
//! - `ArbitrationEngine` applies activation delay and minimum hold on top
//!   of the scorer to prevent rapid ping-ponging between candidates
//!
//! # Module Structure
//!
//! - `scoring`: priority, priority+quality and weight-table scorers
//! - `state_driven`: instruction tables keyed by an external state
//! - `sequence`: timed instruction lists

pub mod scoring;
pub mod sequence;
pub mod state_driven;

pub use scoring::{default_scorer, DominantWeightScorer, PriorityScorer, QualityScorer};
pub use sequence::{SequenceInstruction, SequenceScorer};
pub use state_driven::{StateInstruction, StateTableScorer};

use tracing::{debug, info};

use crate::candidate::Candidate;
use crate::config::ArbitrationConfig;
use crate::metrics;
use vcam_models::CandidateId;

/// Tolerance for timer comparisons, absorbing accumulated frame-time error.
const TIMER_EPSILON: f64 = 1e-9;

/// Per-candidate overrides of the hysteresis timings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HysteresisTiming {
    /// Applies while the candidate is pending
    pub activate_after: Option<f64>,
    /// Applies while the candidate is live, read when it goes live
    pub min_duration: Option<f64>,
}

/// Strategy naming the best candidate among the eligible ones.
pub trait CandidateScorer {
    /// Strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Best candidate this frame, or `None` when nothing qualifies.
    ///
    /// `eligible` contains only activatable candidates on a matching channel,
    /// in declaration order.
    fn best(
        &mut self,
        eligible: &[&dyn Candidate],
        previous_live: Option<&CandidateId>,
        now: f64,
    ) -> Option<CandidateId>;

    /// Timing overrides for a specific candidate.
    fn timing_for(&self, _candidate: &CandidateId) -> Option<HysteresisTiming> {
        None
    }

    /// Called every frame a candidate is waiting for promotion.
    fn on_pending(&mut self, _pending: &CandidateId) {}

    /// Called when a candidate is confirmed live.
    fn on_activation_confirmed(&mut self, _live: &CandidateId) {}

    /// Called when arbitration state is cleared.
    fn reset(&mut self) {}
}

impl CandidateScorer for Box<dyn CandidateScorer> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn best(
        &mut self,
        eligible: &[&dyn Candidate],
        previous_live: Option<&CandidateId>,
        now: f64,
    ) -> Option<CandidateId> {
        (**self).best(eligible, previous_live, now)
    }

    fn timing_for(&self, candidate: &CandidateId) -> Option<HysteresisTiming> {
        (**self).timing_for(candidate)
    }

    fn on_pending(&mut self, pending: &CandidateId) {
        (**self).on_pending(pending)
    }

    fn on_activation_confirmed(&mut self, live: &CandidateId) {
        (**self).on_activation_confirmed(live)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Outcome of one arbitration pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    /// Candidate that should drive the camera
    pub live: Option<CandidateId>,
    /// Better candidate waiting for promotion
    pub pending: Option<CandidateId>,
    /// Whether `pending` is set
    pub is_pending: bool,
}

impl Selection {
    fn empty() -> Self {
        Self::default()
    }

    fn settled(live: CandidateId) -> Self {
        Self {
            live: Some(live),
            pending: None,
            is_pending: false,
        }
    }

    fn waiting(live: CandidateId, pending: CandidateId) -> Self {
        Self {
            live: Some(live),
            pending: Some(pending),
            is_pending: true,
        }
    }
}

/// Chooses the live candidate with activation hysteresis.
///
/// A newly-better candidate first becomes pending. It is promoted once it has
/// stayed best for `activate_after` seconds and the live candidate has been
/// held for `min_duration` seconds.
pub struct ArbitrationEngine<S: CandidateScorer = Box<dyn CandidateScorer>> {
    config: ArbitrationConfig,
    scorer: S,
    /// Live candidate the activation time refers to
    live: Option<CandidateId>,
    /// Clock time the live candidate was activated
    activation_time: f64,
    /// Minimum hold the scorer assigned to the live candidate on activation
    live_hold: Option<f64>,
    /// Candidate waiting for promotion
    pending: Option<CandidateId>,
    /// Clock time the pending candidate became best
    pending_since: f64,
}

impl ArbitrationEngine<Box<dyn CandidateScorer>> {
    /// Create an engine using the scorer named by `config.scoring`.
    pub fn from_config(config: ArbitrationConfig) -> Self {
        let scorer = default_scorer(&config);
        Self::new(config, scorer)
    }
}

impl<S: CandidateScorer> ArbitrationEngine<S> {
    /// Create an engine with an explicit scorer.
    pub fn new(config: ArbitrationConfig, scorer: S) -> Self {
        Self {
            config,
            scorer,
            live: None,
            activation_time: 0.0,
            live_hold: None,
            pending: None,
            pending_since: 0.0,
        }
    }

    pub fn config(&self) -> &ArbitrationConfig {
        &self.config
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn scorer_mut(&mut self) -> &mut S {
        &mut self.scorer
    }

    /// Candidate currently waiting for promotion.
    pub fn pending(&self) -> Option<&CandidateId> {
        self.pending.as_ref()
    }

    /// Clock time the live candidate was activated.
    pub fn activation_time(&self) -> Option<f64> {
        self.live.as_ref().map(|_| self.activation_time)
    }

    /// Decide the live candidate for this frame.
    ///
    /// `delta_time < 0` marks a forced update that bypasses hysteresis, as
    /// does the absence of a usable previous live candidate.
    pub fn select_live(
        &mut self,
        candidates: &[Box<dyn Candidate>],
        previous_live: Option<&CandidateId>,
        now: f64,
        delta_time: f64,
    ) -> Selection {
        let mask = self.config.channel_mask;
        let eligible: Vec<&dyn Candidate> = candidates
            .iter()
            .filter(|c| c.is_activatable() && c.channel() & mask != 0)
            .map(|c| &**c)
            .collect();
        metrics::record_eligible_candidates(eligible.len());

        if let Some(pending) = &self.pending {
            if !eligible.iter().any(|c| c.id() == pending) {
                debug!(pending = %pending, "Pending candidate no longer activatable, resetting");
                self.clear_pending();
            }
        }

        let Some(best) = self.scorer.best(&eligible, previous_live, now) else {
            if self.live.is_some() || self.pending.is_some() {
                debug!(
                    scorer = self.scorer.name(),
                    "No eligible candidate, clearing arbitration state"
                );
            }
            self.reset();
            return Selection::empty();
        };

        let previous = previous_live.filter(|id| eligible.iter().any(|c| c.id() == *id));
        let live = match previous {
            Some(live) if delta_time >= 0.0 => live.clone(),
            _ => {
                self.activate(best.clone(), now);
                return Selection::settled(best);
            }
        };

        // Live was chosen outside this engine and never reported via note_live
        if self.live.as_ref() != Some(&live) {
            self.live_hold = self.scorer.timing_for(&live).and_then(|t| t.min_duration);
            self.live = Some(live.clone());
            self.activation_time = now;
        }

        if best == live {
            self.clear_pending();
            return Selection::settled(live);
        }

        if self.pending.as_ref() != Some(&best) {
            debug!(
                live = %live,
                pending = %best,
                now,
                "New best candidate pending activation"
            );
            self.pending = Some(best.clone());
            self.pending_since = now;
        }
        self.scorer.on_pending(&best);

        let activate_after = self
            .scorer
            .timing_for(&best)
            .and_then(|t| t.activate_after)
            .unwrap_or(self.config.activate_after);
        let min_duration = self.live_hold.unwrap_or(self.config.min_duration);

        let waited = now - self.pending_since >= activate_after - TIMER_EPSILON;
        let held = now - self.activation_time >= min_duration - TIMER_EPSILON;
        let overrides = self.config.priority_overrides_min_duration
            && priority_of(&eligible, &best) > priority_of(&eligible, &live);

        if waited && (held || overrides) {
            if !held {
                debug!(live = %live, pending = %best, "Higher priority overrides minimum hold");
            }
            self.activate(best.clone(), now);
            return Selection::settled(best);
        }

        Selection::waiting(live, best)
    }

    /// Record that `candidate` went live at `now` by a decision made outside
    /// this engine, such as a solo override.
    ///
    /// The minimum hold then runs from the real activation time. A no-op when
    /// `candidate` is already the engine's live candidate.
    pub fn note_live(&mut self, candidate: CandidateId, now: f64) {
        if self.live.as_ref() == Some(&candidate) {
            return;
        }
        debug!(candidate = %candidate, now, "Live candidate set outside arbitration");
        self.live_hold = self.scorer.timing_for(&candidate).and_then(|t| t.min_duration);
        self.live = Some(candidate);
        self.activation_time = now;
        self.clear_pending();
    }

    /// Clear all activation and pending bookkeeping.
    pub fn reset(&mut self) {
        self.live = None;
        self.activation_time = 0.0;
        self.live_hold = None;
        self.clear_pending();
        self.scorer.reset();
    }

    fn activate(&mut self, candidate: CandidateId, now: f64) {
        if self.live.as_ref() != Some(&candidate) {
            info!(
                candidate = %candidate,
                scorer = self.scorer.name(),
                now,
                "Candidate activated by arbitration"
            );
        }
        self.scorer.on_activation_confirmed(&candidate);
        self.live_hold = self.scorer.timing_for(&candidate).and_then(|t| t.min_duration);
        self.live = Some(candidate);
        self.activation_time = now;
        self.clear_pending();
    }

    fn clear_pending(&mut self) {
        self.pending = None;
        self.pending_since = 0.0;
    }
}

fn priority_of(eligible: &[&dyn Candidate], id: &CandidateId) -> i32 {
    eligible
        .iter()
        .find(|c| c.id() == id)
        .map(|c| c.priority())
        .unwrap_or(i32::MIN)
}
