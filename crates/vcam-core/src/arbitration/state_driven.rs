//! Instruction tables keyed by an external state name.
//!
//! A game or animation system reports its current state (e.g. "combat",
//! "explore") and each state lists the candidates to use in preference order,
//! optionally with their own activation delay and hold time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::scoring::highest_priority;
use super::{CandidateScorer, HysteresisTiming};
use crate::candidate::Candidate;
use crate::error::{CameraError, CameraResult};
use vcam_models::CandidateId;

/// One row of a state's instruction list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateInstruction {
    pub candidate: CandidateId,
    /// Overrides the configured activation delay for this candidate
    #[serde(default)]
    pub activate_after: Option<f64>,
    /// Overrides the configured minimum hold for this candidate
    #[serde(default)]
    pub min_duration: Option<f64>,
}

impl StateInstruction {
    pub fn new(candidate: impl Into<CandidateId>) -> Self {
        Self {
            candidate: candidate.into(),
            activate_after: None,
            min_duration: None,
        }
    }

    pub fn with_timing(mut self, activate_after: f64, min_duration: f64) -> Self {
        self.activate_after = Some(activate_after);
        self.min_duration = Some(min_duration);
        self
    }

    fn timing(&self) -> HysteresisTiming {
        HysteresisTiming {
            activate_after: self.activate_after,
            min_duration: self.min_duration,
        }
    }
}

/// Selects the first eligible candidate listed for the current state.
///
/// With no current state, or no listed candidate eligible, it falls back
/// to plain priority ranking.
#[derive(Debug, Clone, Default)]
pub struct StateTableScorer {
    states: HashMap<String, Vec<StateInstruction>>,
    current: Option<String>,
}

impl StateTableScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table of the form `{"state": [{"candidate": "id", ...}]}`.
    pub fn from_json(json: &str) -> CameraResult<Self> {
        let states: HashMap<String, Vec<StateInstruction>> = serde_json::from_str(json)?;
        let scorer = Self {
            states,
            current: None,
        };
        scorer.validate()?;
        Ok(scorer)
    }

    /// Replace the instructions for `state`.
    pub fn insert_state(&mut self, state: impl Into<String>, instructions: Vec<StateInstruction>) {
        self.states.insert(state.into(), instructions);
    }

    /// Switch the current state. Unknown states fall back to priority ranking.
    pub fn set_state(&mut self, state: impl Into<String>) {
        let state = state.into();
        if !self.states.contains_key(&state) {
            warn!(state = %state, "No instructions for state, falling back to priority");
        }
        if self.current.as_deref() != Some(state.as_str()) {
            debug!(state = %state, "Camera state changed");
        }
        self.current = Some(state);
    }

    pub fn clear_state(&mut self) {
        self.current = None;
    }

    pub fn current_state(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn current_instructions(&self) -> &[StateInstruction] {
        self.current
            .as_ref()
            .and_then(|state| self.states.get(state))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Reject empty names and negative or non-finite timings.
    pub fn validate(&self) -> CameraResult<()> {
        for (state, instructions) in &self.states {
            if state.is_empty() {
                return Err(CameraError::invalid_instructions("state name is empty"));
            }
            for instruction in instructions {
                if instruction.candidate.as_str().is_empty() {
                    return Err(CameraError::invalid_instructions(format!(
                        "state '{}' has an instruction without a candidate",
                        state
                    )));
                }
                let timings = [instruction.activate_after, instruction.min_duration];
                if timings
                    .iter()
                    .flatten()
                    .any(|t| !t.is_finite() || *t < 0.0)
                {
                    return Err(CameraError::invalid_instructions(format!(
                        "state '{}' has a negative timing for '{}'",
                        state, instruction.candidate
                    )));
                }
            }
        }
        Ok(())
    }
}

impl CandidateScorer for StateTableScorer {
    fn name(&self) -> &'static str {
        "state_table"
    }

    fn best(
        &mut self,
        eligible: &[&dyn Candidate],
        _previous_live: Option<&CandidateId>,
        _now: f64,
    ) -> Option<CandidateId> {
        self.current_instructions()
            .iter()
            .find(|instruction| eligible.iter().any(|c| *c.id() == instruction.candidate))
            .map(|instruction| instruction.candidate.clone())
            .or_else(|| highest_priority(eligible).map(|c| c.id().clone()))
    }

    fn timing_for(&self, candidate: &CandidateId) -> Option<HysteresisTiming> {
        self.current_instructions()
            .iter()
            .find(|instruction| instruction.candidate == *candidate)
            .map(StateInstruction::timing)
    }
}
