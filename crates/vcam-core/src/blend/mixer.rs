//! N-way weighted mixing of candidate states.

use tracing::{trace, warn};

use super::interpolate::lerp_states;
use crate::candidate::StateLookup;
use vcam_models::{CameraState, CandidateId};

/// Weights at or below this are ignored.
pub const DEFAULT_WEIGHT_EPSILON: f64 = 1e-4;

/// Result of a mixer evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MixOutput {
    /// Mixed state, neutral when nothing contributed
    pub state: CameraState,
    /// Input with the greatest weight, first declared on ties
    pub dominant: Option<CandidateId>,
}

/// Folds any number of weighted candidate states into one.
///
/// Each contributing input is folded into the running result with weight
/// `w / (sum of weights so far)`, so the output is the normalized weighted
/// average of every channel.
#[derive(Debug, Clone)]
pub struct WeightedMixer {
    entries: Vec<(CandidateId, f64)>,
    epsilon: f64,
}

impl WeightedMixer {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            epsilon: DEFAULT_WEIGHT_EPSILON,
        }
    }

    /// Set an input's weight, adding the input if unknown.
    ///
    /// NaN and negative weights are stored as zero.
    pub fn set_weight(&mut self, id: impl Into<CandidateId>, weight: f64) {
        let id = id.into();
        let weight = if weight.is_nan() || weight < 0.0 {
            warn!(candidate = %id, weight, "Clamping invalid mixer weight to zero");
            0.0
        } else {
            weight
        };
        match self.entries.iter_mut().find(|(known, _)| *known == id) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((id, weight)),
        }
    }

    pub fn weight(&self, id: &CandidateId) -> f64 {
        self.entries
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, weight)| *weight)
            .unwrap_or(0.0)
    }

    pub fn remove(&mut self, id: &CandidateId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(known, _)| known != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mix the current states of every weighted input.
    ///
    /// Inputs that no longer exist in `lookup` are skipped.
    pub fn evaluate<L: StateLookup + ?Sized>(&self, lookup: &L) -> MixOutput {
        let mut mixed: Option<CameraState> = None;
        let mut total = 0.0;
        let mut dominant: Option<(&CandidateId, f64)> = None;

        for (id, weight) in &self.entries {
            if *weight <= self.epsilon {
                continue;
            }
            let Some(state) = lookup.state_of(id) else {
                trace!(candidate = %id, "Skipping stale mixer input");
                continue;
            };

            total += weight;
            mixed = Some(match mixed {
                None => state.clone(),
                Some(acc) => lerp_states(&acc, state, weight / total),
            });

            match dominant {
                Some((_, best)) if *weight <= best => {}
                _ => dominant = Some((id, *weight)),
            }
        }

        MixOutput {
            state: mixed.unwrap_or_else(CameraState::neutral),
            dominant: dominant.map(|(id, _)| id.clone()),
        }
    }
}

impl Default for WeightedMixer {
    fn default() -> Self {
        Self::new()
    }
}
