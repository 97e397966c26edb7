//! Built-in candidate scorers.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::CandidateScorer;
use crate::candidate::Candidate;
use crate::config::{ArbitrationConfig, ScoringMode};
use vcam_models::CandidateId;

/// Quality differences at or below this are ties.
pub const QUALITY_EPSILON: f64 = 1e-6;

/// Build the scorer named by `config.scoring`.
pub fn default_scorer(config: &ArbitrationConfig) -> Box<dyn CandidateScorer> {
    match config.scoring {
        ScoringMode::Priority => Box::new(PriorityScorer),
        ScoringMode::Quality => Box::new(QualityScorer::from_config(config)),
    }
}

/// Greatest priority wins. Ties go to the first declared candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityScorer;

impl CandidateScorer for PriorityScorer {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn best(
        &mut self,
        eligible: &[&dyn Candidate],
        _previous_live: Option<&CandidateId>,
        _now: f64,
    ) -> Option<CandidateId> {
        highest_priority(eligible).map(|c| c.id().clone())
    }
}

/// First candidate with the greatest priority.
pub(crate) fn highest_priority<'a>(eligible: &[&'a dyn Candidate]) -> Option<&'a dyn Candidate> {
    let mut best: Option<&dyn Candidate> = None;
    for candidate in eligible {
        match best {
            Some(current) if candidate.priority() <= current.priority() => {}
            _ => best = Some(*candidate),
        }
    }
    best
}

/// Ranks by priority, then shot quality.
///
/// A full tie keeps the previous live candidate. Otherwise ties fall back
/// to declaration order, or to a shuffled order when `randomize_ties` is on.
pub struct QualityScorer {
    randomize_ties: bool,
    rerandomize_while_pending: bool,
    rng: StdRng,
    /// Tie-break rank of every candidate seen so far
    order: Vec<CandidateId>,
}

impl QualityScorer {
    /// Deterministic tie-breaking by declaration order.
    pub fn new() -> Self {
        Self {
            randomize_ties: false,
            rerandomize_while_pending: false,
            rng: StdRng::seed_from_u64(0),
            order: Vec::new(),
        }
    }

    pub fn from_config(config: &ArbitrationConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            randomize_ties: config.randomize_ties,
            rerandomize_while_pending: config.rerandomize_while_pending,
            rng,
            order: Vec::new(),
        }
    }

    /// Randomized tie-breaking with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            randomize_ties: true,
            rerandomize_while_pending: false,
            rng: StdRng::seed_from_u64(seed),
            order: Vec::new(),
        }
    }

    /// Current tie-break order.
    pub fn tie_order(&self) -> &[CandidateId] {
        &self.order
    }

    fn register(&mut self, eligible: &[&dyn Candidate]) {
        for candidate in eligible {
            if self.order.iter().any(|id| id == candidate.id()) {
                continue;
            }
            let index = self.rng.random_range(0..=self.order.len());
            self.order.insert(index, candidate.id().clone());
        }
    }

    fn reshuffle(&mut self) {
        self.order.shuffle(&mut self.rng);
        debug!(candidates = self.order.len(), "Reshuffled tie-break order");
    }

    fn tie_rank(&self, id: &CandidateId) -> usize {
        self.order
            .iter()
            .position(|known| known == id)
            .unwrap_or(usize::MAX)
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn quality_of(candidate: &dyn Candidate) -> f64 {
    let quality = candidate.state().shot_quality;
    if quality.is_nan() {
        0.0
    } else {
        quality
    }
}

/// Compare by priority, then quality. `Equal` is a full tie.
fn compare_shots(a: &dyn Candidate, b: &dyn Candidate) -> Ordering {
    a.priority().cmp(&b.priority()).then_with(|| {
        let (qa, qb) = (quality_of(a), quality_of(b));
        if (qa - qb).abs() <= QUALITY_EPSILON {
            Ordering::Equal
        } else if qa > qb {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    })
}

impl CandidateScorer for QualityScorer {
    fn name(&self) -> &'static str {
        "quality"
    }

    fn best(
        &mut self,
        eligible: &[&dyn Candidate],
        previous_live: Option<&CandidateId>,
        _now: f64,
    ) -> Option<CandidateId> {
        if self.randomize_ties {
            self.register(eligible);
        }

        let mut best: Option<&dyn Candidate> = None;
        for candidate in eligible {
            let replace = match best {
                None => true,
                Some(current) => match compare_shots(*candidate, current) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => {
                        if previous_live == Some(current.id()) {
                            false
                        } else if previous_live == Some(candidate.id()) {
                            true
                        } else if self.randomize_ties {
                            self.tie_rank(candidate.id()) < self.tie_rank(current.id())
                        } else {
                            false
                        }
                    }
                },
            };
            if replace {
                best = Some(*candidate);
            }
        }
        best.map(|c| c.id().clone())
    }

    fn on_pending(&mut self, _pending: &CandidateId) {
        if self.randomize_ties && self.rerandomize_while_pending {
            self.reshuffle();
        }
    }

    fn on_activation_confirmed(&mut self, _live: &CandidateId) {
        if self.randomize_ties {
            self.reshuffle();
        }
    }

    fn reset(&mut self) {
        self.order.clear();
    }
}

/// Picks the candidate with the greatest externally-supplied weight.
///
/// Used when an upstream mixer owns the weights and the dominant input
/// should be reported as live.
#[derive(Debug, Clone)]
pub struct DominantWeightScorer {
    weights: HashMap<CandidateId, f64>,
    epsilon: f64,
}

impl DominantWeightScorer {
    pub fn new() -> Self {
        Self {
            weights: HashMap::new(),
            epsilon: 1e-4,
        }
    }

    /// Set a candidate's weight. Negative and NaN weights count as zero.
    pub fn set_weight(&mut self, id: impl Into<CandidateId>, weight: f64) {
        let id = id.into();
        let weight = if weight.is_nan() || weight < 0.0 {
            warn!(candidate = %id, weight, "Ignoring invalid dominance weight");
            0.0
        } else {
            weight
        };
        self.weights.insert(id, weight);
    }

    pub fn weight(&self, id: &CandidateId) -> f64 {
        self.weights.get(id).copied().unwrap_or(0.0)
    }
}

impl Default for DominantWeightScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateScorer for DominantWeightScorer {
    fn name(&self) -> &'static str {
        "dominant_weight"
    }

    fn best(
        &mut self,
        eligible: &[&dyn Candidate],
        _previous_live: Option<&CandidateId>,
        _now: f64,
    ) -> Option<CandidateId> {
        let mut best: Option<(&CandidateId, f64)> = None;
        for candidate in eligible {
            let weight = self.weight(candidate.id());
            if weight <= self.epsilon {
                continue;
            }
            match best {
                Some((_, current)) if weight <= current => {}
                _ => best = Some((candidate.id(), weight)),
            }
        }
        best.map(|(id, _)| id.clone())
    }
}
