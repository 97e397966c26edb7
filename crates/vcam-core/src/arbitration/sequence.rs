//! Timed instruction lists.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scoring::highest_priority;
use super::CandidateScorer;
use crate::blend::{BlendTable, BlendTableEntry};
use crate::candidate::Candidate;
use crate::error::{CameraError, CameraResult};
use vcam_models::{BlendDefinition, CandidateId};

/// Hold one candidate for a fixed time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceInstruction {
    pub candidate: CandidateId,
    /// Seconds this instruction stays current
    pub hold: f64,
    /// Blend into this instruction's candidate from the previous one
    #[serde(default)]
    pub blend: Option<BlendDefinition>,
}

impl SequenceInstruction {
    pub fn new(candidate: impl Into<CandidateId>, hold: f64) -> Self {
        Self {
            candidate: candidate.into(),
            hold,
            blend: None,
        }
    }

    pub fn with_blend(mut self, blend: BlendDefinition) -> Self {
        self.blend = Some(blend);
        self
    }
}

/// Walks an instruction list on the arbitration clock.
///
/// The clock starts the first time the scorer is asked for a candidate.
/// Past the end of a non-looping list the last instruction stays current.
#[derive(Debug, Clone)]
pub struct SequenceScorer {
    instructions: Vec<SequenceInstruction>,
    looped: bool,
    started_at: Option<f64>,
    current: Option<usize>,
}

impl SequenceScorer {
    pub fn new(instructions: Vec<SequenceInstruction>, looped: bool) -> CameraResult<Self> {
        if instructions.iter().any(|i| !i.hold.is_finite()) {
            return Err(CameraError::invalid_instructions(
                "sequence hold times must be finite",
            ));
        }
        if instructions.iter().all(|i| i.hold <= 0.0) {
            return Err(CameraError::invalid_instructions(
                "sequence needs at least one instruction with a positive hold",
            ));
        }
        Ok(Self {
            instructions,
            looped,
            started_at: None,
            current: None,
        })
    }

    /// Restart the sequence on the next arbitration pass.
    pub fn restart(&mut self) {
        self.started_at = None;
        self.current = None;
    }

    /// Index of the instruction current at the last pass.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn instructions(&self) -> &[SequenceInstruction] {
        &self.instructions
    }

    /// Blends between consecutive instructions, including the wrap-around
    /// of a looping list.
    pub fn blend_table(&self) -> BlendTable {
        let playable: Vec<&SequenceInstruction> =
            self.instructions.iter().filter(|i| i.hold > 0.0).collect();
        let mut entries = Vec::new();
        for (index, instruction) in playable.iter().enumerate() {
            let Some(blend) = &instruction.blend else {
                continue;
            };
            let previous = if index > 0 {
                Some(playable[index - 1])
            } else if self.looped && playable.len() > 1 {
                playable.last().copied()
            } else {
                None
            };
            if let Some(previous) = previous {
                entries.push(BlendTableEntry::new(
                    previous.candidate.as_str(),
                    instruction.candidate.as_str(),
                    blend.clone(),
                ));
            }
        }
        BlendTable::new(entries)
    }

    fn index_at(&self, elapsed: f64) -> usize {
        let total: f64 = self
            .instructions
            .iter()
            .filter(|i| i.hold > 0.0)
            .map(|i| i.hold)
            .sum();
        let mut clock = if self.looped {
            elapsed.rem_euclid(total)
        } else {
            elapsed
        };

        let mut last = 0;
        for (index, instruction) in self.instructions.iter().enumerate() {
            if instruction.hold <= 0.0 {
                continue;
            }
            if clock < instruction.hold {
                return index;
            }
            clock -= instruction.hold;
            last = index;
        }
        last
    }
}

impl CandidateScorer for SequenceScorer {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn best(
        &mut self,
        eligible: &[&dyn Candidate],
        _previous_live: Option<&CandidateId>,
        now: f64,
    ) -> Option<CandidateId> {
        let started_at = *self.started_at.get_or_insert(now);
        let index = self.index_at((now - started_at).max(0.0));
        if self.current != Some(index) {
            debug!(
                index,
                candidate = %self.instructions[index].candidate,
                "Sequence advanced"
            );
            self.current = Some(index);
        }

        let wanted = &self.instructions[index].candidate;
        if eligible.iter().any(|c| c.id() == wanted) {
            Some(wanted.clone())
        } else {
            highest_priority(eligible).map(|c| c.id().clone())
        }
    }

    fn reset(&mut self) {
        self.restart();
    }
}
