//! Per-transition blend overrides.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CameraError, CameraResult};
use vcam_models::{BlendDefinition, CandidateId};

/// Wildcard matching any candidate on either side of a table entry.
pub const ANY_CAMERA: &str = "**ANY CAMERA**";

/// Supplies the blend for a transition, if it has an opinion.
pub trait BlendLookup {
    /// Blend for `from -> to`. `from` is `None` when nothing was live.
    fn blend_for(&self, from: Option<&CandidateId>, to: &CandidateId) -> Option<BlendDefinition>;

    /// Blend for `from -> to`, falling back to `default`.
    fn resolve(
        &self,
        from: Option<&CandidateId>,
        to: &CandidateId,
        default: &BlendDefinition,
    ) -> BlendDefinition {
        self.blend_for(from, to)
            .unwrap_or_else(|| default.clone())
    }
}

impl<F> BlendLookup for F
where
    F: Fn(Option<&CandidateId>, &CandidateId) -> Option<BlendDefinition>,
{
    fn blend_for(&self, from: Option<&CandidateId>, to: &CandidateId) -> Option<BlendDefinition> {
        self(from, to)
    }
}

/// One `from -> to` override. Either side may be `ANY_CAMERA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendTableEntry {
    pub from: String,
    pub to: String,
    pub blend: BlendDefinition,
}

impl BlendTableEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>, blend: BlendDefinition) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            blend,
        }
    }
}

/// Table of blend overrides.
///
/// Lookup prefers an exact `from -> to` entry, then `ANY -> to`, then
/// `from -> ANY`. Within each tier the first matching entry wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlendTable {
    #[serde(default)]
    pub custom_blends: Vec<BlendTableEntry>,
}

impl BlendTable {
    pub fn new(custom_blends: Vec<BlendTableEntry>) -> Self {
        Self { custom_blends }
    }

    /// Parse and validate a table of the form `{"custom_blends": [...]}`.
    pub fn from_json(json: &str) -> CameraResult<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn push(&mut self, entry: BlendTableEntry) {
        self.custom_blends.push(entry);
    }

    pub fn len(&self) -> usize {
        self.custom_blends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom_blends.is_empty()
    }

    /// Reject entries with empty names or unusable durations.
    pub fn validate(&self) -> CameraResult<()> {
        for (index, entry) in self.custom_blends.iter().enumerate() {
            if entry.from.is_empty() || entry.to.is_empty() {
                return Err(CameraError::invalid_blend_table(format!(
                    "entry {} has an empty camera name",
                    index
                )));
            }
            if entry.blend.duration.is_nan() {
                return Err(CameraError::invalid_blend_table(format!(
                    "entry {} ({} -> {}) has a NaN duration",
                    index, entry.from, entry.to
                )));
            }
        }
        Ok(())
    }

    fn find(&self, from: &str, to: &str) -> Option<&BlendTableEntry> {
        self.custom_blends
            .iter()
            .find(|entry| entry.from == from && entry.to == to)
    }
}

impl BlendLookup for BlendTable {
    fn blend_for(&self, from: Option<&CandidateId>, to: &CandidateId) -> Option<BlendDefinition> {
        let to = to.as_str();
        let entry = match from.map(CandidateId::as_str) {
            Some(from) => self
                .find(from, to)
                .or_else(|| self.find(ANY_CAMERA, to))
                .or_else(|| self.find(from, ANY_CAMERA)),
            None => self.find(ANY_CAMERA, to),
        }?;
        trace!(from = %entry.from, to = %entry.to, "Blend table match");
        Some(entry.blend.clone())
    }
}
