#![deny(unreachable_patterns)]
//! Candidate arbitration and blending core for virtual cameras.
//!
//! This crate provides:
//! - Stage-ordered composition of a candidate's camera state
//! - Live-candidate arbitration with pluggable scoring and hysteresis
//! - Time-based blending between camera states, with interruption
//! - N-way weighted mixing
//! - A per-frame orchestrator that publishes the final state to a sink

pub mod arbitration;
pub mod blend;
pub mod candidate;
pub mod composer;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod sink;

pub use arbitration::{
    default_scorer, ArbitrationEngine, CandidateScorer, DominantWeightScorer, HysteresisTiming,
    PriorityScorer, QualityScorer, Selection, SequenceInstruction, SequenceScorer,
    StateInstruction, StateTableScorer,
};
pub use blend::{
    lerp_states, Advanced, BlendEndpoint, BlendEngine, BlendLookup, BlendStart, BlendState,
    BlendTable, BlendTableEntry, MixOutput, Transition, WeightedMixer, ANY_CAMERA,
};
pub use candidate::{Candidate, PreviousLive, StateLookup, StaticCandidate, ALL_CHANNELS};
pub use composer::{CameraExtension, ComposedCandidate, Stage, StageComponent, StageComposer};
pub use config::{ArbitrationConfig, OrchestratorConfig, ScoringMode, UpdateMethod, UpdatePhase};
pub use error::{CameraError, CameraResult};
pub use events::{CameraEventListener, EventHub};
pub use orchestrator::{FrameTick, Orchestrator, OrchestratorStatus};
pub use sink::{NullSink, OutputSink};

// Model re-exports so downstream crates need only one import path
pub use vcam_models::{
    BlendCurve, BlendDefinition, BlendHints, BlendId, CameraEvent, CameraState, CandidateId,
    CurveKey, CustomBlendable, LensMode, LensParameters, PhysicalLens,
};
