//! Shared data models for the virtual camera core.
//!
//! This crate provides Serde-serializable types for:
//! - Resolved camera states and lens parameters
//! - Blend hints, curves and blend definitions
//! - Candidate and blend identifiers
//! - Notification events emitted on live camera transitions

pub mod curve;
pub mod event;
pub mod hints;
pub mod ids;
pub mod lens;
pub mod state;

// Re-export common types
pub use curve::{BlendCurve, BlendDefinition, CurveKey};
pub use event::CameraEvent;
pub use hints::BlendHints;
pub use ids::{BlendId, CandidateId};
pub use lens::{LensMode, LensParameters, PhysicalLens};
pub use state::{CameraState, CustomBlendable};

/// Re-exported math types used throughout the camera model.
pub use glam::{DQuat, DVec2, DVec3};
