//! Notifications emitted when the live camera changes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{BlendId, CandidateId};

/// Live-camera transition notifications.
///
/// Each is emitted at most once per occurrence. Listeners are optional and
/// never influence the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraEvent {
    /// A candidate became live
    CameraActivated {
        incoming: CandidateId,
        outgoing: Option<CandidateId>,
    },
    /// A candidate stopped being live
    CameraDeactivated { candidate: CandidateId },
    /// The live candidate changed without a blend
    CameraCut {
        incoming: CandidateId,
        outgoing: Option<CandidateId>,
    },
    /// A blend started
    ///
    /// `outgoing` is the previously live candidate. When `interrupted` is set
    /// the blend starts from a snapshot of the interrupted blend's output,
    /// not from `outgoing` itself.
    BlendCreated {
        blend: BlendId,
        outgoing: Option<CandidateId>,
        incoming: CandidateId,
        duration: f64,
        #[serde(default)]
        interrupted: bool,
    },
    /// A blend reached its incoming candidate
    BlendFinished {
        blend: BlendId,
        incoming: CandidateId,
    },
}

impl CameraEvent {
    /// Event name used for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraEvent::CameraActivated { .. } => "camera_activated",
            CameraEvent::CameraDeactivated { .. } => "camera_deactivated",
            CameraEvent::CameraCut { .. } => "camera_cut",
            CameraEvent::BlendCreated { .. } => "blend_created",
            CameraEvent::BlendFinished { .. } => "blend_finished",
        }
    }
}
