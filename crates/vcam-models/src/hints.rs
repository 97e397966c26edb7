//! Blend hints attached to a camera state.

use bitflags::bitflags;

bitflags! {
    /// Flags changing how a specific state takes part in a blend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
    pub struct BlendHints: u32 {
        /// Do not blend or apply the position channel of this state
        const NO_POSITION = 1 << 0;
        /// Do not blend or apply the orientation channel of this state
        const NO_ORIENTATION = 1 << 1;
        /// Do not blend or apply the lens of this state
        const NO_LENS = 1 << 2;
        /// Resolve any blend touching this state immediately
        const HARD_CUT = 1 << 3;
        /// Blend without regard to the look-at target
        const IGNORE_LOOK_AT = 1 << 4;
        /// Blend position around the look-at pivot instead of linearly
        const SPHERICAL_POSITION = 1 << 5;
        /// Start from the outgoing camera's pose when becoming live
        const INHERIT_POSITION = 1 << 6;

        /// Neither position nor orientation is applied
        const NO_TRANSFORM = Self::NO_POSITION.bits() | Self::NO_ORIENTATION.bits();
    }
}

impl BlendHints {
    /// Hints carried by the placeholder state published when nothing is live.
    pub const NEUTRAL: BlendHints = BlendHints::NO_TRANSFORM.union(BlendHints::NO_LENS);
}
