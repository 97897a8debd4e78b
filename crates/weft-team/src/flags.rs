//! Per-team control flags.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Control bits consumed by the scheduler each tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TeamFlags: u32 {
        /// Slot holds a live team.
        const VALID = 1 << 0;
        /// Restore particles to the current base pose next tick.
        const RESET = 1 << 1;
        /// Restart the team's simulation clock next tick.
        const TIME_RESET = 1 << 2;
        /// Treat accumulated root motion as a teleport, keeping the simulated pose.
        const KEEP_TELEPORT = 1 << 3;
        /// Keep simulating while camera-culled.
        const CAMERA_CULLING_KEEP = 1 << 4;
        /// Do not write results back to transforms or meshes.
        const SKIP_WRITING = 1 << 5;
    }
}

impl Default for TeamFlags {
    fn default() -> Self {
        TeamFlags::empty()
    }
}
