//! Per-player bar state and the charge economy over it.

pub mod economy;
mod registry;
mod state;

pub use registry::PlayerRegistry;
pub use state::{PlayerState, SlotState, SuppressMarker, Uses};

use std::fmt;

/// Stable identity of a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}
