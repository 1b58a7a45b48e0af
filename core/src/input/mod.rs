//! Client input classification.
//!
//! Packets arrive on the I/O thread and are filtered by [`PacketGate`], which
//! only reads. Accepted packets are queued and replayed on the world thread
//! through [`InputBridge`], which owns every state transition:
//!
//! ```text
//!   I/O thread                        world thread
//!   ──────────                        ────────────
//!   packet ─► PacketGate ─(consume)─► queue ─► InputBridge ─► PlayerState
//!                 │                                  │
//!                 └─(pass)─► host input             └─► dispatch slot N
//! ```

mod bridge;
mod gate;

pub use bridge::InputBridge;
pub(crate) use bridge::close_bar;
pub use gate::{EnabledFlags, PacketGate, QueuedInput};

use chrono::NaiveDateTime;

use crate::dispatch::DispatchOutcome;

/// Inventory section targeted by a slot-select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventorySection {
    Hotbar,
    Storage,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// The client pressed the weapon-ability key
    AbilityToggle {
        item_id: Option<String>,
        received_at: NaiveDateTime,
    },
    /// The client switched its active slot (0-based)
    SlotSelect {
        slot: u8,
        section: InventorySection,
        received_at: NaiveDateTime,
    },
}

impl InputEvent {
    pub fn received_at(&self) -> NaiveDateTime {
        match self {
            Self::AbilityToggle { received_at, .. } | Self::SlotSelect { received_at, .. } => {
                *received_at
            }
        }
    }
}

/// What to do with an input packet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputDecision {
    /// `false` forwards the packet to the host's own input handling
    pub consumed: bool,
    /// 1-based slot to dispatch
    pub dispatch: Option<u8>,
    /// Filled in by the engine once the slot has been dispatched
    pub outcome: Option<DispatchOutcome>,
}

impl InputDecision {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn consume() -> Self {
        Self {
            consumed: true,
            ..Default::default()
        }
    }

    pub fn dispatch(slot: u8) -> Self {
        Self {
            consumed: true,
            dispatch: Some(slot),
            outcome: None,
        }
    }

    pub fn is_handled(&self) -> bool {
        self.outcome.as_ref().is_some_and(DispatchOutcome::is_handled)
    }
}
