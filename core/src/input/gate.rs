use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashSet;
use hotbar_types::SLOT_COUNT;
use tokio::sync::mpsc::UnboundedSender;

use super::{InputEvent, InventorySection};
use crate::definitions::DefinitionStore;
use crate::player::PlayerId;

/// Players whose bar is open, mirrored from the world thread for readers on
/// the I/O thread.
#[derive(Debug, Default)]
pub struct EnabledFlags {
    players: RwLock<HashSet<PlayerId>>,
}

impl EnabledFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, player: PlayerId) -> bool {
        self.players
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&player)
    }

    pub(crate) fn set(&self, player: PlayerId, enabled: bool) {
        let mut players = self.players.write().unwrap_or_else(PoisonError::into_inner);
        if enabled {
            players.insert(player);
        } else {
            players.remove(&player);
        }
    }
}

/// An accepted packet waiting for the world thread.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedInput {
    pub player: PlayerId,
    pub event: InputEvent,
}

/// Read-only packet filter for the I/O thread.
///
/// Decides consume-or-pass from the definition store and the enabled flags,
/// then queues consumed packets for [`crate::Engine::run_pending`]. Never
/// touches player state.
#[derive(Debug, Clone)]
pub struct PacketGate {
    store: Arc<DefinitionStore>,
    enabled: Arc<EnabledFlags>,
    tx: UnboundedSender<QueuedInput>,
}

impl PacketGate {
    pub(crate) fn new(
        store: Arc<DefinitionStore>,
        enabled: Arc<EnabledFlags>,
        tx: UnboundedSender<QueuedInput>,
    ) -> Self {
        Self { store, enabled, tx }
    }

    /// Returns `true` if the packet was consumed and must not reach the
    /// host's own input handling.
    pub fn filter(&self, player: PlayerId, event: InputEvent) -> bool {
        let consume = match &event {
            InputEvent::AbilityToggle { item_id, .. } => item_id
                .as_deref()
                .is_some_and(|id| self.store.is_registered(id)),
            InputEvent::SlotSelect { slot, section, .. } => {
                *section == InventorySection::Hotbar
                    && (*slot as usize) < SLOT_COUNT
                    && self.enabled.is_enabled(player)
            }
        };
        if !consume {
            return false;
        }

        if let Err(e) = self.tx.send(QueuedInput { player, event }) {
            // World queue is gone; let the host handle the packet
            tracing::warn!(%player, error = %e, "World queue closed, passing packet through");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::MemorySource;
    use crate::test_support::t0;
    use tokio::sync::mpsc;

    fn gate() -> (PacketGate, Arc<EnabledFlags>, mpsc::UnboundedReceiver<QueuedInput>) {
        let source = MemorySource::new("base")
            .with("index.json", r#"{ "Weapons": ["staff.json"] }"#)
            .with(
                "staff.json",
                r#"{ "ItemId": "Staff", "AbilityBar": "Hud/Staff.ui",
                     "AbilitySlots": [ { "ID": "Bolt" } ] }"#,
            );
        let mut store = DefinitionStore::new();
        store.load("index.json", &source);

        let flags = Arc::new(EnabledFlags::new());
        let (tx, rx) = mpsc::unbounded_channel();
        (PacketGate::new(Arc::new(store), Arc::clone(&flags), tx), flags, rx)
    }

    #[test]
    fn test_toggle_consumed_only_for_registered_items() {
        let (gate, _flags, mut rx) = gate();
        let toggle = |id: Option<&str>| InputEvent::AbilityToggle {
            item_id: id.map(str::to_string),
            received_at: t0(),
        };

        assert!(!gate.filter(PlayerId(1), toggle(Some("Stick"))));
        assert!(!gate.filter(PlayerId(1), toggle(None)));
        assert!(rx.try_recv().is_err());

        assert!(gate.filter(PlayerId(1), toggle(Some("Items/Staff.json"))));
        assert_eq!(rx.try_recv().unwrap().player, PlayerId(1));
    }

    #[test]
    fn test_slot_select_passes_for_disabled_players() {
        let (gate, flags, mut rx) = gate();
        let select = InputEvent::SlotSelect {
            slot: 4,
            section: InventorySection::Hotbar,
            received_at: t0(),
        };

        assert!(!gate.filter(PlayerId(1), select.clone()));
        assert!(rx.try_recv().is_err());

        flags.set(PlayerId(1), true);
        assert!(gate.filter(PlayerId(1), select.clone()));
        assert!(!gate.filter(PlayerId(2), select));
        assert_eq!(rx.try_recv().unwrap().player, PlayerId(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_queue_passes_through() {
        let (gate, _flags, rx) = gate();
        drop(rx);
        let toggle = InputEvent::AbilityToggle {
            item_id: Some("Staff".into()),
            received_at: t0(),
        };
        assert!(!gate.filter(PlayerId(1), toggle));
    }

    #[test]
    fn test_gate_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<PacketGate>();
    }
}
