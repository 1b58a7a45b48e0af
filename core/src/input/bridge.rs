use chrono::{Duration, NaiveDateTime};
use hotbar_types::SLOT_COUNT;

use super::{InputDecision, InputEvent, InventorySection};
use crate::definitions::DefinitionStore;
use crate::host::Host;
use crate::player::{PlayerId, PlayerState};

/// World-thread state machine for toggle and slot-select packets.
#[derive(Debug, Clone, Copy)]
pub struct InputBridge {
    suppress_window: Duration,
}

impl Default for InputBridge {
    fn default() -> Self {
        Self::new(Duration::milliseconds(250))
    }
}

impl InputBridge {
    pub fn new(suppress_window: Duration) -> Self {
        Self { suppress_window }
    }

    pub fn suppress_window(&self) -> Duration {
        self.suppress_window
    }

    pub fn handle(
        &self,
        player: PlayerId,
        state: &mut PlayerState,
        store: &DefinitionStore,
        host: &dyn Host,
        event: &InputEvent,
    ) -> InputDecision {
        match event {
            InputEvent::AbilityToggle { item_id, .. } => {
                self.on_toggle(player, state, store, host, item_id.as_deref())
            }
            InputEvent::SlotSelect {
                slot,
                section,
                received_at,
            } => self.on_slot_select(player, state, store, host, *slot, *section, *received_at),
        }
    }

    /// Ability-key press while holding `item_id`.
    ///
    /// Falls back to the host's held item when the packet carries no id.
    /// Unregistered items pass through untouched.
    pub fn on_toggle(
        &self,
        player: PlayerId,
        state: &mut PlayerState,
        store: &DefinitionStore,
        host: &dyn Host,
        item_id: Option<&str>,
    ) -> InputDecision {
        let held = match item_id {
            Some(id) => Some(id.to_string()),
            None => host.held_item(player).map(|stack| stack.item_id),
        };
        let Some(held) = held.filter(|id| store.is_registered(id)) else {
            return InputDecision::pass();
        };

        state.refresh_from_held_item(store, Some(&held));
        state.enabled = !state.enabled && state.has_bar();
        state.suppress = None;

        if state.enabled {
            host.set_custom_hud(player, Some(&state.ability_bar));
        } else {
            host.set_custom_hud(player, None);
        }
        tracing::info!(%player, item = %held, enabled = state.enabled, "Ability bar toggled");
        InputDecision::consume()
    }

    /// Hotbar slot change (0-based `slot`).
    pub fn on_slot_select(
        &self,
        player: PlayerId,
        state: &mut PlayerState,
        store: &DefinitionStore,
        host: &dyn Host,
        slot: u8,
        section: InventorySection,
        now: NaiveDateTime,
    ) -> InputDecision {
        if !state.enabled || section != InventorySection::Hotbar || slot as usize >= SLOT_COUNT {
            return InputDecision::pass();
        }

        if state.take_suppressed(slot, now) {
            tracing::trace!(%player, slot, "Swallowed slot-select echo");
            return InputDecision::consume();
        }

        let holds_weapon = host
            .held_item(player)
            .is_some_and(|stack| store.is_registered(&stack.item_id));
        if !holds_weapon {
            tracing::debug!(%player, "Weapon no longer held, closing bar");
            close_bar(player, state, host);
            return InputDecision::pass();
        }

        let current = host.active_hotbar_slot(player);
        state.suppress_next(current, now + self.suppress_window);
        host.set_active_hotbar_slot(player, current);

        let selected = slot + 1;
        state.set_selected_slot(selected);
        InputDecision::dispatch(selected)
    }
}

/// Force the bar closed and drop its HUD.
pub(crate) fn close_bar(player: PlayerId, state: &mut PlayerState, host: &dyn Host) {
    if state.enabled {
        state.enabled = false;
        host.set_custom_hud(player, None);
    }
    state.suppress = None;
}
