//! Engine facade.
//!
//! Owns the definition store, every player's state, the input bridge and the
//! dispatcher, and exposes the operations a host calls on its world thread.
//! Packet filtering on the I/O thread goes through a [`PacketGate`] obtained
//! from [`Engine::packet_gate`].

use std::sync::Arc;

use chrono::NaiveDateTime;
use hotbar_types::EngineConfig;
use hotbar_types::formatting::{format_cooldown, format_multiplier, format_ratio, format_uses};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::EngineConfigExt;
use crate::definitions::DefinitionStore;
use crate::dispatch::{AbilityDispatcher, DispatchOutcome, HandlerContext, PackagedAbility};
use crate::host::Host;
use crate::input::{EnabledFlags, InputBridge, InputDecision, InputEvent, PacketGate, QueuedInput};
use crate::input::close_bar;
use crate::player::{PlayerId, PlayerRegistry, PlayerState, economy};

pub struct Engine {
    store: Arc<DefinitionStore>,
    dispatcher: AbilityDispatcher,
    bridge: InputBridge,
    players: PlayerRegistry,
    enabled: Arc<EnabledFlags>,
    queue_tx: UnboundedSender<QueuedInput>,
    queue_rx: UnboundedReceiver<QueuedInput>,
}

impl Engine {
    /// Build an engine around a fully loaded store.
    ///
    /// Contributions must be registered before this point; the store is
    /// read-only from here on.
    pub fn new(store: Arc<DefinitionStore>, mut dispatcher: AbilityDispatcher, config: &EngineConfig) -> Self {
        dispatcher.set_error_details(config.show_error_details);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();

        tracing::info!(
            handlers = ?dispatcher.handler_names(),
            suppress_window_ms = config.suppress_window_ms,
            "Engine ready"
        );

        Self {
            store,
            dispatcher,
            bridge: InputBridge::new(config.suppress_window()),
            players: PlayerRegistry::new(),
            enabled: Arc::new(EnabledFlags::new()),
            queue_tx,
            queue_rx,
        }
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &AbilityDispatcher {
        &self.dispatcher
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────────────────

    /// Classify and apply one input packet, dispatching the selected slot if
    /// the bridge asks for it.
    pub fn handle_input(&mut self, player: PlayerId, event: InputEvent, host: &dyn Host) -> InputDecision {
        let now = event.received_at();
        let state = self.players.get_or_create(player);
        let mut decision = self.bridge.handle(player, state, &self.store, host, &event);
        self.enabled.set(player, state.enabled);

        if let Some(slot) = decision.dispatch {
            decision.outcome = Some(dispatch_slot(&self.dispatcher, player, state, host, slot, now));
        }
        decision
    }

    /// Same as an ability-key press with the currently held item.
    pub fn toggle_bar(&mut self, player: PlayerId, host: &dyn Host, now: NaiveDateTime) -> InputDecision {
        let event = InputEvent::AbilityToggle {
            item_id: host.held_item(player).map(|stack| stack.item_id),
            received_at: now,
        };
        self.handle_input(player, event, host)
    }

    /// Re-read slots after the held item changed. Losing the weapon closes
    /// the bar; swapping weapons keeps it open on the new bar.
    pub fn held_item_changed(&mut self, player: PlayerId, host: &dyn Host) {
        let state = self.players.get_or_create(player);
        let held = host.held_item(player).map(|stack| stack.item_id);
        state.refresh_from_held_item(&self.store, held.as_deref());

        if state.enabled {
            if state.has_bar() {
                host.set_custom_hud(player, Some(&state.ability_bar));
            } else {
                close_bar(player, state, host);
            }
        }
        self.enabled.set(player, state.enabled);
    }

    /// Advance recharge and expire stale suppression markers for every
    /// player. Returns the number of uses granted.
    pub fn tick(&mut self, now: NaiveDateTime) -> i32 {
        let mut granted = 0;
        for (_, state) in self.players.iter_mut() {
            granted += economy::advance_all(&mut state.slots, now);
            if state.suppress.is_some_and(|marker| !marker.is_live(now)) {
                state.suppress = None;
            }
        }
        granted
    }

    // ─────────────────────────────────────────────────────────────────────────
    // I/O thread hand-off
    // ─────────────────────────────────────────────────────────────────────────

    pub fn packet_gate(&self) -> PacketGate {
        PacketGate::new(
            Arc::clone(&self.store),
            Arc::clone(&self.enabled),
            self.queue_tx.clone(),
        )
    }

    /// Apply every packet queued by the gate, in arrival order.
    ///
    /// Returns the number of packets processed.
    pub fn run_pending(&mut self, host: &dyn Host) -> usize {
        let mut processed = 0;
        while let Ok(QueuedInput { player, event }) = self.queue_rx.try_recv() {
            let requested = match &event {
                InputEvent::SlotSelect { slot, .. } => Some(*slot),
                InputEvent::AbilityToggle { .. } => None,
            };

            let decision = self.handle_input(player, event, host);
            if !decision.consumed {
                if let Some(slot) = requested {
                    // The gate swallowed the packet, so apply it ourselves
                    host.set_active_hotbar_slot(player, slot);
                }
            }
            processed += 1;
        }
        if processed > 0 {
            tracing::trace!(processed, "Drained world queue");
        }
        processed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State access
    // ─────────────────────────────────────────────────────────────────────────

    pub fn state(&self, player: PlayerId) -> Option<&PlayerState> {
        self.players.get(player)
    }

    /// Mutable state for `player`, created if missing.
    ///
    /// Changes to `enabled` made here reach the packet gate on the next
    /// engine call for this player.
    pub fn state_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        self.players.get_or_create(player)
    }

    /// Forget a disconnected player.
    pub fn remove_player(&mut self, player: PlayerId) {
        self.players.remove(player);
        self.enabled.set(player, false);
    }

    /// Human-readable dump of the player's bar and all nine slots.
    pub fn debug_lines(&mut self, player: PlayerId, now: NaiveDateTime) -> Vec<String> {
        let state = self.players.get_or_create(player);
        economy::advance_all(&mut state.slots, now);

        let mut lines = Vec::with_capacity(state.slots.len() + 1);
        lines.push(format!(
            "Bar {} ({}) enabled={} selected={} power={}",
            state.item_id.as_deref().unwrap_or("-"),
            if state.has_bar() { state.ability_bar.as_str() } else { "no hud" },
            state.enabled,
            state.selected_slot(),
            format_multiplier(state.power_multiplier()),
        ));

        for (i, slot) in state.slots.iter().enumerate() {
            if slot.is_empty() {
                lines.push(format!("[{}] -", i + 1));
                continue;
            }
            let mut line = format!(
                "[{}] {} uses={} cd={} ({}) power={}",
                i + 1,
                slot.ability_id(),
                format_uses(slot.remaining_uses, slot.max_uses),
                format_cooldown(economy::cooldown_remaining_secs(slot, now)),
                format_ratio(economy::cooldown_ratio(slot, now)),
                format_multiplier(slot.spec.power_multiplier),
            );
            if !slot.flags.is_empty() {
                let mut flags: Vec<&str> = slot.flags.iter().map(String::as_str).collect();
                flags.sort_unstable();
                line.push_str(&format!(" flags={}", flags.join(",")));
            }
            lines.push(line);
        }
        lines
    }
}

/// Package and dispatch a 1-based slot against the live state.
fn dispatch_slot(
    dispatcher: &AbilityDispatcher,
    player: PlayerId,
    state: &mut PlayerState,
    host: &dyn Host,
    slot: u8,
    now: NaiveDateTime,
) -> DispatchOutcome {
    economy::advance_all(&mut state.slots, now);

    let Some(index) = usize::from(slot).checked_sub(1) else {
        return DispatchOutcome::NotHandled;
    };
    let Some(ability) = PackagedAbility::from_state(state, index) else {
        tracing::debug!(%player, slot, "Pressed an empty slot");
        return DispatchOutcome::NotHandled;
    };

    let mut ctx = HandlerContext {
        player,
        state,
        host,
        now,
    };
    dispatcher.dispatch(&ability, &mut ctx)
}
