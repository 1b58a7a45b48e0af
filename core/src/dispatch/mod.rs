//! Ability dispatch.
//!
//! A slot press becomes an immutable [`PackagedAbility`] which is offered to
//! each registered [`AbilityHandler`] in registration order:
//!
//! ```text
//!   slot press ──► PackagedAbility ──► handler[0] ──► handler[1] ──► ...
//!                                         │ Ok(true)      │ Ok(false) / Err / panic
//!                                         ▼               ▼
//!                                      Handled         next handler
//! ```
//!
//! A handler that errors or panics is reported to the player and skipped.

mod handlers;

pub use handlers::{AbilityEffect, ChargedEffectHandler, CommandHandler, RootInteractionHandler};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::NaiveDateTime;

use crate::error::HandlerError;
use crate::host::Host;
use crate::player::{PlayerId, PlayerState};

// ─────────────────────────────────────────────────────────────────────────────
// Packaged ability
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of one slot taken when the press is dispatched.
///
/// Handlers read this instead of the live slot; counters here do not move
/// when the handler spends a use.
#[derive(Debug, Clone, PartialEq)]
pub struct PackagedAbility {
    /// 0-based
    pub slot_index: usize,
    /// Resolved id of the held item
    pub item_key: String,
    pub ability_id: String,
    pub key: String,
    pub max_uses: i32,
    pub remaining_uses: i32,
    /// Slot multiplier times the player's global multiplier
    pub power_multiplier: f32,
    pub ability_value: i32,
    pub root_interaction: String,
    pub consume: bool,
    pub plugin: bool,
}

impl PackagedAbility {
    /// Package a 0-based slot. Returns `None` for empty or out-of-range slots.
    pub fn from_state(state: &PlayerState, slot_index: usize) -> Option<Self> {
        let slot = state.slot(slot_index)?;
        if slot.is_empty() {
            return None;
        }
        Some(Self {
            slot_index,
            item_key: state.item_id.clone().unwrap_or_default(),
            ability_id: slot.spec.ability_id.clone(),
            key: slot.spec.key.clone(),
            max_uses: slot.max_uses,
            remaining_uses: slot.remaining_uses,
            power_multiplier: slot.spec.power_multiplier * state.power_multiplier(),
            ability_value: slot.spec.ability_value,
            root_interaction: slot.spec.root_interaction.clone(),
            consume: slot.spec.consume,
            plugin: slot.spec.plugin,
        })
    }

    /// 1-based slot number as players see it.
    pub fn slot_number(&self) -> u8 {
        self.slot_index as u8 + 1
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handler interface
// ─────────────────────────────────────────────────────────────────────────────

/// Live context handed to a handler on the world thread.
pub struct HandlerContext<'a> {
    pub player: PlayerId,
    pub state: &'a mut PlayerState,
    pub host: &'a dyn Host,
    pub now: NaiveDateTime,
}

/// One link of the dispatch chain.
pub trait AbilityHandler: Send + Sync {
    /// Name shown to players when this handler fails
    fn name(&self) -> &str;

    /// Returns `Ok(true)` if the press was handled and the chain should stop.
    fn handle_ability(
        &self,
        ability: &PackagedAbility,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<bool, HandlerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled { by: String },
    NotHandled,
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, fault-isolated handler chain.
pub struct AbilityDispatcher {
    handlers: Vec<Box<dyn AbilityHandler>>,
    error_details: bool,
}

impl Default for AbilityDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl AbilityDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            error_details: false,
        }
    }

    /// Append a handler. Handlers are tried in the order they were registered.
    pub fn register(&mut self, handler: impl AbilityHandler + 'static) -> &mut Self {
        tracing::debug!(handler = handler.name(), "Registered ability handler");
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn with_handler(mut self, handler: impl AbilityHandler + 'static) -> Self {
        self.register(handler);
        self
    }

    /// Whether the player's failure line carries the error text after the tag.
    pub fn set_error_details(&mut self, details: bool) {
        self.error_details = details;
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, ability: &PackagedAbility, ctx: &mut HandlerContext<'_>) -> DispatchOutcome {
        for handler in &self.handlers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle_ability(ability, ctx)))
                .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))));

            match result {
                Ok(true) => {
                    tracing::debug!(
                        player = %ctx.player,
                        slot = ability.slot_number(),
                        ability = %ability.ability_id,
                        handler = handler.name(),
                        "Ability handled"
                    );
                    return DispatchOutcome::Handled {
                        by: handler.name().to_string(),
                    };
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        player = %ctx.player,
                        ability = %ability.ability_id,
                        handler = handler.name(),
                        error = %e,
                        "Ability handler failed"
                    );
                    let line = if self.error_details {
                        format!("[{}] {}: {}", handler.name(), e.tag(), e)
                    } else {
                        format!("[{}] {}", handler.name(), e.tag())
                    };
                    ctx.host.send_message(ctx.player, &line);
                }
            }
        }
        DispatchOutcome::NotHandled
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
