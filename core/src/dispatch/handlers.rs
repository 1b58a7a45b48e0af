//! Built-in handlers: charged plugin effects, root interactions and
//! command-line abilities.

use std::sync::Arc;

use hashbrown::HashMap;

use super::{AbilityHandler, HandlerContext, PackagedAbility};
use crate::error::HandlerError;
use crate::host::CommandExecutor;
use crate::player::{PlayerState, economy};

const COMMAND_PREFIX: &str = "command:";

/// A concrete effect run by [`ChargedEffectHandler`].
pub trait AbilityEffect: Send + Sync {
    fn apply(&self, ability: &PackagedAbility, ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError>;
}

struct FnEffect<F>(F);

impl<F> AbilityEffect for FnEffect<F>
where
    F: Fn(&PackagedAbility, &mut HandlerContext<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    fn apply(&self, ability: &PackagedAbility, ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
        (self.0)(ability, ctx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared charge bookkeeping
// ─────────────────────────────────────────────────────────────────────────────

/// Slot whose charge pays for this press.
///
/// The packaged slot when it still carries the ability, otherwise the first
/// slot with a matching id.
fn charge_slot(state: &PlayerState, ability: &PackagedAbility) -> Option<usize> {
    match state.slot(ability.slot_index) {
        Some(slot) if slot.ability_id().eq_ignore_ascii_case(&ability.ability_id) => {
            Some(ability.slot_index)
        }
        _ => economy::find_slot_by_ability_id(&state.slots, &ability.ability_id),
    }
}

/// Spend one use for the press. `None` means the press must not fire.
fn spend(ctx: &mut HandlerContext<'_>, ability: &PackagedAbility) -> Option<usize> {
    let index = charge_slot(ctx.state, ability)?;
    economy::spend_use(&mut ctx.state.slots, index).then_some(index)
}

fn refund(ctx: &mut HandlerContext<'_>, index: usize) {
    economy::add_uses(&mut ctx.state.slots, index, 1);
}

/// Post-cast bookkeeping: presentation cooldown and held-item consumption.
fn finish_cast(ctx: &mut HandlerContext<'_>, ability: &PackagedAbility, index: usize) {
    if let Some(slot) = ctx.state.slot_mut(index) {
        economy::start_cooldown(slot, ctx.now);
    }

    // Selection may have moved while the effect ran
    if !ability.consume || ctx.state.selected_slot() != ability.slot_number() {
        return;
    }
    let Some(held) = ctx.host.held_item(ctx.player) else {
        return;
    };
    let active = ctx.host.active_hotbar_slot(ctx.player);
    tracing::debug!(player = %ctx.player, item = %held.item_id, "Consuming held item");
    ctx.host.replace_stack(ctx.player, active, held.reduced_by_one());
}

// ─────────────────────────────────────────────────────────────────────────────
// Charged effects
// ─────────────────────────────────────────────────────────────────────────────

/// Default handler: runs a registered effect for the ability id, paid for with
/// one charge.
///
/// Unknown ids and empty slots are left to later handlers. If the effect
/// fails the charge is refunded and the error goes back to the dispatcher.
#[derive(Default)]
pub struct ChargedEffectHandler {
    /// Keyed by lowercase ability id
    effects: HashMap<String, Box<dyn AbilityEffect>>,
    gate_cooldowns: bool,
}

impl ChargedEffectHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also refuse presses while the slot's cooldown is running.
    pub fn gate_cooldowns(mut self, gate: bool) -> Self {
        self.gate_cooldowns = gate;
        self
    }

    pub fn register_effect(&mut self, ability_id: &str, effect: impl AbilityEffect + 'static) {
        self.effects.insert(ability_id.to_ascii_lowercase(), Box::new(effect));
    }

    pub fn register_fn<F>(&mut self, ability_id: &str, effect: F)
    where
        F: Fn(&PackagedAbility, &mut HandlerContext<'_>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register_effect(ability_id, FnEffect(effect));
    }

    pub fn with_fn<F>(mut self, ability_id: &str, effect: F) -> Self
    where
        F: Fn(&PackagedAbility, &mut HandlerContext<'_>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register_fn(ability_id, effect);
        self
    }

    pub fn has_effect(&self, ability_id: &str) -> bool {
        self.effects.contains_key(&ability_id.to_ascii_lowercase())
    }
}

impl AbilityHandler for ChargedEffectHandler {
    fn name(&self) -> &str {
        "ChargedEffect"
    }

    fn handle_ability(
        &self,
        ability: &PackagedAbility,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<bool, HandlerError> {
        let Some(effect) = self.effects.get(&ability.ability_id.to_ascii_lowercase()) else {
            return Ok(false);
        };

        if self.gate_cooldowns
            && ctx
                .state
                .slot(ability.slot_index)
                .is_some_and(|slot| economy::is_on_cooldown(slot, ctx.now))
        {
            return Ok(false);
        }

        let Some(index) = spend(ctx, ability) else {
            tracing::debug!(player = %ctx.player, ability = %ability.ability_id, "No charges left");
            return Ok(false);
        };

        if let Err(e) = effect.apply(ability, ctx) {
            refund(ctx, index);
            return Err(e);
        }

        finish_cast(ctx, ability, index);
        Ok(true)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Root interactions
// ─────────────────────────────────────────────────────────────────────────────

/// Runs the host-native interaction named by non-plugin slots.
#[derive(Debug, Default)]
pub struct RootInteractionHandler;

impl AbilityHandler for RootInteractionHandler {
    fn name(&self) -> &str {
        "RootInteraction"
    }

    fn handle_ability(
        &self,
        ability: &PackagedAbility,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<bool, HandlerError> {
        if ability.plugin || ability.root_interaction.is_empty() {
            return Ok(false);
        }
        let Some(index) = spend(ctx, ability) else {
            return Ok(false);
        };

        if let Err(e) = ctx.host.run_interaction(ctx.player, &ability.root_interaction) {
            refund(ctx, index);
            return Err(e);
        }

        finish_cast(ctx, ability, index);
        Ok(true)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Handles `command:<line>` ability ids by running the line as the player.
///
/// `{player}` in the line is replaced with the numeric player id.
pub struct CommandHandler {
    executor: Arc<dyn CommandExecutor>,
}

impl CommandHandler {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    fn command_line(ability_id: &str) -> Option<&str> {
        let prefix = ability_id.get(..COMMAND_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(COMMAND_PREFIX) {
            return None;
        }
        let line = ability_id[COMMAND_PREFIX.len()..].trim();
        (!line.is_empty()).then_some(line)
    }
}

impl AbilityHandler for CommandHandler {
    fn name(&self) -> &str {
        "Command"
    }

    fn handle_ability(
        &self,
        ability: &PackagedAbility,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<bool, HandlerError> {
        let Some(line) = Self::command_line(&ability.ability_id) else {
            return Ok(false);
        };
        let Some(index) = spend(ctx, ability) else {
            return Ok(false);
        };

        let command = line.replace("{player}", &ctx.player.0.to_string());
        tracing::debug!(player = %ctx.player, command = %command, "Running ability command");
        if let Err(e) = self.executor.execute_as(ctx.player, &command) {
            refund(ctx, index);
            return Err(e);
        }

        finish_cast(ctx, ability, index);
        Ok(true)
    }
}
