//! A single-player stand-in for the game server.
//!
//! Everything the engine asks of the host is printed to stdout, so a REPL
//! session shows exactly which HUD, hotbar and chat calls a real server would
//! receive.

use std::cell::RefCell;

use hotbar_core::{
    ChargedEffectHandler, CommandExecutor, HandlerContext, HandlerError, Host, ItemStack,
    PackagedAbility, PlayerId,
};
use hotbar_types::SLOT_COUNT;

#[derive(Debug, Default)]
struct World {
    active_slot: u8,
    hotbar: [Option<ItemStack>; SLOT_COUNT],
    hud: Option<String>,
    /// Slot-select the client will send back after a forced slot change
    pending_echo: Option<u8>,
}

#[derive(Debug, Default)]
pub struct ConsoleHost {
    world: RefCell<World>,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a stack in the active hotbar slot.
    pub fn hold(&self, stack: Option<ItemStack>) {
        let mut world = self.world.borrow_mut();
        let slot = world.active_slot as usize;
        world.hotbar[slot] = stack;
    }

    /// The client switched slots on its own, without an echo.
    pub fn select_locally(&self, slot: u8) {
        self.world.borrow_mut().active_slot = slot;
        println!("[hotbar] active slot {}", slot + 1);
    }

    pub fn take_pending_echo(&self) -> Option<u8> {
        self.world.borrow_mut().pending_echo.take()
    }

    pub fn describe(&self) -> String {
        let world = self.world.borrow();
        let held = world.hotbar[world.active_slot as usize]
            .as_ref()
            .map(|s| format!("{} x{}", s.item_id, s.quantity))
            .unwrap_or_else(|| "nothing".to_string());
        format!(
            "active slot {} holding {}, hud {}",
            world.active_slot + 1,
            held,
            world.hud.as_deref().unwrap_or("-")
        )
    }
}

impl Host for ConsoleHost {
    fn active_hotbar_slot(&self, _player: PlayerId) -> u8 {
        self.world.borrow().active_slot
    }

    fn set_active_hotbar_slot(&self, _player: PlayerId, slot: u8) {
        let mut world = self.world.borrow_mut();
        world.active_slot = slot.min(SLOT_COUNT as u8 - 1);
        world.pending_echo = Some(world.active_slot);
        println!("[hotbar] forced active slot {}", world.active_slot + 1);
    }

    fn set_custom_hud(&self, _player: PlayerId, hud: Option<&str>) {
        self.world.borrow_mut().hud = hud.map(str::to_string);
        match hud {
            Some(hud) => println!("[hud] showing {hud}"),
            None => println!("[hud] cleared"),
        }
    }

    fn held_item(&self, _player: PlayerId) -> Option<ItemStack> {
        let world = self.world.borrow();
        world.hotbar[world.active_slot as usize].clone()
    }

    fn replace_stack(&self, _player: PlayerId, slot: u8, stack: Option<ItemStack>) {
        let mut world = self.world.borrow_mut();
        if let Some(entry) = world.hotbar.get_mut(slot as usize) {
            *entry = stack;
        }
        println!("[inventory] slot {} replaced", slot + 1);
    }

    fn send_message(&self, _player: PlayerId, message: &str) {
        println!("[chat] {message}");
    }

    fn run_interaction(&self, _player: PlayerId, interaction: &str) -> Result<(), HandlerError> {
        println!("[interaction] {interaction}");
        Ok(())
    }
}

/// Prints commands instead of running them.
pub struct ConsoleExecutor;

impl CommandExecutor for ConsoleExecutor {
    fn execute_as(&self, player: PlayerId, command: &str) -> Result<(), HandlerError> {
        if command.is_empty() {
            return Err(HandlerError::Command("empty command".into()));
        }
        println!("[command as {player}] {command}");
        Ok(())
    }
}

/// Charged effects for the demo staff. Each one announces itself in chat;
/// Blink also respects its cooldown.
pub fn demo_effects() -> ChargedEffectHandler {
    ChargedEffectHandler::new()
        .gate_cooldowns(true)
        .with_fn("Fireball", |ability, ctx| {
            announce(ability, ctx, "hurls a fireball");
            Ok(())
        })
        .with_fn("Blink", |ability, ctx| {
            announce(ability, ctx, "blinks forward");
            Ok(())
        })
        .with_fn("Potion", |ability, ctx| {
            announce(ability, ctx, &format!("drinks a potion (+{} health)", ability.ability_value));
            Ok(())
        })
}

fn announce(ability: &PackagedAbility, ctx: &mut HandlerContext<'_>, action: &str) {
    ctx.host.send_message(
        ctx.player,
        &format!("You {} (power x{:.2})", action, ability.power_multiplier),
    );
}
