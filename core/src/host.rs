//! Capabilities the surrounding game server provides to the engine.
//!
//! Every call goes through `&self`: hosts that need mutation use their own
//! interior locking. The engine never caches what these return.

use crate::error::HandlerError;
use crate::player::PlayerId;

/// An item stack in the player's inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub item_id: String,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }

    /// One fewer item, or `None` when the stack runs out.
    pub fn reduced_by_one(&self) -> Option<ItemStack> {
        (self.quantity > 1).then(|| ItemStack {
            item_id: self.item_id.clone(),
            quantity: self.quantity - 1,
        })
    }
}

/// Game server operations invoked on the world thread.
pub trait Host {
    /// 0-based index of the player's underlying active hotbar slot
    fn active_hotbar_slot(&self, player: PlayerId) -> u8;

    fn set_active_hotbar_slot(&self, player: PlayerId, slot: u8);

    /// Show a custom HUD resource, or clear it with `None`
    fn set_custom_hud(&self, player: PlayerId, hud: Option<&str>);

    fn held_item(&self, player: PlayerId) -> Option<ItemStack>;

    /// Replace the stack in a 0-based hotbar slot. `None` empties it.
    fn replace_stack(&self, player: PlayerId, slot: u8, stack: Option<ItemStack>);

    fn send_message(&self, player: PlayerId, message: &str);

    /// Trigger a host-native interaction by name.
    fn run_interaction(&self, player: PlayerId, interaction: &str) -> Result<(), HandlerError>;
}

/// "Execute this command line as that player."
pub trait CommandExecutor: Send + Sync {
    fn execute_as(&self, player: PlayerId, command: &str) -> Result<(), HandlerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_by_one() {
        let stack = ItemStack::new("Potion", 2);
        assert_eq!(stack.reduced_by_one(), Some(ItemStack::new("Potion", 1)));
        assert_eq!(ItemStack::new("Potion", 1).reduced_by_one(), None);
    }
}
