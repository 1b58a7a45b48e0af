pub mod commands;
pub mod config;
pub mod definitions;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod host;
pub mod input;
pub mod player;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::{EngineConfigExt, load_config, load_config_or_default};
pub use definitions::{DefinitionStore, DocumentSource, FsSource, MemorySource, WeaponDefinition};
pub use dispatch::{
    AbilityDispatcher, AbilityEffect, AbilityHandler, ChargedEffectHandler, CommandHandler,
    DispatchOutcome, HandlerContext, PackagedAbility, RootInteractionHandler,
};
pub use engine::Engine;
pub use error::{ConfigError, DefinitionError, HandlerError};
pub use host::{CommandExecutor, Host, ItemStack};
pub use input::{InputDecision, InputEvent, InventorySection, PacketGate};
pub use player::{PlayerId, PlayerState};
