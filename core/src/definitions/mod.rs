//! Weapon and ability definitions
//!
//! This module provides:
//! - **Documents**: JSON index, weapon and contribution-pack files (see `hotbar-types`)
//! - **Model**: validated, immutable [`WeaponDefinition`]s with exactly nine slots
//! - **Store**: merging of base definitions and contribution packs, plus
//!   on-demand resolution of override patches
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │ base index (FsSource)    │   │ contribution packs (sorted)  │
//! │ Includes / Weapons / ... │   │ Overrides / Indexes / List   │
//! └────────────┬─────────────┘   └──────────────┬───────────────┘
//!              │ load()                          │ register_contribution()
//!              ▼                                 ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       DefinitionStore                         │
//! │  definitions · override patches · shorthand map · cache       │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ resolve(item_id)
//!                                ▼
//!                     Arc<WeaponDefinition>
//! ```

mod model;
mod source;
mod store;

pub use model::{AbilitySlotSpec, OverridePatch, WeaponDefinition};
pub use source::{DocumentSource, FsSource, MemorySource, normalize_path, read_json};
pub use store::{DefinitionStore, StoreStats};

/// Normalize an item id: drop any path prefix and file extension.
///
/// Case is preserved.
pub fn normalize_item_id(id: &str) -> &str {
    let id = id.trim();
    let base = id.rsplit(['/', '\\']).next().unwrap_or(id);
    match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_item_id() {
        assert_eq!(normalize_item_id("Weapon_Sword_Mithril"), "Weapon_Sword_Mithril");
        assert_eq!(normalize_item_id("Items/Weapons/Weapon_Sword_Mithril.json"), "Weapon_Sword_Mithril");
        assert_eq!(normalize_item_id("Items\\Weapon_Axe.json"), "Weapon_Axe");
        assert_eq!(normalize_item_id("weapon_lowercase"), "weapon_lowercase");
    }
}
