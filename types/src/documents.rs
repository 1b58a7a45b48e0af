//! Definition document types
//!
//! These mirror the JSON files shipped with weapons and contribution packs.
//! Keys are PascalCase on the wire; every field is optional so that a
//! partially written document still loads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Number of positions on an ability bar.
pub const SLOT_COUNT: usize = 9;

// ═══════════════════════════════════════════════════════════════════════════
// Index Documents
// ═══════════════════════════════════════════════════════════════════════════

/// An index file: further indexes to walk plus concrete weapon documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IndexDocument {
    /// Further index documents, walked recursively
    pub includes: Vec<String>,
    pub weapons: Vec<String>,
    pub abilities: Vec<String>,
    pub bars: Vec<String>,
}

impl IndexDocument {
    /// All weapon document paths, in listing order (weapons, abilities, bars).
    pub fn weapon_paths(&self) -> impl Iterator<Item = &String> {
        self.weapons
            .iter()
            .chain(self.abilities.iter())
            .chain(self.bars.iter())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Weapon Documents
// ═══════════════════════════════════════════════════════════════════════════

/// One held item and the abilities it grants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WeaponDocument {
    pub item_id: String,
    /// UI resource path of the bar widget (empty = no bar)
    pub ability_bar: String,
    /// Up to nine slots; extra entries are ignored
    pub ability_slots: Vec<SlotDocument>,
}

/// One slot as written in a weapon document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SlotDocument {
    pub key: String,
    pub root_interaction: String,
    #[serde(rename = "ID")]
    pub ability_id: String,
    /// Handled by a registered ability handler rather than a root interaction
    pub plugin: bool,
    /// Remove one item from the held stack after a successful cast
    pub consume: bool,
    /// Zero or negative means unlimited
    pub max_uses: i32,
    pub power_multiplier: f32,
    pub icon: String,
    /// Handler-defined integer payload
    pub ability_value: i32,
    pub cooldown_secs: f32,
    pub recharge_secs: f32,
}

impl Default for SlotDocument {
    fn default() -> Self {
        Self {
            key: String::new(),
            root_interaction: String::new(),
            ability_id: String::new(),
            plugin: false,
            consume: false,
            max_uses: 0,
            power_multiplier: 1.0,
            icon: String::new(),
            ability_value: 0,
            cooldown_secs: 0.0,
            recharge_secs: 0.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Contribution Packs
// ═══════════════════════════════════════════════════════════════════════════

/// Configuration bundle supplied by an external module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContributionPack {
    /// Shorthand overrides: item id -> base definition id
    pub overrides: BTreeMap<String, String>,
    /// Index documents inside the contributor's own namespace
    pub indexes: Vec<String>,
    pub override_list: Vec<OverrideDocument>,
}

/// Rich override: clone `use_definition` and apply field edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OverrideDocument {
    pub item_id: String,
    pub use_definition: Option<String>,
    pub ability_bar: Option<String>,
    /// Keys are 1-based slot numbers ("1".."9")
    pub slot_overrides: BTreeMap<String, SlotPatch>,
}

/// Partial slot fields. `None` leaves the base value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SlotPatch {
    pub key: Option<String>,
    pub root_interaction: Option<String>,
    #[serde(rename = "ID")]
    pub ability_id: Option<String>,
    pub plugin: Option<bool>,
    pub consume: Option<bool>,
    pub max_uses: Option<i32>,
    pub power_multiplier: Option<f32>,
    pub icon: Option<String>,
    pub ability_value: Option<i32>,
    pub cooldown_secs: Option<f32>,
    pub recharge_secs: Option<f32>,
}

macro_rules! take_present {
    ($dst:expr, $src:expr, $($field:ident),+ $(,)?) => {
        $(
            if $src.$field.is_some() {
                $dst.$field.clone_from(&$src.$field);
            }
        )+
    };
}

impl SlotPatch {
    pub fn merge_from(&mut self, later: &SlotPatch) {
        take_present!(
            self,
            later,
            key,
            root_interaction,
            ability_id,
            plugin,
            consume,
            max_uses,
            power_multiplier,
            icon,
            ability_value,
            cooldown_secs,
            recharge_secs,
        );
    }

    pub fn is_empty(&self) -> bool {
        *self == SlotPatch::default()
    }
}
