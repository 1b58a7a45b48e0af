//! Resolved weapon and slot definitions.
//!
//! These are the immutable, validated forms of the JSON documents. A
//! definition always carries exactly nine slots; positions a document leaves
//! out are explicit empty specs.

use std::collections::BTreeMap;

use hotbar_types::{OverrideDocument, SLOT_COUNT, SlotDocument, SlotPatch, WeaponDocument};

// ═══════════════════════════════════════════════════════════════════════════
// Slot Spec
// ═══════════════════════════════════════════════════════════════════════════

/// Static configuration of one bar position.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilitySlotSpec {
    pub key: String,
    pub ability_id: String,
    pub root_interaction: String,
    pub plugin: bool,
    pub consume: bool,
    /// `<= 0` means unlimited
    pub max_uses: i32,
    /// Always `> 0`
    pub power_multiplier: f32,
    pub icon: String,
    pub ability_value: i32,
    pub cooldown_secs: f32,
    pub recharge_secs: f32,
}

impl Default for AbilitySlotSpec {
    fn default() -> Self {
        Self {
            key: String::new(),
            ability_id: String::new(),
            root_interaction: String::new(),
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

impl AbilitySlotSpec {
    pub fn from_document(doc: &SlotDocument) -> Self {
        Self {
            key: doc.key.clone(),
            ability_id: doc.ability_id.clone(),
            root_interaction: doc.root_interaction.clone(),
            plugin: doc.plugin,
            consume: doc.consume,
            max_uses: doc.max_uses,
            power_multiplier: sanitize_multiplier(doc.power_multiplier),
            icon: doc.icon.clone(),
            ability_value: doc.ability_value,
            cooldown_secs: sanitize_secs(doc.cooldown_secs),
            recharge_secs: sanitize_secs(doc.recharge_secs),
        }
    }

    /// Neither an ability id nor a root interaction is configured.
    pub fn is_empty(&self) -> bool {
        self.ability_id.is_empty() && self.root_interaction.is_empty()
    }

    pub fn is_limited(&self) -> bool {
        self.max_uses > 0
    }

    /// Apply the present fields of a patch in place.
    pub fn apply_patch(&mut self, patch: &SlotPatch) {
        if let Some(key) = &patch.key {
            self.key.clone_from(key);
        }
        if let Some(ability_id) = &patch.ability_id {
            self.ability_id.clone_from(ability_id);
        }
        if let Some(root) = &patch.root_interaction {
            self.root_interaction.clone_from(root);
        }
        if let Some(plugin) = patch.plugin {
            self.plugin = plugin;
        }
        if let Some(consume) = patch.consume {
            self.consume = consume;
        }
        if let Some(max_uses) = patch.max_uses {
            self.max_uses = max_uses;
        }
        if let Some(multiplier) = patch.power_multiplier {
            self.power_multiplier = sanitize_multiplier(multiplier);
        }
        if let Some(icon) = &patch.icon {
            self.icon.clone_from(icon);
        }
        if let Some(value) = patch.ability_value {
            self.ability_value = value;
        }
        if let Some(secs) = patch.cooldown_secs {
            self.cooldown_secs = sanitize_secs(secs);
        }
        if let Some(secs) = patch.recharge_secs {
            self.recharge_secs = sanitize_secs(secs);
        }
    }
}

fn sanitize_multiplier(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        tracing::warn!(value, "Non-positive power multiplier, using 1.0");
        1.0
    }
}

/// Longest cooldown or recharge period a slot may configure.
pub const MAX_PERIOD_SECS: f32 = 365.0 * 24.0 * 3600.0;

fn sanitize_secs(value: f32) -> f32 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    if value > MAX_PERIOD_SECS {
        tracing::warn!(value, max = MAX_PERIOD_SECS, "Slot period too long, clamping");
        return MAX_PERIOD_SECS;
    }
    value
}

// ═══════════════════════════════════════════════════════════════════════════
// Override Patch
// ═══════════════════════════════════════════════════════════════════════════

/// Derive an item's configuration from a base definition plus field edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverridePatch {
    pub item_id: String,
    /// Base item to clone; may itself be another patched item
    pub use_definition: Option<String>,
    pub ability_bar: Option<String>,
    /// Indexed by 0-based slot position
    pub slots: [Option<SlotPatch>; SLOT_COUNT],
}

impl OverridePatch {
    pub fn from_document(doc: &OverrideDocument) -> Self {
        Self {
            item_id: super::normalize_item_id(&doc.item_id).to_string(),
            use_definition: doc
                .use_definition
                .as_deref()
                .map(|id| super::normalize_item_id(id).to_string()),
            ability_bar: doc.ability_bar.clone(),
            slots: parse_slot_overrides(&doc.item_id, &doc.slot_overrides),
        }
    }

    /// Layer a later patch for the same item on top of this one.
    pub fn merge_from(&mut self, later: &OverridePatch) {
        if later.use_definition.is_some() {
            self.use_definition.clone_from(&later.use_definition);
        }
        if later.ability_bar.is_some() {
            self.ability_bar.clone_from(&later.ability_bar);
        }
        for (mine, theirs) in self.slots.iter_mut().zip(later.slots.iter()) {
            if let Some(theirs) = theirs {
                mine.get_or_insert_with(SlotPatch::default).merge_from(theirs);
            }
        }
    }
}

fn parse_slot_overrides(
    item_id: &str,
    overrides: &BTreeMap<String, SlotPatch>,
) -> [Option<SlotPatch>; SLOT_COUNT] {
    let mut slots: [Option<SlotPatch>; SLOT_COUNT] = Default::default();
    for (key, patch) in overrides {
        match key.trim().parse::<usize>() {
            Ok(n) if (1..=SLOT_COUNT).contains(&n) => slots[n - 1] = Some(patch.clone()),
            _ => tracing::warn!(item_id, slot = %key, "Ignoring slot override outside 1-9"),
        }
    }
    slots
}

// ═══════════════════════════════════════════════════════════════════════════
// Weapon Definition
// ═══════════════════════════════════════════════════════════════════════════

/// Resolved ability configuration for one held item.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponDefinition {
    pub item_id: String,
    /// UI resource path of the bar widget (empty = no bar)
    pub ability_bar: String,
    pub slots: [AbilitySlotSpec; SLOT_COUNT],
}

impl WeaponDefinition {
    pub fn empty(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            ability_bar: String::new(),
            slots: Default::default(),
        }
    }

    pub fn from_document(doc: &WeaponDocument) -> Self {
        let item_id = super::normalize_item_id(&doc.item_id);
        if doc.ability_slots.len() > SLOT_COUNT {
            tracing::warn!(
                item_id,
                count = doc.ability_slots.len(),
                "Weapon lists more than 9 ability slots, extra slots ignored"
            );
        }

        let mut def = Self::empty(item_id);
        def.ability_bar = doc.ability_bar.clone();
        for (spec, slot_doc) in def.slots.iter_mut().zip(doc.ability_slots.iter()) {
            *spec = AbilitySlotSpec::from_document(slot_doc);
        }
        def
    }

    /// At least one slot is configured.
    pub fn has_abilities(&self) -> bool {
        self.slots.iter().any(|s| !s.is_empty())
    }

    pub fn slot(&self, index: usize) -> Option<&AbilitySlotSpec> {
        self.slots.get(index)
    }

    /// Clone this definition under a new id with the patch applied.
    ///
    /// `self` is never modified.
    pub fn derive(&self, item_id: &str, patch: &OverridePatch) -> WeaponDefinition {
        let mut derived = self.clone();
        derived.item_id = item_id.to_string();
        if let Some(bar) = &patch.ability_bar {
            derived.ability_bar.clone_from(bar);
        }
        for (spec, slot_patch) in derived.slots.iter_mut().zip(patch.slots.iter()) {
            if let Some(slot_patch) = slot_patch {
                spec.apply_patch(slot_patch);
            }
        }
        derived
    }

    /// Same configuration under a different item id (shorthand overrides).
    pub fn renamed(&self, item_id: &str) -> WeaponDefinition {
        let mut renamed = self.clone();
        renamed.item_id = item_id.to_string();
        renamed
    }
}
