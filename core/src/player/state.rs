//! Per-player runtime state.

use std::sync::Arc;

use chrono::NaiveDateTime;
use hashbrown::HashSet;
use hotbar_types::SLOT_COUNT;

use crate::definitions::{AbilitySlotSpec, DefinitionStore, WeaponDefinition};

/// Charge state of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uses {
    /// `max_uses <= 0`: every spend succeeds and nothing is counted
    Unlimited,
    /// `0 <= remaining <= max`
    Limited { remaining: i32, max: i32 },
}

/// Live counters for one bar position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotState {
    /// Static fields copied from the definition at refresh time
    pub spec: AbilitySlotSpec,
    /// Snapshotted from `spec.max_uses` at refresh time
    pub max_uses: i32,
    pub remaining_uses: i32,
    pub cooldown_until: Option<NaiveDateTime>,
    /// Fractional uses regained but not yet granted
    pub recharge_accumulator: f32,
    pub last_update: Option<NaiveDateTime>,
    /// Handler-defined toggles (e.g. "local_axis")
    pub flags: HashSet<String>,
}

impl SlotState {
    /// Fresh runtime state at full charge.
    pub fn from_spec(spec: &AbilitySlotSpec) -> Self {
        Self {
            spec: spec.clone(),
            max_uses: spec.max_uses,
            remaining_uses: spec.max_uses.max(0),
            ..Default::default()
        }
    }

    pub fn uses(&self) -> Uses {
        if self.max_uses <= 0 {
            Uses::Unlimited
        } else {
            Uses::Limited {
                remaining: self.remaining_uses,
                max: self.max_uses,
            }
        }
    }

    pub fn is_limited(&self) -> bool {
        self.max_uses > 0
    }

    pub fn is_full(&self) -> bool {
        !self.is_limited() || self.remaining_uses >= self.max_uses
    }

    pub fn is_empty(&self) -> bool {
        self.spec.is_empty()
    }

    pub fn ability_id(&self) -> &str {
        &self.spec.ability_id
    }

    /// Flip a handler flag, returning its new state.
    pub fn toggle_flag(&mut self, flag: &str) -> bool {
        if self.flags.remove(flag) {
            false
        } else {
            self.flags.insert(flag.to_string());
            true
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}

/// Swallow one echoed slot-select for `slot` until `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressMarker {
    /// 0-based hotbar slot
    pub slot: u8,
    pub expires_at: NaiveDateTime,
}

impl SuppressMarker {
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        now <= self.expires_at
    }
}

/// Everything the engine tracks for one connected player.
///
/// Created lazily on first access and kept for the player's session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub enabled: bool,
    /// 1-based bar selection
    selected_slot: u8,
    /// Resolved item the slots were refreshed from
    pub item_id: Option<String>,
    pub ability_bar: String,
    pub slots: [SlotState; SLOT_COUNT],
    power_multiplier: f32,
    pub suppress: Option<SuppressMarker>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            enabled: false,
            selected_slot: 1,
            item_id: None,
            ability_bar: String::new(),
            slots: Default::default(),
            power_multiplier: 1.0,
            suppress: None,
        }
    }

    // --- Selection & multiplier ---

    pub fn selected_slot(&self) -> u8 {
        self.selected_slot
    }

    /// Select a 1-based slot. Out-of-range values are rejected.
    pub fn set_selected_slot(&mut self, slot: u8) -> bool {
        if (1..=SLOT_COUNT as u8).contains(&slot) {
            self.selected_slot = slot;
            true
        } else {
            false
        }
    }

    pub fn power_multiplier(&self) -> f32 {
        self.power_multiplier
    }

    /// Set the global multiplier. Must be finite and positive.
    pub fn set_power_multiplier(&mut self, multiplier: f32) -> bool {
        if multiplier.is_finite() && multiplier > 0.0 {
            self.power_multiplier = multiplier;
            true
        } else {
            false
        }
    }

    // --- Slots ---

    pub fn slot(&self, index: usize) -> Option<&SlotState> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut SlotState> {
        self.slots.get_mut(index)
    }

    pub fn has_bar(&self) -> bool {
        !self.ability_bar.is_empty()
    }

    /// Clear the bar and all slot counters. `enabled` is left alone.
    pub fn reset_slots(&mut self) {
        self.item_id = None;
        self.ability_bar.clear();
        self.slots = Default::default();
    }

    /// Copy a resolved definition into the runtime slots at full charge.
    pub fn apply_definition(&mut self, def: &WeaponDefinition) {
        self.item_id = Some(def.item_id.clone());
        self.ability_bar.clone_from(&def.ability_bar);
        for (slot, spec) in self.slots.iter_mut().zip(def.slots.iter()) {
            *slot = SlotState::from_spec(spec);
        }
    }

    /// Re-read slot configuration for the held item.
    ///
    /// No item, an unknown item or a definition without abilities resets to
    /// the empty snapshot. This is the only place charges are refilled from
    /// configuration.
    pub fn refresh_from_held_item(
        &mut self,
        store: &DefinitionStore,
        item_id: Option<&str>,
    ) -> Option<Arc<WeaponDefinition>> {
        let def = item_id
            .and_then(|id| store.resolve(id))
            .filter(|def| def.has_abilities());

        match &def {
            Some(def) => self.apply_definition(def),
            None => self.reset_slots(),
        }
        def
    }

    // --- Echo suppression ---

    pub fn suppress_next(&mut self, slot: u8, expires_at: NaiveDateTime) {
        self.suppress = Some(SuppressMarker { slot, expires_at });
    }

    /// Consume the marker if it matches `slot` and is still live.
    ///
    /// Stale markers are dropped and never honored.
    pub fn take_suppressed(&mut self, slot: u8, now: NaiveDateTime) -> bool {
        match self.suppress {
            Some(marker) if !marker.is_live(now) => {
                self.suppress = None;
                false
            }
            Some(marker) if marker.slot == slot => {
                self.suppress = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::MemorySource;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn store() -> DefinitionStore {
        let source = MemorySource::new("base")
            .with("index.json", r#"{ "Weapons": ["staff.json", "stick.json"] }"#)
            .with(
                "staff.json",
                r#"{ "ItemId": "Staff", "AbilityBar": "Hud/Staff.ui",
                     "AbilitySlots": [ { "ID": "Bolt", "MaxUses": 3 }, { "ID": "Blink" } ] }"#,
            )
            .with("stick.json", r#"{ "ItemId": "Stick", "AbilityBar": "Hud/Stick.ui" }"#);
        let mut store = DefinitionStore::new();
        store.load("index.json", &source);
        store
    }

    #[test]
    fn test_refresh_fills_charges() {
        let store = store();
        let mut state = PlayerState::new();
        assert!(state.refresh_from_held_item(&store, Some("Staff")).is_some());

        assert_eq!(state.item_id.as_deref(), Some("Staff"));
        assert_eq!(state.ability_bar, "Hud/Staff.ui");
        assert_eq!(state.slots[0].uses(), Uses::Limited { remaining: 3, max: 3 });
        assert_eq!(state.slots[1].uses(), Uses::Unlimited);
        assert!(state.slots[2].is_empty());
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let store = store();
        let mut state = PlayerState::new();
        state.refresh_from_held_item(&store, Some("Staff"));
        let first = state.clone();
        state.refresh_from_held_item(&store, Some("Staff"));
        assert_eq!(state, first);
        assert_eq!(state.slots[0].remaining_uses, 3);
    }

    #[test]
    fn test_refresh_unknown_or_empty_resets_but_keeps_enabled() {
        let store = store();
        let mut state = PlayerState::new();
        state.refresh_from_held_item(&store, Some("Staff"));
        state.enabled = true;

        assert!(state.refresh_from_held_item(&store, Some("Stick")).is_none());
        assert!(state.enabled);
        assert!(!state.has_bar());
        assert!(state.slots.iter().all(|s| *s == SlotState::default()));

        state.refresh_from_held_item(&store, Some("Staff"));
        assert!(state.refresh_from_held_item(&store, None).is_none());
        assert_eq!(state.item_id, None);
    }

    #[test]
    fn test_selected_slot_bounds() {
        let mut state = PlayerState::new();
        assert_eq!(state.selected_slot(), 1);
        assert!(state.set_selected_slot(9));
        assert!(!state.set_selected_slot(0));
        assert!(!state.set_selected_slot(10));
        assert_eq!(state.selected_slot(), 9);
    }

    #[test]
    fn test_power_multiplier_rejects_non_positive() {
        let mut state = PlayerState::new();
        assert!(!state.set_power_multiplier(0.0));
        assert!(!state.set_power_multiplier(f32::NAN));
        assert!(state.set_power_multiplier(1.5));
        assert_eq!(state.power_multiplier(), 1.5);
    }

    #[test]
    fn test_suppression_marker_expiry() {
        let mut state = PlayerState::new();
        state.suppress_next(4, t0() + Duration::milliseconds(250));

        // Different slot leaves the marker in place
        assert!(!state.take_suppressed(3, t0()));
        assert!(state.suppress.is_some());

        assert!(state.take_suppressed(4, t0() + Duration::milliseconds(250)));
        assert!(state.suppress.is_none());

        state.suppress_next(4, t0() + Duration::milliseconds(250));
        assert!(!state.take_suppressed(4, t0() + Duration::milliseconds(251)));
        assert!(state.suppress.is_none());
    }

    #[test]
    fn test_toggle_flag() {
        let mut slot = SlotState::default();
        assert!(slot.toggle_flag("local_axis"));
        assert!(slot.has_flag("local_axis"));
        assert!(!slot.toggle_flag("local_axis"));
        assert!(!slot.has_flag("local_axis"));
    }
}
