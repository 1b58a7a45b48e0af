//! Shared fixtures for unit tests.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::HandlerError;
use crate::host::{Host, ItemStack};
use crate::player::PlayerId;

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[derive(Debug, Default)]
struct Recorded {
    active_slot: u8,
    held: Option<ItemStack>,
    hud: Option<String>,
    slot_sets: Vec<u8>,
    replaced: Vec<(u8, Option<ItemStack>)>,
    messages: Vec<String>,
    interactions: Vec<String>,
}

/// Single-player host that records every call made to it.
#[derive(Debug, Default)]
pub struct RecordingHost {
    inner: Mutex<Recorded>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(self, stack: ItemStack) -> Self {
        self.set_held(Some(stack));
        self
    }

    pub fn set_held(&self, stack: Option<ItemStack>) {
        self.inner.lock().unwrap().held = stack;
    }

    pub fn set_active(&self, slot: u8) {
        self.inner.lock().unwrap().active_slot = slot;
    }

    pub fn hud(&self) -> Option<String> {
        self.inner.lock().unwrap().hud.clone()
    }

    /// Every `set_active_hotbar_slot` call, in order
    pub fn slot_sets(&self) -> Vec<u8> {
        self.inner.lock().unwrap().slot_sets.clone()
    }

    pub fn replaced(&self) -> Vec<(u8, Option<ItemStack>)> {
        self.inner.lock().unwrap().replaced.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.inner.lock().unwrap().messages.clone()
    }

    pub fn interactions(&self) -> Vec<String> {
        self.inner.lock().unwrap().interactions.clone()
    }
}

impl Host for RecordingHost {
    fn active_hotbar_slot(&self, _player: PlayerId) -> u8 {
        self.inner.lock().unwrap().active_slot
    }

    fn set_active_hotbar_slot(&self, _player: PlayerId, slot: u8) {
        let mut inner = self.inner.lock().unwrap();
        inner.active_slot = slot;
        inner.slot_sets.push(slot);
    }

    fn set_custom_hud(&self, _player: PlayerId, hud: Option<&str>) {
        self.inner.lock().unwrap().hud = hud.map(str::to_string);
    }

    fn held_item(&self, _player: PlayerId) -> Option<ItemStack> {
        self.inner.lock().unwrap().held.clone()
    }

    fn replace_stack(&self, _player: PlayerId, slot: u8, stack: Option<ItemStack>) {
        let mut inner = self.inner.lock().unwrap();
        if slot == inner.active_slot {
            inner.held = stack.clone();
        }
        inner.replaced.push((slot, stack));
    }

    fn send_message(&self, _player: PlayerId, message: &str) {
        self.inner.lock().unwrap().messages.push(message.to_string());
    }

    fn run_interaction(&self, _player: PlayerId, interaction: &str) -> Result<(), HandlerError> {
        if interaction.is_empty() {
            return Err(HandlerError::Host("empty interaction".into()));
        }
        self.inner
            .lock()
            .unwrap()
            .interactions
            .push(interaction.to_string());
        Ok(())
    }
}
