//! Charge economy over a player's slot array.
//!
//! Every function here works on the nine [`SlotState`]s of one player and
//! holds the invariant `0 <= remaining_uses <= max_uses` for limited slots.
//! Unlimited slots (`max_uses <= 0`) accept every operation as a no-op
//! success. Indexes are 0-based; out-of-range indexes fail.
//!
//! Discrete uses gate whether a slot can fire. Cooldowns are presentation
//! only unless a handler opts in through [`start_cooldown`] and
//! [`is_on_cooldown`].

use chrono::{NaiveDateTime, TimeDelta};
use rand::Rng;
use rand::seq::SliceRandom;

use super::state::SlotState;

// ─────────────────────────────────────────────────────────────────────────────
// Discrete uses
// ─────────────────────────────────────────────────────────────────────────────

/// Spend one use. Fails only for a limited slot with nothing left.
pub fn spend_use(slots: &mut [SlotState], index: usize) -> bool {
    let Some(slot) = slots.get_mut(index) else {
        return false;
    };
    if !slot.is_limited() {
        return true;
    }
    if slot.remaining_uses > 0 {
        slot.remaining_uses -= 1;
        true
    } else {
        false
    }
}

pub fn set_uses(slots: &mut [SlotState], index: usize, value: i32) -> bool {
    let Some(slot) = slots.get_mut(index) else {
        return false;
    };
    if slot.is_limited() {
        slot.remaining_uses = value.clamp(0, slot.max_uses);
    }
    true
}

/// Add (or with a negative delta, remove) uses, clamped to `[0, max]`.
pub fn add_uses(slots: &mut [SlotState], index: usize, delta: i32) -> bool {
    let Some(slot) = slots.get_mut(index) else {
        return false;
    };
    if slot.is_limited() {
        slot.remaining_uses = slot.remaining_uses.saturating_add(delta).clamp(0, slot.max_uses);
    }
    true
}

pub fn refill(slots: &mut [SlotState], index: usize) -> bool {
    let Some(slot) = slots.get_mut(index) else {
        return false;
    };
    if slot.is_limited() {
        slot.remaining_uses = slot.max_uses;
        slot.recharge_accumulator = 0.0;
    }
    true
}

pub fn refill_all(slots: &mut [SlotState]) {
    for index in 0..slots.len() {
        refill(slots, index);
    }
}

/// First slot whose ability id matches, ignoring ASCII case.
pub fn find_slot_by_ability_id(slots: &[SlotState], ability_id: &str) -> Option<usize> {
    if ability_id.is_empty() {
        return None;
    }
    slots
        .iter()
        .position(|s| s.ability_id().eq_ignore_ascii_case(ability_id))
}

// ─────────────────────────────────────────────────────────────────────────────
// Random grants
// ─────────────────────────────────────────────────────────────────────────────

/// Slots a random refill or charge grant may pick: configured, limited and
/// not full, optionally excluding one ability id.
pub fn refill_candidates(slots: &[SlotState], exclude: Option<&str>) -> Vec<usize> {
    slots
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.ability_id().is_empty() && s.is_limited() && !s.is_full())
        .filter(|(_, s)| exclude.is_none_or(|ex| !s.ability_id().eq_ignore_ascii_case(ex)))
        .map(|(i, _)| i)
        .collect()
}

/// Refill one uniformly chosen candidate slot. Returns the slot refilled.
pub fn refill_random<R: Rng + ?Sized>(
    slots: &mut [SlotState],
    exclude: Option<&str>,
    rng: &mut R,
) -> Option<usize> {
    let index = *refill_candidates(slots, exclude).choose(rng)?;
    refill(slots, index);
    Some(index)
}

/// Add `amount` uses to one uniformly chosen candidate slot.
pub fn grant_random_charge<R: Rng + ?Sized>(
    slots: &mut [SlotState],
    exclude: Option<&str>,
    amount: i32,
    rng: &mut R,
) -> Option<usize> {
    let index = *refill_candidates(slots, exclude).choose(rng)?;
    add_uses(slots, index, amount);
    Some(index)
}

// ─────────────────────────────────────────────────────────────────────────────
// Cooldown & recharge
// ─────────────────────────────────────────────────────────────────────────────

fn secs_between(from: NaiveDateTime, to: NaiveDateTime) -> f32 {
    to.signed_duration_since(from).num_milliseconds() as f32 / 1000.0
}

/// Start the slot's configured cooldown at `now`. No-op without a cooldown.
pub fn start_cooldown(slot: &mut SlotState, now: NaiveDateTime) {
    if slot.spec.cooldown_secs <= 0.0 {
        return;
    }
    let millis = (f64::from(slot.spec.cooldown_secs) * 1000.0).round() as i64;
    slot.cooldown_until = TimeDelta::try_milliseconds(millis).and_then(|d| now.checked_add_signed(d));
    if slot.cooldown_until.is_none() {
        tracing::warn!(
            ability_id = %slot.ability_id(),
            cooldown_secs = slot.spec.cooldown_secs,
            "Cooldown out of range, not started"
        );
    }
}

pub fn cooldown_remaining_secs(slot: &SlotState, now: NaiveDateTime) -> f32 {
    slot.cooldown_until
        .map(|until| secs_between(now, until).max(0.0))
        .unwrap_or(0.0)
}

pub fn is_on_cooldown(slot: &SlotState, now: NaiveDateTime) -> bool {
    cooldown_remaining_secs(slot, now) > 0.0
}

/// Fraction of the cooldown still to run, in `[0, 1]`.
pub fn cooldown_ratio(slot: &SlotState, now: NaiveDateTime) -> f32 {
    let duration = slot.spec.cooldown_secs;
    if duration <= 0.0 {
        return 0.0;
    }
    (cooldown_remaining_secs(slot, now) / duration).clamp(0.0, 1.0)
}

/// Advance passive recharge to `now`, granting whole uses.
///
/// Returns the number of uses granted.
pub fn advance_recharge(slot: &mut SlotState, now: NaiveDateTime) -> i32 {
    let Some(last) = slot.last_update.replace(now) else {
        return 0;
    };
    if !slot.is_limited() || slot.spec.recharge_secs <= 0.0 || slot.is_full() {
        slot.recharge_accumulator = 0.0;
        return 0;
    }

    let elapsed = secs_between(last, now);
    if elapsed <= 0.0 {
        // Out-of-order tick; keep the later timestamp
        slot.last_update = Some(last.max(now));
        return 0;
    }

    slot.recharge_accumulator += elapsed / slot.spec.recharge_secs;
    let whole = slot.recharge_accumulator.floor();
    if whole < 1.0 {
        return 0;
    }
    slot.recharge_accumulator -= whole;

    let before = slot.remaining_uses;
    slot.remaining_uses = before
        .saturating_add(whole.min(i32::MAX as f32) as i32)
        .min(slot.max_uses);
    if slot.is_full() {
        slot.recharge_accumulator = 0.0;
    }
    slot.remaining_uses - before
}

/// Advance recharge on every slot. Returns total uses granted.
pub fn advance_all(slots: &mut [SlotState], now: NaiveDateTime) -> i32 {
    slots.iter_mut().map(|s| advance_recharge(s, now)).sum()
}
