//! End-to-end tests driving the engine the way a host would.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use hotbar_types::EngineConfig;

use crate::definitions::{DefinitionStore, MemorySource};
use crate::dispatch::{
    AbilityDispatcher, AbilityHandler, ChargedEffectHandler, DispatchOutcome, HandlerContext,
    PackagedAbility,
};
use crate::engine::Engine;
use crate::error::HandlerError;
use crate::host::ItemStack;
use crate::input::{InputDecision, InputEvent, InventorySection};
use crate::player::{PlayerId, Uses};
use crate::test_support::{RecordingHost, t0};

const P: PlayerId = PlayerId(42);

fn store() -> DefinitionStore {
    let source = MemorySource::new("base")
        .with("index.json", r#"{ "Includes": ["weapons/index.json"] }"#)
        .with("weapons/index.json", r#"{ "Weapons": ["weapons/staff.json"] }"#)
        .with(
            "weapons/staff.json",
            r#"{
                "ItemId": "Staff",
                "AbilityBar": "Hud/Staff.ui",
                "AbilitySlots": [
                    { "ID": "Bolt", "Plugin": true, "MaxUses": 3 },
                    { "ID": "Potion", "Plugin": true, "Consume": true },
                    { "ID": "Mend", "Plugin": true, "MaxUses": 2, "RechargeSecs": 2.0 }
                ]
            }"#,
        );
    let mut store = DefinitionStore::new();
    store.load("index.json", &source);
    store
}

fn effects() -> ChargedEffectHandler {
    ChargedEffectHandler::new()
        .with_fn("Bolt", |_, _| Ok(()))
        .with_fn("Potion", |_, _| Ok(()))
        .with_fn("Mend", |_, _| Ok(()))
}

fn engine_with(dispatcher: AbilityDispatcher) -> Engine {
    Engine::new(Arc::new(store()), dispatcher, &EngineConfig::default())
}

fn engine() -> Engine {
    engine_with(AbilityDispatcher::new().with_handler(effects()))
}

fn at(millis: i64) -> NaiveDateTime {
    t0() + Duration::milliseconds(millis)
}

fn select(slot: u8, received_at: NaiveDateTime) -> InputEvent {
    InputEvent::SlotSelect {
        slot,
        section: InventorySection::Hotbar,
        received_at,
    }
}

/// Host holding the staff with the bar already open.
fn open_bar(engine: &mut Engine) -> RecordingHost {
    let host = RecordingHost::new().holding(ItemStack::new("Staff", 2));
    host.set_active(8);
    assert!(engine.toggle_bar(P, &host, t0()).consumed);
    assert!(engine.state(P).unwrap().enabled);
    host
}

#[test]
fn test_unregistered_item_toggle_passes_through() {
    let mut engine = engine();
    let host = RecordingHost::new().holding(ItemStack::new("Stick", 1));

    let decision = engine.toggle_bar(P, &host, t0());
    assert_eq!(decision, InputDecision::pass());
    assert!(!engine.state(P).unwrap().enabled);
    assert_eq!(host.hud(), None);
}

#[test]
fn test_three_use_slot_exhausts() {
    let mut engine = engine();
    let host = open_bar(&mut engine);

    for press in 1..=3 {
        let decision = engine.handle_input(P, select(0, at(press * 1000)), &host);
        assert!(decision.is_handled(), "press {press} should fire");
    }
    assert_eq!(
        engine.state(P).unwrap().slots[0].uses(),
        Uses::Limited { remaining: 0, max: 3 }
    );

    let fourth = engine.handle_input(P, select(0, at(4000)), &host);
    assert!(fourth.consumed);
    assert_eq!(fourth.outcome, Some(DispatchOutcome::NotHandled));
}

#[test]
fn test_echo_within_window_is_swallowed() {
    let mut engine = engine();
    let host = open_bar(&mut engine);

    let press = engine.handle_input(P, select(0, at(1000)), &host);
    assert!(press.is_handled());
    assert_eq!(host.slot_sets(), vec![8]);

    // Echo of the forced restore to slot 8
    let echo = engine.handle_input(P, select(8, at(1250)), &host);
    assert_eq!(echo, InputDecision::consume());
    assert_eq!(engine.state(P).unwrap().selected_slot(), 1);
}

#[test]
fn test_echo_after_window_dispatches() {
    let mut engine = engine();
    let host = open_bar(&mut engine);

    engine.handle_input(P, select(0, at(1000)), &host);
    let late = engine.handle_input(P, select(8, at(1251)), &host);
    assert_eq!(late.dispatch, Some(9));
    // Slot 9 is empty, so nothing handles it
    assert_eq!(late.outcome, Some(DispatchOutcome::NotHandled));
}

struct Exploding;

impl AbilityHandler for Exploding {
    fn name(&self) -> &str {
        "Exploding"
    }

    fn handle_ability(
        &self,
        _ability: &PackagedAbility,
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<bool, HandlerError> {
        panic!("handler blew up")
    }
}

#[test]
fn test_panicking_handler_does_not_block_chain() {
    let mut engine = engine_with(
        AbilityDispatcher::new()
            .with_handler(Exploding)
            .with_handler(effects()),
    );
    let host = open_bar(&mut engine);

    let decision = engine.handle_input(P, select(0, at(1000)), &host);
    assert_eq!(
        decision.outcome,
        Some(DispatchOutcome::Handled {
            by: "ChargedEffect".into()
        })
    );
    assert!(host.messages().contains(&"[Exploding] Panic".to_string()));
    assert_eq!(engine.state(P).unwrap().slots[0].remaining_uses, 2);
}

#[test]
fn test_consume_reduces_held_stack_then_closes_bar() {
    let mut engine = engine();
    let host = open_bar(&mut engine);

    assert!(engine.handle_input(P, select(1, at(1000)), &host).is_handled());
    assert_eq!(host.replaced(), vec![(8, Some(ItemStack::new("Staff", 1)))]);

    assert!(engine.handle_input(P, select(1, at(2000)), &host).is_handled());
    assert_eq!(host.replaced().last(), Some(&(8, None)));

    // The weapon is gone, so the next select falls through to the host
    let decision = engine.handle_input(P, select(1, at(3000)), &host);
    assert_eq!(decision, InputDecision::pass());
    assert!(!engine.state(P).unwrap().enabled);
}

#[test]
fn test_recharge_on_tick() {
    let mut engine = engine();
    let host = open_bar(&mut engine);

    assert!(engine.handle_input(P, select(2, at(0)), &host).is_handled());
    assert!(engine.handle_input(P, select(2, at(0)), &host).is_handled());
    assert!(!engine.handle_input(P, select(2, at(0)), &host).is_handled());

    assert_eq!(engine.tick(at(3000)), 1);
    assert_eq!(engine.state(P).unwrap().slots[2].remaining_uses, 1);
    assert_eq!(engine.tick(at(10_000)), 1);
    assert_eq!(engine.state(P).unwrap().slots[2].remaining_uses, 2);
}

#[test]
fn test_held_item_change_closes_bar() {
    let mut engine = engine();
    let host = open_bar(&mut engine);
    let gate = engine.packet_gate();

    host.set_held(Some(ItemStack::new("Stick", 1)));
    engine.held_item_changed(P, &host);

    let state = engine.state(P).unwrap();
    assert!(!state.enabled);
    assert!(!state.has_bar());
    assert_eq!(host.hud(), None);
    assert!(!gate.filter(P, select(3, at(1000))));
}

#[test]
fn test_packet_gate_round_trip() {
    let mut engine = engine();
    let host = RecordingHost::new().holding(ItemStack::new("Staff", 1));
    host.set_active(8);
    let gate = engine.packet_gate();

    // Bar closed: slot-selects belong to the host
    assert!(!gate.filter(P, select(0, at(0))));

    let toggle = InputEvent::AbilityToggle {
        item_id: Some("Staff".into()),
        received_at: at(0),
    };
    assert!(gate.filter(P, toggle));
    assert!(engine.state(P).is_none());
    assert_eq!(engine.run_pending(&host), 1);
    assert!(engine.state(P).unwrap().enabled);

    assert!(gate.filter(P, select(0, at(1000))));
    assert_eq!(engine.run_pending(&host), 1);
    assert_eq!(engine.state(P).unwrap().slots[0].remaining_uses, 2);
}

#[test]
fn test_gate_consumed_select_reapplied_when_world_passes() {
    let mut engine = engine();
    let host = open_bar(&mut engine);
    let gate = engine.packet_gate();

    assert!(gate.filter(P, select(4, at(1000))));
    host.set_held(None);
    engine.run_pending(&host);

    assert!(!engine.state(P).unwrap().enabled);
    assert_eq!(host.slot_sets(), vec![4]);
    assert!(!gate.filter(P, select(4, at(2000))));
}

#[test]
fn test_power_multiplier_reaches_handler() {
    let seen = Arc::new(std::sync::Mutex::new(None));
    let record = Arc::clone(&seen);
    let handler = ChargedEffectHandler::new().with_fn("Bolt", move |ability, _| {
        *record.lock().unwrap() = Some(ability.power_multiplier);
        Ok(())
    });
    let mut engine = engine_with(AbilityDispatcher::new().with_handler(handler));
    let host = open_bar(&mut engine);
    engine.state_mut(P).set_power_multiplier(2.0);

    assert!(engine.handle_input(P, select(0, at(1000)), &host).is_handled());
    assert_eq!(*seen.lock().unwrap(), Some(2.0));
}

struct Recorder(Arc<std::sync::Mutex<usize>>);

impl AbilityHandler for Recorder {
    fn name(&self) -> &str {
        "Recorder"
    }

    fn handle_ability(
        &self,
        _ability: &PackagedAbility,
        _ctx: &mut HandlerContext<'_>,
    ) -> Result<bool, HandlerError> {
        *self.0.lock().unwrap() += 1;
        Ok(true)
    }
}

#[test]
fn test_huge_cooldown_fires_once() {
    let source = MemorySource::new("base")
        .with("index.json", r#"{ "Weapons": ["staff.json"] }"#)
        .with(
            "staff.json",
            r#"{
                "ItemId": "Staff",
                "AbilityBar": "Hud/Staff.ui",
                "AbilitySlots": [
                    { "ID": "Bolt", "Plugin": true, "MaxUses": 3, "CooldownSecs": 1e13 }
                ]
            }"#,
        );
    let mut store = DefinitionStore::new();
    store.load("index.json", &source);

    let later = Arc::new(std::sync::Mutex::new(0));
    let dispatcher = AbilityDispatcher::new()
        .with_handler(ChargedEffectHandler::new().with_fn("Bolt", |_, _| Ok(())))
        .with_handler(Recorder(Arc::clone(&later)));
    let mut engine = Engine::new(Arc::new(store), dispatcher, &EngineConfig::default());
    let host = open_bar(&mut engine);

    let decision = engine.handle_input(P, select(0, at(1000)), &host);
    assert_eq!(
        decision.outcome,
        Some(DispatchOutcome::Handled {
            by: "ChargedEffect".into()
        })
    );
    assert_eq!(*later.lock().unwrap(), 0);
    assert!(host.messages().is_empty());
    let state = engine.state(P).unwrap();
    assert_eq!(state.slots[0].remaining_uses, 2);
    assert!(state.slots[0].cooldown_until.is_some());
}
