//! Player chat commands.
//!
//! Commands reply with chat lines through [`Host::send_message`]; they never
//! fail in any other way.

use chrono::NaiveDateTime;

use crate::engine::Engine;
use crate::host::Host;
use crate::player::PlayerId;

pub const TOGGLEBAR: &str = "togglebar";
pub const DEBUGBAR: &str = "debugbar";

/// Open or close the bar for the held weapon.
pub fn togglebar(engine: &mut Engine, player: PlayerId, host: &dyn Host, now: NaiveDateTime) {
    let decision = engine.toggle_bar(player, host, now);
    let reply = if !decision.consumed {
        "You are not holding a weapon with abilities."
    } else if engine.state(player).is_some_and(|state| state.enabled) {
        "Ability bar enabled."
    } else {
        "Ability bar disabled."
    };
    host.send_message(player, reply);
}

/// Dump the live counters of all nine slots.
pub fn debugbar(engine: &mut Engine, player: PlayerId, host: &dyn Host, now: NaiveDateTime) {
    for line in engine.debug_lines(player, now) {
        host.send_message(player, &line);
    }
}

/// Run a command by name, ignoring a leading `/`.
///
/// Returns `false` if the name is not one of ours.
pub fn run(engine: &mut Engine, player: PlayerId, host: &dyn Host, name: &str, now: NaiveDateTime) -> bool {
    let name = name.trim().trim_start_matches('/');
    if name.eq_ignore_ascii_case(TOGGLEBAR) {
        togglebar(engine, player, host, now);
    } else if name.eq_ignore_ascii_case(DEBUGBAR) {
        debugbar(engine, player, host, now);
    } else {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::definitions::{DefinitionStore, MemorySource};
    use crate::dispatch::AbilityDispatcher;
    use crate::host::ItemStack;
    use crate::test_support::{RecordingHost, t0};
    use hotbar_types::EngineConfig;

    const P: PlayerId = PlayerId(3);

    fn engine() -> Engine {
        let source = MemorySource::new("base")
            .with("index.json", r#"{ "Weapons": ["staff.json"] }"#)
            .with(
                "staff.json",
                r#"{ "ItemId": "Staff", "AbilityBar": "Hud/Staff.ui",
                     "AbilitySlots": [ { "ID": "Bolt", "MaxUses": 3 }, { "ID": "Blink" } ] }"#,
            );
        let mut store = DefinitionStore::new();
        store.load("index.json", &source);
        Engine::new(Arc::new(store), AbilityDispatcher::new(), &EngineConfig::default())
    }

    #[test]
    fn test_togglebar_replies() {
        let mut engine = engine();
        let host = RecordingHost::new();

        assert!(run(&mut engine, P, &host, "/togglebar", t0()));
        host.set_held(Some(ItemStack::new("Staff", 1)));
        assert!(run(&mut engine, P, &host, "togglebar", t0()));
        assert!(run(&mut engine, P, &host, "TOGGLEBAR", t0()));

        assert_eq!(
            host.messages(),
            vec![
                "You are not holding a weapon with abilities.".to_string(),
                "Ability bar enabled.".to_string(),
                "Ability bar disabled.".to_string(),
            ]
        );
    }

    #[test]
    fn test_debugbar_lists_every_slot() {
        let mut engine = engine();
        let host = RecordingHost::new().holding(ItemStack::new("Staff", 1));
        togglebar(&mut engine, P, &host, t0());

        let before = host.messages().len();
        debugbar(&mut engine, P, &host, t0());
        let lines = &host.messages()[before..];

        assert_eq!(lines.len(), 10);
        assert!(lines[0].starts_with("Bar Staff (Hud/Staff.ui) enabled=true selected=1"));
        assert_eq!(lines[1], "[1] Bolt uses=3/3 cd=ready (0%) power=x1.00");
        assert_eq!(lines[2], "[2] Blink uses=inf cd=ready (0%) power=x1.00");
        assert_eq!(lines[9], "[9] -");
    }

    #[test]
    fn test_unknown_command() {
        let mut engine = engine();
        let host = RecordingHost::new();
        assert!(!run(&mut engine, P, &host, "kill", t0()));
        assert!(host.messages().is_empty());
    }
}
