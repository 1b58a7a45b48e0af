mod console;
mod setup;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDateTime, TimeDelta};
use clap::{Parser, Subcommand};
use hotbar_core::{
    AbilityDispatcher, CommandHandler, Engine, Host, InputEvent, InventorySection, ItemStack,
    PacketGate, PlayerId, RootInteractionHandler, commands,
};

use console::{ConsoleExecutor, ConsoleHost};

const PLAYER: PlayerId = PlayerId(1);

/// Everything one REPL session drives.
struct Session {
    engine: Engine,
    gate: PacketGate,
    host: ConsoleHost,
    /// Simulated server clock; only `wait` moves it
    clock: NaiveDateTime,
}

/// Startup flags; everything after launch is typed at the prompt.
#[derive(Parser)]
#[command(version, about = "ability hotbar console")]
struct Launch {
    /// Append logs to this file instead of stderr (falls back to HOTBAR_LOG_PATH)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Load definitions from this directory instead of the configured root
    #[arg(long)]
    definitions: Option<PathBuf>,
}

fn main() -> Result<(), String> {
    let launch = Launch::parse();
    let log_path = launch
        .log
        .or_else(|| std::env::var_os("HOTBAR_LOG_PATH").map(PathBuf::from));
    setup::init_logging(log_path.as_deref());

    let mut config = hotbar_core::load_config_or_default();
    if launch.definitions.is_some() {
        config.definitions_root = launch.definitions;
    }
    let store = Arc::new(setup::build_store(&config));

    let dispatcher = AbilityDispatcher::new()
        .with_handler(CommandHandler::new(Arc::new(ConsoleExecutor)))
        .with_handler(RootInteractionHandler)
        .with_handler(console::demo_effects());
    let engine = Engine::new(store, dispatcher, &config);

    let mut session = Session {
        gate: engine.packet_gate(),
        engine,
        host: ConsoleHost::new(),
        clock: chrono::Local::now().naive_local(),
    };

    loop {
        let Some(line) = readline()? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &mut session) {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

/// Next input line, or `None` once stdin is closed.
fn readline() -> Result<Option<String>, String> {
    write!(std::io::stdout(), "$ ").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    read_line_from(&mut std::io::stdin().lock())
}

fn read_line_from(input: &mut impl BufRead) -> Result<Option<String>, String> {
    let mut buffer = String::new();
    let read = input.read_line(&mut buffer).map_err(|e| e.to_string())?;
    Ok((read > 0).then_some(buffer))
}

#[derive(Parser)]
#[command(version, about = "ability hotbar console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Put an item in the active hotbar slot
    Hold {
        item: String,
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Empty the active hotbar slot
    Drop,
    /// Press the weapon-ability key
    Toggle,
    /// Press hotbar key 1-9
    Select { slot: u8 },
    Togglebar,
    Debugbar,
    /// Set the global power multiplier
    Power { multiplier: f32 },
    /// Advance the clock and tick recharge
    Wait { millis: i64 },
    Status,
    Exit,
}

fn respond(line: &str, session: &mut Session) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "hotbar".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Hold { item, count }) => {
            session.host.hold(Some(ItemStack::new(item, count)));
            session.engine.held_item_changed(PLAYER, &session.host);
        }
        Some(Commands::Drop) => {
            session.host.hold(None);
            session.engine.held_item_changed(PLAYER, &session.host);
        }
        Some(Commands::Toggle) => {
            let event = InputEvent::AbilityToggle {
                item_id: session.host.held_item(PLAYER).map(|stack| stack.item_id),
                received_at: session.clock,
            };
            send_packet(session, event);
        }
        Some(Commands::Select { slot }) => {
            if !(1..=9).contains(&slot) {
                return Err("error: slot must be 1-9\n".to_string());
            }
            let event = InputEvent::SlotSelect {
                slot: slot - 1,
                section: InventorySection::Hotbar,
                received_at: session.clock,
            };
            if !send_packet(session, event) {
                session.host.select_locally(slot - 1);
                session.engine.held_item_changed(PLAYER, &session.host);
            }
        }
        Some(Commands::Togglebar) => {
            commands::togglebar(&mut session.engine, PLAYER, &session.host, session.clock);
        }
        Some(Commands::Debugbar) => {
            commands::debugbar(&mut session.engine, PLAYER, &session.host, session.clock);
        }
        Some(Commands::Power { multiplier }) => {
            if !session.engine.state_mut(PLAYER).set_power_multiplier(multiplier) {
                return Err("error: multiplier must be positive\n".to_string());
            }
        }
        Some(Commands::Wait { millis }) => {
            session.clock = advance_clock(session.clock, millis)
                .ok_or("error: wait is too long\n")?;
            let granted = session.engine.tick(session.clock);
            if granted > 0 {
                println!("recharged {granted} use(s)");
            }
        }
        Some(Commands::Status) => println!("{}", session.host.describe()),
        Some(Commands::Exit) => return Ok(true),
        None => {}
    }

    deliver_echo(session);
    Ok(false)
}

/// Move the clock forward; negative waits are ignored.
fn advance_clock(clock: NaiveDateTime, millis: i64) -> Option<NaiveDateTime> {
    TimeDelta::try_milliseconds(millis.max(0)).and_then(|d| clock.checked_add_signed(d))
}

/// Run a packet through the gate as the I/O thread would, then drain the
/// world queue. Returns whether the gate consumed it.
fn send_packet(session: &mut Session, event: InputEvent) -> bool {
    if !session.gate.filter(PLAYER, event) {
        println!("(packet passed through)");
        return false;
    }
    session.engine.run_pending(&session.host);
    true
}

/// The client answers a forced slot change with its own slot-select.
fn deliver_echo(session: &mut Session) {
    let Some(slot) = session.host.take_pending_echo() else {
        return;
    };
    let event = InputEvent::SlotSelect {
        slot,
        section: InventorySection::Hotbar,
        received_at: session.clock,
    };
    if session.gate.filter(PLAYER, event) {
        session.engine.run_pending(&session.host);
        println!("[echo] slot {} handled by the bar", slot + 1);
    }
}
