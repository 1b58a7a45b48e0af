use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use hotbar_core::definitions::read_json;
use hotbar_core::{DefinitionStore, FsSource, MemorySource};
use hotbar_types::{ContributionPack, EngineConfig};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Logs go to `log_file` when it can be opened, otherwise to stderr so the
/// prompt on stdout stays readable.
pub fn init_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match log_file.and_then(open_log) {
        Some(file) => subscriber.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => subscriber.with_writer(std::io::stderr).init(),
    }
}

fn open_log(path: &Path) -> Option<File> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("cannot open log file {}: {e}", path.display());
            None
        }
    }
}

/// Load base definitions and every contribution pack named by the config.
///
/// Without a configured definitions root the built-in demo set is used.
pub fn build_store(config: &EngineConfig) -> DefinitionStore {
    let mut store = DefinitionStore::new();

    match &config.definitions_root {
        Some(root) => {
            let source = FsSource::new("base", root);
            store.load(&config.base_index, &source);
        }
        None => {
            tracing::info!("No definitions_root configured, loading demo definitions");
            let source = demo();
            store.load("index.json", &source);
            if let Err(e) = store.register_contribution_file(&source, "hotbar.json") {
                tracing::warn!(error = %e, "Demo contribution pack failed to load");
            }
        }
    }

    if let Some(root) = &config.contributions_root {
        store.register_contributions(contribution_packs(root, &config.contribution_file));
    }

    let stats = store.stats();
    tracing::info!(
        definitions = stats.definitions,
        patches = stats.patches,
        shorthand = stats.shorthand,
        indexes = stats.indexes_visited,
        "Definitions loaded"
    );
    store
}

/// One pack per sub-directory of `root` that contains `file_name`.
fn contribution_packs(root: &Path, file_name: &str) -> Vec<(FsSource, ContributionPack)> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %root.display(), error = %e, "Cannot read contributions directory");
            return Vec::new();
        }
    };

    let mut packs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || !path.join(file_name).is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let source = FsSource::new(name, &path);
        match read_json::<ContributionPack>(&source, file_name) {
            Ok(pack) => packs.push((source, pack)),
            Err(e) => tracing::warn!(error = %e, "Skipping contribution pack"),
        }
    }
    packs
}

pub fn demo() -> MemorySource {
    MemorySource::new("demo")
        .with("index.json", r#"{ "Weapons": ["staff.json"] }"#)
        .with(
            "staff.json",
            r#"{
                "ItemId": "Weapon_Staff_Oak",
                "AbilityBar": "Hud/AbilityBar_Staff.ui",
                "AbilitySlots": [
                    { "Key": "Q", "ID": "Fireball", "Plugin": true, "MaxUses": 3, "RechargeSecs": 5 },
                    { "Key": "E", "ID": "Blink", "Plugin": true, "CooldownSecs": 2 },
                    { "Key": "R", "ID": "Potion", "Plugin": true, "Consume": true, "AbilityValue": 20 },
                    { "Key": "F", "ID": "Dash", "RootInteraction": "Root_Dash", "MaxUses": 2 },
                    { "Key": "G", "ID": "command:say {player} rallies the party", "MaxUses": 1 }
                ]
            }"#,
        )
        .with(
            "hotbar.json",
            r#"{
                "Overrides": { "Weapon_Staff_Twin": "Weapon_Staff_Oak" },
                "OverrideList": [
                    {
                        "ItemId": "Weapon_Staff_Ember",
                        "UseDefinition": "Weapon_Staff_Oak",
                        "SlotOverrides": { "1": { "MaxUses": 6, "PowerMultiplier": 1.5 } }
                    }
                ]
            }"#,
        )
}
