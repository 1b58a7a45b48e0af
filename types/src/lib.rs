//! Shared document and configuration types for the ability hotbar engine.
//!
//! Everything in this crate is plain serde data: the JSON documents that
//! describe weapons, indexes and contribution packs, plus the engine
//! configuration persisted on disk. Behavior lives in `hotbar-core`.

pub mod config;
pub mod documents;
pub mod formatting;

pub use config::EngineConfig;
pub use documents::{
    ContributionPack, IndexDocument, OverrideDocument, SlotDocument, SlotPatch, WeaponDocument,
    SLOT_COUNT,
};
