// src/config/mod.rs

//! Configuration loading and validation for rosterboard.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate categories and timings into a [`ConfigFile`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    CategoryConfig, ConfigFile, DiscordSection, NamesSection, RawCategory, RawConfigFile,
    SchedulerSection, StoreSection,
};
pub use validate::parse_color;
