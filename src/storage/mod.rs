//! # Storage Layer
//!
//! Persistence for Novel Notes.
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Library | Pretty-printed JSON | `novel_notes.json` (or `--file`) |
//! | Config | TOML | `<config dir>/novel-notes/config.toml` |
//!
//! ## Concurrency
//!
//! Single writer only. Each run loads the whole library once and saves it
//! once (temp file + rename). Concurrent runs are not coordinated and the
//! last save wins.

mod json;
mod config;

pub use json::{LibraryStore, StoreError, DEFAULT_FILE_NAME};
pub use config::{Config, ConfigError, DefaultFormat};
