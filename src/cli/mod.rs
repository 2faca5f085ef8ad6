//! # Command-Line Interface
//!
//! User-facing commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Commands |
//! |-------|----------|
//! | Browse | `list`, `list-books`, `view-book`, `view-history` |
//! | Build | `add-bookcase`, `add-shelf`, `add-book`, `add-item` |
//! | Check off | `complete-item` |
//! | Maintenance | `rollover` |
//!
//! Free-text arguments (names, item text) are all trailing words joined by
//! single spaces:
//! ```bash
//! novel-notes add-item 1 1 1 Write the opening chapter
//! ```
//!
//! ## Output Formats
//!
//! `--format` (like every option) goes before the command name:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod render;
mod library_cmd;

pub use app::{run, Cli, Commands, RunClock, BANNER};
pub use output::{Output, OutputFormat};
