//! Main CLI application structure
//!
//! Every run has the same shape: banner, load the library, run the daily
//! rollover, execute one command, save. The save happens even when the
//! command failed, was not recognized, or the command line did not parse.
//!
//! Options go before the command. Everything after the command name is
//! taken as positional text, so item text may start with a hyphen.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, SubsecRound};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use super::library_cmd;
use super::output::{Output, OutputFormat};
use crate::domain::{auto_rollover, parse_date};
use crate::storage::{Config, LibraryStore};

/// Binary name used in usage lines
pub const BIN: &str = "novel-notes";

/// Startup banner
pub const BANNER: &str = concat!("Novel Notes Version ", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Default)]
#[command(name = "novel-notes")]
#[command(author, version, about = "Daily checklists organized as bookcases, shelves and books")]
pub struct Cli {
    /// Output format (defaults to the configured format, else text)
    #[arg(long, short = 'f')]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Library file to use
    #[arg(long, env = "NOVEL_NOTES_FILE")]
    pub file: Option<PathBuf>,

    /// Date to treat as today (YYYY-MM-DD)
    #[arg(long, env = "NOVEL_NOTES_TODAY", hide = true, value_parser = parse_today)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// ID arguments are taken as text and validated by the command itself, so a
/// bad ID is reported like any other usage problem and the library is still
/// saved. Commands with a fixed number of arguments ignore any surplus.
#[derive(Subcommand)]
pub enum Commands {
    /// Show bookcases, shelves, and books
    List {
        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Show all books in the library
    ListBooks {
        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Add a bookcase
    #[command(disable_help_flag = true)]
    AddBookcase {
        /// Bookcase name
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        name: Vec<String>,
    },

    /// Add a shelf to a bookcase
    #[command(disable_help_flag = true)]
    AddShelf {
        #[arg(allow_hyphen_values = true)]
        bookcase_id: Option<String>,

        /// Shelf name
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        name: Vec<String>,
    },

    /// Add a book to a shelf
    #[command(disable_help_flag = true)]
    AddBook {
        #[arg(allow_hyphen_values = true)]
        bookcase_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        shelf_id: Option<String>,

        /// Book name
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        name: Vec<String>,
    },

    /// Add an item to today's page of a book
    #[command(disable_help_flag = true)]
    AddItem {
        #[arg(allow_hyphen_values = true)]
        bookcase_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        shelf_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        book_id: Option<String>,

        /// Item text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Show every page of a book
    ViewBook {
        #[arg(allow_hyphen_values = true)]
        bookcase_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        shelf_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        book_id: Option<String>,

        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Mark an item as completed
    CompleteItem {
        #[arg(allow_hyphen_values = true)]
        bookcase_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        shelf_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        book_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        item_id: Option<String>,

        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Show the history pages of a book
    ViewHistory {
        #[arg(allow_hyphen_values = true)]
        bookcase_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        shelf_id: Option<String>,

        #[arg(allow_hyphen_values = true)]
        book_id: Option<String>,

        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Show what today's rollover did
    Rollover {
        #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

impl Commands {
    /// Surplus arguments a fixed-arity command ignores
    pub fn ignored_args(&self) -> &[String] {
        match self {
            Commands::List { extra }
            | Commands::ListBooks { extra }
            | Commands::ViewBook { extra, .. }
            | Commands::CompleteItem { extra, .. }
            | Commands::ViewHistory { extra, .. }
            | Commands::Rollover { extra } => extra,
            _ => &[],
        }
    }
}

fn parse_today(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// A command line clap could not turn into a command
enum ParseOutcome {
    /// `--help`, `--version` or `help <command>`
    Info(String),
    Invalid(String),
}

impl ParseOutcome {
    fn from_clap(err: &clap::Error) -> Self {
        let rendered = err.to_string();
        if err.use_stderr() {
            let message = rendered.strip_prefix("error: ").unwrap_or(&rendered);
            ParseOutcome::Invalid(message.trim_end().to_string())
        } else {
            ParseOutcome::Info(rendered)
        }
    }
}

/// Parses the process arguments. On failure the options that did parse are
/// kept (falling back to environment and defaults) and no command runs.
fn parse_args() -> (Cli, Option<ParseOutcome>) {
    let args: Vec<OsString> = std::env::args_os().collect();

    match Cli::try_parse_from(&args) {
        Ok(cli) => (cli, None),
        Err(err) => {
            let outcome = ParseOutcome::from_clap(&err);
            let mut cli = recover_options(&args);
            cli.command = None;
            (cli, Some(outcome))
        }
    }
}

fn recover_options(args: &[OsString]) -> Cli {
    Cli::command()
        .ignore_errors(true)
        .try_get_matches_from(args)
        .ok()
        .and_then(|matches| Cli::from_arg_matches(&matches).ok())
        .or_else(|| Cli::try_parse_from([BIN]).ok())
        .unwrap_or_default()
}

/// Clock readings for one run
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    pub today: NaiveDate,
    pub now: DateTime<FixedOffset>,
}

impl RunClock {
    pub fn new(today_override: Option<NaiveDate>) -> Self {
        let now = Local::now().fixed_offset().trunc_subsecs(0);
        Self {
            today: today_override.unwrap_or_else(|| now.date_naive()),
            now,
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let (cli, parse_outcome) = parse_args();
    let config = Config::load();

    let format = cli.format.unwrap_or_else(|| {
        config
            .as_ref()
            .map(|c| OutputFormat::from(c.default_format))
            .unwrap_or_default()
    });
    let output = Output::new(format, cli.verbose);

    output.notice(BANNER);

    let config = config?;
    let store = LibraryStore::new(config.library_path(cli.file.as_deref()));
    output.verbose_ctx(
        "load",
        &format!(
            "Library file: {} (exists: {})",
            store.path().display(),
            store.exists()
        ),
    );

    let mut library = store.load().context("Failed to load library")?;

    let clock = RunClock::new(cli.today);
    output.verbose_ctx("rollover", &format!("Today is {}", clock.today));

    let report = auto_rollover(&mut library, clock.today);
    if report.performed {
        for entry in &report.books {
            output.verbose_ctx(
                "rollover",
                &format!(
                    "Book {} in shelf {} of bookcase {}: {:?}",
                    entry.book_id, entry.shelf_id, entry.bookcase_id, entry.transition
                ),
            );
        }
        output.verbose_ctx(
            "rollover",
            &format!("Carried {} item(s) to {}", report.migrated_items(), clock.today),
        );
        if !library.bookcases.is_empty() {
            output.notice(&format!("Auto rollover completed for {}", clock.today));
        }
    } else {
        output.verbose_ctx("rollover", "Already rolled over today, skipping");
    }

    match (cli.command, parse_outcome) {
        (_, Some(ParseOutcome::Info(text))) => print_help(&output, &text),
        (_, Some(ParseOutcome::Invalid(message))) => output.error(&message),
        (Some(command), None) => {
            library_cmd::run(command, &mut library, &report, &clock, &output)
        }
        (None, None) => {
            output.verbose("No command given");
            print_help(&output, &Cli::command().render_help().to_string());
        }
    }

    store
        .save(&library)
        .with_context(|| format!("Failed to save library to {}", store.path().display()))?;
    output.notice(&format!("Library saved to {}", store.path().display()));

    output.verbose("Run completed");
    Ok(())
}

fn print_help(output: &Output, help: &str) {
    let help = help.trim_end();
    if output.is_json() {
        eprintln!("{}", help);
    } else {
        println!("{}", help);
    }
}
