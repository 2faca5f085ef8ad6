//! Novel Notes - daily checklist journal

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = novel_notes::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
