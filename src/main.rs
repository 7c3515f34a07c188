//! envgen CLI entry point
//!
//! Parses the command line, runs the generation pipeline and renders any
//! failure as a user-friendly error before exiting with status 1.

use clap::Parser;
use envgen_cli::cli;
use envgen_cli::core::error::user_friendly_error;

fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute() {
        // Convert to user-friendly error with context and suggestions
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        std::process::exit(1);
    }
}
