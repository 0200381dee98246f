//! Binary entrypoint for the `chat-history` command-line tool.

use std::process::ExitCode;

use chat_history::cli;

/// Run the CLI and report failures through the exit code.
fn main() -> ExitCode {
    cli::run()
}
