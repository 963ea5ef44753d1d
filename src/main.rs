//! Binary entrypoint for the Wingman terminal client.

use std::process::ExitCode;

use wingman::start_wingman;

/// Start the chat client against the configured endpoint.
fn main() -> ExitCode {
    start_wingman::run()
}
