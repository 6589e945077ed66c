//! chatmap server binary.
//! Run with: cargo run --bin chatmap-server

use std::process::ExitCode;

use chatmap::start_chatmap;

fn main() -> ExitCode {
    start_chatmap::run()
}
