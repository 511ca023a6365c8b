// script_runner/src/main.rs

use std::process::ExitCode;

use script_runner::commands;

fn main() -> ExitCode {
    match commands::run_cli() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
