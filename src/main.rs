use clap::Parser;
use orquestaconvert::cli::{commands, Args};
use orquestaconvert::logging;
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match commands::execute(&args) {
        Ok(failures) => ExitCode::from(failures.clamp(0, u8::MAX as i32) as u8),
        Err(e) => {
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "ERROR: {}", e);
            for suggestion in &e.recovery_suggestions {
                let _ = writeln!(stderr, "  hint: {}", suggestion);
            }
            ExitCode::FAILURE
        }
    }
}
