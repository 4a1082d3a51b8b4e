use crate::cli::{Args, Command, ConvertArgs, ConvertPackArgs};
use crate::core::convert;
use crate::core::error::{AppError, ErrorCategory};
use crate::core::expressions::converter::Dialect;
use crate::pack;
use std::fs;
use std::io::Write;

/// Dispatch the parsed command line. The returned value becomes the
/// process exit code: zero on success, otherwise the number of files or
/// distinct issues that failed.
pub fn execute(args: &Args) -> Result<i32, AppError> {
    match &args.command {
        Command::Convert(convert_args) => run_convert(convert_args, args.verbose),
        Command::ConvertPack(pack_args) => run_convert_pack(pack_args, args.verbose),
    }
}

fn run_convert(args: &ConvertArgs, verbose: bool) -> Result<i32, AppError> {
    if args.validate {
        return run_validate(args, verbose);
    }

    if args.output.is_some() && args.files.len() > 1 {
        return Err(AppError::new(
            ErrorCategory::Structural,
            "--output accepts a single input file",
        )
        .with_code("WFC-CLI-001"));
    }

    let dialect = Dialect::from(args.expressions);
    let mut failures = 0;
    for file in &args.files {
        match convert::convert_file(file, dialect, args.force) {
            Ok(converted) => match &args.output {
                Some(output) => {
                    fs::write(output, converted).map_err(|e| {
                        AppError::from(e).with_context("path", output.display().to_string())
                    })?;
                }
                None => print!("{}", converted),
            },
            Err(e) => {
                failures += 1;
                report_error(&e, &file.display().to_string());
            }
        }
    }
    Ok(failures)
}

fn run_validate(args: &ConvertArgs, verbose: bool) -> Result<i32, AppError> {
    let mut failures = 0;
    for file in &args.files {
        match convert::validate_file(file) {
            Ok(()) => {
                if verbose {
                    println!("Successfully validated workflow from {}", file.display());
                }
            }
            Err(e) => {
                failures += 1;
                report_error(&e, &file.display().to_string());
            }
        }
    }
    Ok(failures)
}

fn run_convert_pack(args: &ConvertPackArgs, verbose: bool) -> Result<i32, AppError> {
    if let Some(runner_type) = &args.list_workflows {
        for entry in pack::workflow_files(&args.actions_dir, runner_type)? {
            println!(
                "{} --> {}",
                entry.action_file.display(),
                entry.workflow_file.display()
            );
        }
        return Ok(0);
    }

    if args.validate {
        let mut failures = 0;
        for entry in pack::workflow_files(&args.actions_dir, pack::ORQUESTA_RUNNER_TYPE)? {
            match convert::validate_file(&entry.workflow_file) {
                Ok(()) => {
                    if verbose {
                        println!(
                            "Successfully validated workflow from {}",
                            entry.workflow_file.display()
                        );
                    }
                }
                Err(e) => {
                    failures += 1;
                    report_error(&e, &entry.workflow_file.display().to_string());
                }
            }
        }
        return Ok(failures);
    }

    let report = pack::convert_pack(&args.actions_dir, Dialect::from(args.expressions), args.force)?;
    if !report.is_clean() {
        let _ = write!(std::io::stderr(), "{}", report.render());
    }
    Ok(report.distinct_failures() as i32)
}

fn report_error(error: &AppError, path: &str) {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "ERROR: {} ({})", error, path);
    for suggestion in &error.recovery_suggestions {
        let _ = writeln!(stderr, "  hint: {}", suggestion);
    }
}
