//! Purpose: Hold top-level CLI command dispatch for `linkstack`.
//! Exports: `dispatch_command`, `DEMO_SCRIPT`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Scripts are fully parsed before the stack is created.
//! Invariants: Operation failures only change the exit code under `--strict`.

use std::fs;
use std::io::Read;
use std::path::Path;

use super::*;
use linkstack::api::ByteStack;

/// Reference scenario: emptiness checks, two pushes and pops, then an emplace.
pub(crate) const DEMO_SCRIPT: &str = "\
empty
size
push 500
push 1000
print
pop
print
pop
print
emplace 500
print
pop
print
";

/// Narrowest width that holds every item in `DEMO_SCRIPT`.
const DEMO_MIN_ELEMENT_SIZE: usize = 2;

pub(super) fn dispatch_command(
    command: Command,
    format: OutputFormat,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Version => {
            println!("linkstack {}", env!("CARGO_PKG_VERSION"));
            Ok(RunOutcome::ok())
        }
        Command::Demo { element_size } => {
            check_demo_width(element_size)?;
            run_script(DEMO_SCRIPT, element_size, format)?;
            Ok(RunOutcome::ok())
        }
        Command::Run {
            script,
            element_size,
            strict,
        } => {
            let text = read_script(script.as_deref())?;
            let first_failure = run_script(&text, element_size, format)?;
            match first_failure {
                Some(kind) if strict => Ok(RunOutcome::with_code(to_exit_code(kind))),
                _ => Ok(RunOutcome::ok()),
            }
        }
    }
}

fn run_script(
    text: &str,
    element_size: usize,
    format: OutputFormat,
) -> Result<Option<ErrorKind>, Error> {
    let steps = script::parse_script(text, element_size)?;
    let mut stack = ByteStack::new(element_size)?;
    tracing::debug!(steps = steps.len(), element_size, "running script");
    let outcome = runner::execute(&mut stack, &steps);
    emit_events(&outcome.events, format)?;
    Ok(outcome.first_failure)
}

fn check_demo_width(element_size: usize) -> Result<(), Error> {
    if (DEMO_MIN_ELEMENT_SIZE..=script::MAX_ITEM_WIDTH).contains(&element_size) {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Usage)
        .with_message(format!(
            "demo needs --element-size {DEMO_MIN_ELEMENT_SIZE}..={}, got {element_size}",
            script::MAX_ITEM_WIDTH
        ))
        .with_hint("The demo pushes 1000, which needs at least 2 bytes."))
}

fn read_script(path: Option<&Path>) -> Result<String, Error> {
    match path {
        None => read_stdin(),
        Some(path) if path.as_os_str() == "-" => read_stdin(),
        Some(path) => fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read script {}", path.display()))
                .with_source(err)
        }),
    }
}

fn read_stdin() -> Result<String, Error> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read script from stdin")
            .with_source(err)
    })?;
    Ok(text)
}
