//! Purpose: `linkstack` CLI entry point.
//! Role: Binary crate root; parses args, initialises logging, runs commands.
//! Invariants: Script output goes to stdout (text lines or JSON lines per `--format`).
//! Invariants: Errors go to stderr, as text on a terminal and JSON otherwise.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod report;
mod runner;
mod script;

use linkstack::api::{Error, ErrorKind, to_exit_code};
use report::Event;

/// Width of the reference `int` item.
const DEFAULT_ELEMENT_SIZE: usize = 4;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `linkstack --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    init_tracing(cli.log_level.as_deref(), color_mode).map_err(|err| (err, color_mode))?;

    command_dispatch::dispatch_command(cli.command, cli.format)
        .map_err(add_io_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "linkstack",
    version,
    about = "Drive a linked-list LIFO stack from text scripts",
    long_about = None,
    after_help = r#"SCRIPT OPERATIONS
  push <int|null>     copy an item onto the stack
  emplace <int|null>  hand a heap buffer to the stack
  pop | destroy       remove the top item | every item
  peek | size | empty | print

EXAMPLES
  $ linkstack demo
  $ printf 'push 500\npush 1000\nprint\n' | linkstack run
  $ linkstack --format json run fixture.script"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize error and log output"
    )]
    color: ColorMode,
    #[arg(
        long,
        global = true,
        default_value = "text",
        value_enum,
        help = "Output format for script events"
    )]
    format: OutputFormat,
    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter written to stderr (default: RUST_LOG, else warn)"
    )]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run a script file (stdin when omitted or `-`)")]
    Run {
        #[arg(value_name = "SCRIPT")]
        script: Option<PathBuf>,
        #[arg(
            long,
            default_value_t = DEFAULT_ELEMENT_SIZE,
            help = "Bytes per stack element (1..=8)"
        )]
        element_size: usize,
        #[arg(long, help = "Exit non-zero if any operation failed")]
        strict: bool,
    },
    #[command(about = "Run the built-in reference scenario")]
    Demo {
        #[arg(
            long,
            default_value_t = DEFAULT_ELEMENT_SIZE,
            help = "Bytes per stack element (2..=8)"
        )]
        element_size: usize,
    },
    #[command(about = "Print version")]
    Version,
}

/// An explicit `--log-level` must parse; a malformed `RUST_LOG` falls back to `warn`.
fn init_tracing(filter: Option<&str>, color_mode: ColorMode) -> Result<(), Error> {
    let env_filter = match filter {
        Some(filter) => EnvFilter::try_new(filter).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid --log-level filter `{filter}`"))
                .with_hint("Use a tracing filter such as `warn` or `linkstack=debug`.")
                .with_source(err)
        })?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(color_mode.use_color(io::stderr().is_terminal()))
        .with_writer(io::stderr)
        .try_init();
    Ok(())
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("Check that the script path exists and is readable.")
}

fn emit_events(events: &[Event], format: OutputFormat) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in events {
        let line = match format {
            OutputFormat::Text => event.text(),
            OutputFormat::Json => serde_json::to_string(event).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("json encode failed")
                    .with_source(err)
            })?,
        };
        writeln!(out, "{line}").map_err(stdout_error)?;
    }
    out.flush().map_err(stdout_error)
}

fn stdout_error(err: io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write output")
        .with_hint("Check that stdout is writable.")
        .with_source(err)
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::InvalidArgument => "invalid argument".to_string(),
        ErrorKind::Empty => "stack is empty".to_string(),
        ErrorKind::AllocationFailure => "allocation failed".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));
    if let Some(line) = err.line() {
        lines.push(format!(
            "{} {line}",
            colorize_label("line:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{Cli, ColorMode, Command, OutputFormat, error_json, error_text, init_tracing};
    use clap::Parser;
    use linkstack::api::{Error, ErrorKind};

    #[test]
    fn error_text_respects_color_flag() {
        let err = Error::new(ErrorKind::Usage).with_message("bad input");
        let colored = error_text(&err, true);
        let plain = error_text(&err, false);
        assert!(colored.contains("\u{1b}[31merror:\u{1b}[0m"));
        assert!(plain.contains("error: bad input"));
        assert!(!plain.contains("\u{1b}["));
    }

    #[test]
    fn error_json_carries_line_hint_and_causes() {
        let parse_err = "x".parse::<i64>().expect_err("not a number");
        let err = Error::new(ErrorKind::Usage)
            .with_message("invalid integer item `x`")
            .with_hint("use digits")
            .with_line(4)
            .with_source(parse_err);
        let value = error_json(&err);
        let inner = &value["error"];
        assert_eq!(inner["kind"], "Usage");
        assert_eq!(inner["line"], 4);
        assert_eq!(inner["hint"], "use digits");
        assert_eq!(inner["causes"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn run_defaults_to_four_byte_elements() {
        let cli = Cli::try_parse_from(["linkstack", "run"]).expect("parse");
        assert_eq!(cli.format, OutputFormat::Text);
        match cli.command {
            Command::Run {
                script,
                element_size,
                strict,
            } => {
                assert!(script.is_none());
                assert_eq!(element_size, 4);
                assert!(!strict);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn malformed_log_filter_is_usage_error() {
        for filter in ["nonsense=[", "foo=notalevel"] {
            let err = init_tracing(Some(filter), ColorMode::Never).expect_err(filter);
            assert_eq!(err.kind(), ErrorKind::Usage, "{filter}");
            assert!(err.hint().is_some());
            assert!(err.message().is_some_and(|msg| msg.contains(filter)));
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["linkstack", "demo", "--format", "json"]).expect("parse");
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
