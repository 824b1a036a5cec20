//! Purpose: `tablejson` CLI entry point: reformat, import, and export JSON superset documents.
//! Role: Binary crate root; parses args, installs logging, runs commands, writes stdout.
//! Invariants: Command output goes to stdout and always ends with a newline.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde::Serialize;
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod constructors_file;

use tablejson::api::{Error, ErrorKind, to_exit_code};

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
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing(cli.verbose);
    let color_mode = cli.color;

    command_dispatch::dispatch_command(cli.command)
        .map_err(add_syntax_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "tablejson",
    version,
    about = "JSON superset codec with rational literals and typed objects",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Documents are JSON plus a few extensions:
  - `3r`, `-5/4r`, `1.25r` are exact rationals
  - `"@json_keys"` fixes the property order of an object
  - `"@json_constructor"` names a typed object built from its fields
"#,
    after_help = r#"EXAMPLES
  $ echo '{"b":1r,"a":2,"@json_keys":["b","a"]}' | tablejson fmt --pretty
  $ tablejson import data.json > data.tjson
  $ tablejson export data.tjson --constructors types.json

LEARN MORE
  $ tablejson <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        short = 'v',
        global = true,
        help = "Log codec activity to stderr (RUST_LOG overrides)"
    )]
    verbose: bool,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        global = true,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

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

#[derive(Args, Debug)]
struct InputArgs {
    #[arg(
        help = "Input file (default: stdin; `-` also reads stdin)",
        value_hint = ValueHint::FilePath
    )]
    file: Option<PathBuf>,
    #[arg(long, help = "Indent nested values with tabs, one element per line")]
    pretty: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Parse superset text and write it back out",
        long_about = r#"Parse a superset document and re-serialize it.

Objects without "@json_keys" fall back to a `toJSON` method, which plain
documents do not have, so keep the key list on every object."#,
        after_help = r#"EXAMPLES
  $ tablejson fmt doc.tjson --pretty
  $ tablejson fmt --strict-blank --max-depth 32 < doc.tjson
  $ tablejson fmt points.tjson --constructors types.json"#
    )]
    Fmt {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, help = "Treat newlines as syntax errors; only space and tab are blank")]
        strict_blank: bool,
        #[arg(long, value_name = "N", help = "Reject documents nested deeper than N")]
        max_depth: Option<usize>,
        #[arg(
            long,
            value_name = "FILE",
            help = "JSON file declaring record constructors",
            value_hint = ValueHint::FilePath
        )]
        constructors: Option<PathBuf>,
    },
    #[command(
        about = "Convert standard JSON to superset text",
        long_about = r#"Read standard JSON and write superset text.

Integers become exact rationals and every object records its source key
order in "@json_keys"."#,
        after_help = r#"EXAMPLES
  $ tablejson import data.json
  $ curl -s https://example.test/data.json | tablejson import --pretty"#
    )]
    Import {
        #[command(flatten)]
        input: InputArgs,
    },
    #[command(
        about = "Convert superset text to standard JSON",
        long_about = r#"Read superset text and write standard JSON.

Integral rationals become integers and the rest become floats. "@json_keys"
is dropped; "@json_constructor" is kept."#,
        after_help = r#"EXAMPLES
  $ tablejson export doc.tjson --pretty
  $ tablejson export points.tjson --constructors types.json"#
    )]
    Export {
        #[command(flatten)]
        input: InputArgs,
        #[arg(
            long,
            value_name = "FILE",
            help = "JSON file declaring record constructors",
            value_hint = ValueHint::FilePath
        )]
        constructors: Option<PathBuf>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ tablejson completion bash > ~/.local/share/bash-completion/completions/tablejson
  $ tablejson completion zsh > ~/.zfunc/_tablejson
  $ tablejson completion fish > ~/.config/fish/completions/tablejson.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Reads the whole input and drops trailing line terminators.
fn read_input(path: Option<&Path>) -> Result<Vec<u8>, Error> {
    let mut bytes = match path {
        Some(path) if path != Path::new("-") => fs::read(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read {}", path.display()))
                .with_source(err)
        })?,
        _ => {
            let mut bytes = Vec::new();
            io::stdin().lock().read_to_end(&mut bytes).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            bytes
        }
    };
    let trimmed = trim_line_terminators(&bytes).len();
    bytes.truncate(trimmed);
    Ok(bytes)
}

fn trim_line_terminators(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| *byte != b'\n' && *byte != b'\r')
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}

fn write_output(bytes: &[u8]) -> Result<(), Error> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(bytes)
        .and_then(|()| stdout.write_all(b"\n"))
        .and_then(|()| stdout.flush())
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write output")
                .with_source(err)
        })
}

fn add_syntax_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Syntax => err.with_hint("Check the input near the reported byte offset."),
        ErrorKind::DepthLimit => err.with_hint("Raise --max-depth or flatten the document."),
        ErrorKind::Unrepresentable => err.with_hint(
            "Standard JSON has no form for this value; use `fmt` to keep it as superset text.",
        ),
        _ => err,
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Io || err.hint().is_some() {
        return err;
    }
    err.with_hint("I/O error. Check the path and file permissions.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with --verbose and share the input if it persists.",
    )
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn paint(text: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return text.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{text}\u{1b}[0m")
}

/// One rendered failure, shared by the terminal and JSON forms.
#[derive(Debug, Serialize)]
struct Diagnostic {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<String>,
}

#[derive(Serialize)]
struct Envelope<'a> {
    error: &'a Diagnostic,
}

impl Diagnostic {
    fn from_error(err: &Error) -> Self {
        let mut causes = Vec::new();
        let mut cur = err.source();
        while let Some(source) = cur {
            causes.push(source.to_string());
            cur = source.source();
        }
        Self {
            kind: format!("{:?}", err.kind()),
            message: err
                .message()
                .map_or_else(|| fallback_message(err.kind()).to_string(), str::to_string),
            hint: err.hint().map(str::to_string),
            offset: err.offset(),
            causes,
        }
    }

    /// Headline with the byte position folded in, then `=` notes for hint and causes.
    fn to_text(&self, use_color: bool) -> String {
        let mut out = format!(
            "{} {}",
            paint("error:", use_color, AnsiColor::Red),
            self.message
        );
        if let Some(offset) = self.offset {
            out.push_str(&format!(" (at byte {offset})"));
        }
        if let Some(hint) = &self.hint {
            let label = paint("= hint:", use_color, AnsiColor::Yellow);
            out.push_str(&format!("\n  {label} {hint}"));
        }
        for cause in &self.causes {
            let label = paint("= cause:", use_color, AnsiColor::Yellow);
            out.push_str(&format!("\n  {label} {cause}"));
        }
        out
    }

    fn to_json(&self) -> String {
        serde_json::to_string(&Envelope { error: self }).unwrap_or_else(|_| {
            r#"{"error":{"kind":"Internal","message":"json encode failed"}}"#.to_string()
        })
    }
}

fn fallback_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "usage error",
        ErrorKind::Io => "i/o error",
        ErrorKind::Syntax => "syntax error",
        ErrorKind::UnknownConstructor => "unknown constructor",
        ErrorKind::TypeMismatch => "type mismatch",
        ErrorKind::Callback => "constructor callback failed",
        ErrorKind::Unrepresentable => "value has no JSON representation",
        ErrorKind::DepthLimit => "nesting too deep",
    }
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let diagnostic = Diagnostic::from_error(err);
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", diagnostic.to_text(color_mode.use_color(is_tty)));
    } else {
        eprintln!("{}", diagnostic.to_json());
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `tablejson --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "tablejson") else {
        return "Try `tablejson --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `tablejson --help`.".to_string();
    }
    format!("Try `tablejson {} --help`.", parts.join(" "))
}
