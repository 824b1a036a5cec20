//! Purpose: Hold top-level CLI command dispatch for `tablejson`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command reads one document and writes one document plus a newline.
//! Invariants: Library errors pass through unchanged; `main.rs` adds hints.

use super::*;

use super::constructors_file::load_constructors;
use tablejson::api::{Codec, ParseOptions, from_json, serialize, to_serde_json};

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "tablejson", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Fmt {
            input,
            strict_blank,
            max_depth,
            constructors,
        } => {
            let mut codec = Codec::new().with_options(ParseOptions {
                strict_blank,
                max_depth,
                ..ParseOptions::default()
            });
            load_constructors(constructors.as_deref(), &mut codec)?;
            let source = read_input(input.file.as_deref())?;
            let value = codec.parse(&source)?;
            let text = codec.serialize(&value, input.pretty)?;
            write_output(&text)?;
            Ok(RunOutcome::ok())
        }
        Command::Import { input } => {
            let source = read_input(input.file.as_deref())?;
            let document: serde_json::Value = serde_json::from_slice(&source).map_err(|err| {
                Error::new(ErrorKind::Syntax)
                    .with_message("invalid json")
                    .with_hint("`import` reads standard JSON; use `fmt` for superset text.")
                    .with_source(err)
            })?;
            let text = serialize(&from_json(&document), input.pretty)?;
            write_output(&text)?;
            Ok(RunOutcome::ok())
        }
        Command::Export {
            input,
            constructors,
        } => {
            let mut codec = Codec::new();
            load_constructors(constructors.as_deref(), &mut codec)?;
            let source = read_input(input.file.as_deref())?;
            let document = to_serde_json(&codec.parse(&source)?)?;
            let encoded = if input.pretty {
                serde_json::to_string_pretty(&document)
            } else {
                serde_json::to_string(&document)
            }
            .map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("json encode failed")
                    .with_source(err)
            })?;
            write_output(encoded.as_bytes())?;
            Ok(RunOutcome::ok())
        }
    }
}
