//! Purpose: Load record constructor declarations for the CLI `--constructors` flag.
//! Exports: `ConstructorsFile`, `ConstructorSpec`, `load_constructors`.
//! Role: Binary-only config; turns a small JSON document into `Codec::register_record` calls.
//! Invariants: Unknown fields are rejected so typos surface as usage errors.
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tablejson::api::{Codec, Error, ErrorKind};
use tracing::debug;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(super) struct ConstructorsFile {
    pub(super) constructors: Vec<ConstructorSpec>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(super) struct ConstructorSpec {
    pub(super) name: String,
    #[serde(default)]
    pub(super) params: Vec<String>,
}

impl ConstructorsFile {
    pub(super) fn parse(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid constructors file")
                .with_hint(r#"Expected {"constructors":[{"name":"Point","params":["x","y"]}]}."#)
                .with_source(err)
        })
    }

    pub(super) fn register_into(self, codec: &mut Codec) {
        for spec in self.constructors {
            codec.register_record(spec.name, spec.params);
        }
    }
}

/// Registers every declared record constructor with `codec`; `None` is a no-op.
pub(super) fn load_constructors(path: Option<&Path>, codec: &mut Codec) -> Result<(), Error> {
    let Some(path) = path else {
        return Ok(());
    };
    let text = fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to read {}", path.display()))
            .with_source(err)
    })?;
    let file = ConstructorsFile::parse(&text)?;
    debug!(path = %path.display(), count = file.constructors.len(), "loaded constructors");
    file.register_into(codec);
    Ok(())
}
