//! Purpose: JSON superset codec over the dynamic value model.
//! Exports: `Codec`, `ParseOptions`, `serialize`, reserved key names, constructor registry types.
//! Role: Single seam for parse/serialize so callers never hand-roll encoding.
//! Invariants: The constructor registry is the only long-lived state; it belongs to one `Codec`.
//! Invariants: Parse and serialize run to completion or to the first error; no partial output.

pub mod bindings;
mod parse;
pub mod record;
pub mod registry;
mod serialize;

use bstr::BString;

use crate::core::error::Result;
use crate::core::value::{Callable, Value};

pub use record::Record;
pub use registry::{Constructor, ConstructorRegistry};
pub use serialize::serialize;

/// Names a registered constructor; its presence turns an object into a typed value.
pub const JSON_CONSTRUCTOR_KEY: &str = "@json_constructor";
/// Authoritative ordered key list for serializing map-shaped tables.
pub const JSON_KEYS_KEY: &str = "@json_keys";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Only space and tab count as whitespace; newlines become syntax errors.
    pub strict_blank: bool,
    /// Maximum array/object nesting; `None` leaves recursion unbounded.
    pub max_depth: Option<usize>,
    /// Return `@json_constructor` objects as raw tables without consulting the registry.
    pub keep_tagged: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Codec {
    registry: ConstructorRegistry,
    options: ParseOptions,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn registry(&self) -> &ConstructorRegistry {
        &self.registry
    }

    /// Always succeeds; a prior registration under `name` is replaced.
    pub fn register_constructor(
        &mut self,
        name: impl Into<String>,
        callable: Callable,
        params: Vec<String>,
    ) -> bool {
        self.registry.register(name, callable, params)
    }

    /// Registers `name` so tagged objects materialize as [`Record`]s.
    pub fn register_record(&mut self, name: impl Into<String>, params: Vec<String>) -> bool {
        let name = name.into();
        let callable = Record::constructor(name.clone(), params.clone());
        self.registry.register(name, callable, params)
    }

    pub fn parse(&self, text: impl AsRef<[u8]>) -> Result<Value> {
        parse::parse_with(text.as_ref(), &self.registry, self.options)
    }

    pub fn serialize(&self, value: &Value, pretty: bool) -> Result<BString> {
        serialize(value, pretty)
    }
}
