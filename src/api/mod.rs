//! Purpose: Define the stable public Rust API boundary for tablejson.
//! Exports: Value model, codec, bindings, interop, and error types used by the CLI and embedders.
//! Role: Public, additive-only surface; internal module paths may move.
//! Invariants: Everything the binary needs is reachable from here.

pub use crate::codec::bindings::{
    ADD_CONSTRUCTOR_METHOD, PARSE_JSON_METHOD, json_parser_object, json_parser_object_for,
    to_json,
};
pub use crate::codec::{
    Codec, Constructor, ConstructorRegistry, JSON_CONSTRUCTOR_KEY, JSON_KEYS_KEY, ParseOptions,
    Record, serialize,
};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::rational::Rational;
pub use crate::core::table::{LENGTH_KEY, Table};
pub use crate::core::value::{Callable, CustomObject, TO_JSON_METHOD, Value};
pub use crate::interop::{from_json, to_json as to_serde_json};
