//! Purpose: Host-callable entry points matching the scripting extension's JSON surface.
//! Exports: `to_json`, `json_parser_object`, `Codec::call_method`, method name constants.
//! Role: Argument checking and value unpacking between host calls and the codec API.
//! Invariants: Wrong argument counts are usage errors; wrong argument types are type mismatches.
//! Invariants: The parser object is not re-entrant; nested calls fail instead of aliasing state.
use std::cell::RefCell;
use std::rc::Rc;

use bstr::BString;

use crate::codec::{Codec, serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::value::{Callable, CustomObject, Value};

pub const ADD_CONSTRUCTOR_METHOD: &str = "addConstructor";
pub const PARSE_JSON_METHOD: &str = "parseJSON";

fn expect_args(args: &[Value], count: usize) -> Result<()> {
    if args.len() != count {
        return Err(wrong_arg_count(count.to_string(), args.len()));
    }
    Ok(())
}

fn wrong_arg_count(expected: String, actual: usize) -> Error {
    Error::new(ErrorKind::Usage).with_message(format!(
        "function received wrong number of arguments (expected {expected}, got {actual})"
    ))
}

/// `toJSON(value[, allow_newline])`: compact unless the flag is true.
pub fn to_json(args: &[Value]) -> Result<Value> {
    let (value, pretty) = match args {
        [value] => (value, false),
        [value, flag] => (value, flag.as_bool()?),
        _ => return Err(wrong_arg_count("1 or 2".to_string(), args.len())),
    };
    Ok(Value::String(serialize(value, pretty)?))
}

impl Codec {
    /// Dispatches the parser object's methods by name.
    pub fn call_method(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        match name {
            ADD_CONSTRUCTOR_METHOD => {
                expect_args(args, 3)?;
                let constructor = args[0].to_str_lossy()?;
                let callable = args[1].as_callable()?.clone();
                let param_table = args[2].as_table()?;
                let params = (0..param_table.size()?)
                    .map(|index| param_table.get(Value::integer(index as i64)).to_str_lossy())
                    .collect::<Result<Vec<String>>>()?;
                Ok(Value::Boolean(self.register_constructor(constructor, callable, params)))
            }
            PARSE_JSON_METHOD => {
                expect_args(args, 1)?;
                self.parse(args[0].as_bstr()?)
            }
            other => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("JSONParser has no method \"{other}\""))),
        }
    }
}

#[derive(Debug)]
struct JsonParserObject {
    codec: Rc<RefCell<Codec>>,
}

impl CustomObject for JsonParserObject {
    fn type_name(&self) -> &str {
        "JSONParser"
    }

    fn to_json_text(&self) -> Result<BString> {
        Err(Error::new(ErrorKind::TypeMismatch).with_message("JSONParser cannot be serialized"))
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        if name != ADD_CONSTRUCTOR_METHOD && name != PARSE_JSON_METHOD {
            return None;
        }
        let codec = Rc::clone(&self.codec);
        let method = name.to_string();
        Some(Value::Callable(Callable::new(name, move |args| {
            let mut codec = codec.try_borrow_mut().map_err(|_| {
                Error::new(ErrorKind::Internal)
                    .with_message(format!("JSONParser.{method} called re-entrantly"))
            })?;
            codec.call_method(&method, args)
        })))
    }
}

/// `JSONParser()`: a fresh parser object with its own constructor registry.
pub fn json_parser_object() -> Value {
    json_parser_object_for(Codec::new())
}

pub fn json_parser_object_for(codec: Codec) -> Value {
    Value::custom(JsonParserObject {
        codec: Rc::new(RefCell::new(codec)),
    })
}
