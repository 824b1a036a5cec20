//! Purpose: Bridge between standard JSON (`serde_json::Value`) and the table value model.
//! Exports: `from_json`, `to_json`.
//! Role: Used by the CLI `import`/`export` commands and by callers mixing both worlds.
//! Invariants: Imported objects carry `@json_keys` in source order so they re-serialize stably.
//! Invariants: Exported objects drop `@json_keys`; rationals degrade to integers or floats.
use serde_json::{Map, Number};

use crate::codec::{Codec, JSON_CONSTRUCTOR_KEY, JSON_KEYS_KEY, ParseOptions};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::rational::Rational;
use crate::core::table::Table;
use crate::core::value::{TO_JSON_METHOD, Value};

pub fn from_json(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Value::integer(i),
            (None, Some(u)) => Value::Rational(Rational::from_unsigned(u)),
            (None, None) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            // An imported `@json_keys` is replaced by the real source order.
            let keys = map
                .keys()
                .filter(|key| key.as_str() != JSON_CONSTRUCTOR_KEY && key.as_str() != JSON_KEYS_KEY)
                .map(|key| Value::from(key.as_str()))
                .collect();
            let pairs = map
                .iter()
                .filter(|(key, _)| key.as_str() != JSON_KEYS_KEY)
                .map(|(key, value)| (Value::from(key.as_str()), from_json(value)))
                .chain(std::iter::once((Value::from(JSON_KEYS_KEY), Value::array(keys))));
            Value::Table(Table::from_pairs(pairs))
        }
    }
}

pub fn to_json(value: &Value) -> Result<serde_json::Value> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => float(*n),
        Value::Rational(r) if r.is_integer() && !r.is_negative() => {
            Ok(serde_json::Value::from(r.numerator()))
        }
        Value::Rational(r) => match r.to_i64() {
            Some(i) => Ok(serde_json::Value::from(i)),
            None => float(r.to_f64()),
        },
        Value::String(s) => Ok(serde_json::Value::String(value_text(s))),
        Value::Table(table) if table.is_array() => (0..table.size()?)
            .map(|index| to_json(&table.get(Value::integer(index as i64))))
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array),
        Value::Table(table) => object(value, table),
        Value::Callable(callable) => Err(Error::new(ErrorKind::Unrepresentable)
            .with_message(format!("callable \"{}\" has no JSON form", callable.name()))),
        Value::Custom(_) => reparse(value),
    }
}

fn object(value: &Value, table: &Table) -> Result<serde_json::Value> {
    let keys = table.get(JSON_KEYS_KEY);
    if keys.is_null() {
        return reparse(value);
    }
    let key_table = keys.as_table()?;
    let mut map = Map::new();
    for index in 0..key_table.size()? {
        let key = key_table.get(Value::integer(index as i64));
        map.insert(key.to_str_lossy()?, to_json(&table.get_value(&key))?);
    }
    let tag = table.get(JSON_CONSTRUCTOR_KEY);
    if !tag.is_null() {
        map.insert(JSON_CONSTRUCTOR_KEY.to_string(), to_json(&tag)?);
    }
    Ok(serde_json::Value::Object(map))
}

/// Runs the value's `toJSON` and converts the resulting superset text, keeping tags raw.
fn reparse(value: &Value) -> Result<serde_json::Value> {
    let text = value.invoke_method(TO_JSON_METHOD, &[])?;
    let codec = Codec::new().with_options(ParseOptions {
        keep_tagged: true,
        ..ParseOptions::default()
    });
    to_json(&codec.parse(text.as_bstr()?)?)
}

fn float(n: f64) -> Result<serde_json::Value> {
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .ok_or_else(|| {
            Error::new(ErrorKind::Unrepresentable)
                .with_message(format!("number {n} has no JSON representation"))
        })
}

fn value_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
