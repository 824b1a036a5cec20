//! Purpose: Depth-first writer turning a `Value` tree into superset JSON text.
//! Exports: `serialize`.
//! Role: Structural encoding for plain variants, `@json_keys`-ordered objects, and a
//!       `toJSON` fallback for everything else.
//! Invariants: Map iteration order is never consulted; object keys come from `@json_keys`.
//! Invariants: Compact output contains no whitespace; pretty output indents with one tab per level.
//! Invariants: `toJSON` results are spliced verbatim without validation.
use bstr::{BString, ByteSlice};
use tracing::{debug, trace};

use crate::codec::{JSON_CONSTRUCTOR_KEY, JSON_KEYS_KEY};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::table::Table;
use crate::core::value::{TO_JSON_METHOD, Value};

const INDENT: u8 = b'\t';

pub fn serialize(value: &Value, pretty: bool) -> Result<BString> {
    let mut out = Vec::new();
    write_value(value, pretty.then_some(0), None, &mut out)?;
    debug!(pretty, bytes = out.len(), "serialized value");
    Ok(BString::from(out))
}

fn write_value(
    value: &Value,
    indent: Option<usize>,
    property: Option<&[u8]>,
    out: &mut Vec<u8>,
) -> Result<()> {
    if let Some(level) = indent {
        push_indent(level, out);
    }
    if let Some(name) = property {
        write_string(name, out);
        let separator: &[u8] = if indent.is_some() { b" : " } else { b":" };
        out.extend_from_slice(separator);
    }
    trace!(kind = value.type_name(), "emit");

    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Boolean(b) => {
            let text: &[u8] = if *b { b"true" } else { b"false" };
            out.extend_from_slice(text);
        }
        Value::Number(n) => {
            if !n.is_finite() {
                return Err(Error::new(ErrorKind::Unrepresentable)
                    .with_message(format!("number {n} has no JSON representation")));
            }
            out.extend_from_slice(n.to_string().as_bytes());
        }
        Value::Rational(r) => {
            out.extend_from_slice(r.to_text().as_bytes());
            out.push(b'r');
        }
        Value::String(s) => write_string(s, out),
        Value::Table(table) if table.is_array() => write_array(table, indent, out)?,
        Value::Table(table) => {
            let keys = table.get(JSON_KEYS_KEY);
            if keys.is_null() {
                write_fallback(value, out)?;
            } else {
                write_object(table, &keys, indent, out)?;
            }
        }
        Value::Callable(_) | Value::Custom(_) => write_fallback(value, out)?,
    }
    Ok(())
}

fn write_array(table: &Table, indent: Option<usize>, out: &mut Vec<u8>) -> Result<()> {
    out.push(b'[');
    let len = table.size()?;
    for index in 0..len {
        if index > 0 {
            out.push(b',');
        }
        if indent.is_some() {
            out.push(b'\n');
        }
        let elem = table.get(Value::integer(index as i64));
        write_value(&elem, indent.map(|level| level + 1), None, out)?;
    }
    if let Some(level) = indent {
        if len > 0 {
            out.push(b'\n');
            push_indent(level, out);
        }
    }
    out.push(b']');
    Ok(())
}

fn write_object(
    table: &Table,
    keys: &Value,
    indent: Option<usize>,
    out: &mut Vec<u8>,
) -> Result<()> {
    let key_table = match keys {
        Value::Table(key_table) if key_table.is_array() => key_table,
        other => {
            return Err(Error::new(ErrorKind::TypeMismatch)
                .with_message(format!(
                    "{JSON_KEYS_KEY} property must be an array (got {}).",
                    other.type_name()
                )));
        }
    };

    let declared = (0..key_table.size()?)
        .map(|index| {
            key_table
                .get(Value::integer(index as i64))
                .as_bstr()
                .map(|name| name.to_owned())
        })
        .collect::<Result<Vec<BString>>>()?;

    let mut names = declared.clone();
    if !table.get(JSON_CONSTRUCTOR_KEY).is_null() {
        names.push(BString::from(JSON_CONSTRUCTOR_KEY));
    }

    let child = indent.map(|level| level + 1);
    out.push(b'{');
    for (position, name) in names.iter().enumerate() {
        if position > 0 {
            out.push(b',');
        }
        if indent.is_some() {
            out.push(b'\n');
        }
        let elem = table.get(Value::String(name.clone()));
        write_value(&elem, child, Some(name.as_bytes()), out)?;
    }
    if !names.is_empty() {
        out.push(b',');
    }
    if indent.is_some() {
        out.push(b'\n');
    }
    let key_list = Value::array(declared.into_iter().map(Value::String).collect());
    write_value(&key_list, child, Some(JSON_KEYS_KEY.as_bytes()), out)?;

    if let Some(level) = indent {
        out.push(b'\n');
        push_indent(level, out);
    }
    out.push(b'}');
    Ok(())
}

fn write_fallback(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    if let Value::Table(table) = value {
        if !matches!(table.get(TO_JSON_METHOD), Value::Callable(_)) {
            return Err(Error::new(ErrorKind::TypeMismatch)
                .with_message(format!(
                    "table has neither {JSON_KEYS_KEY} nor a {TO_JSON_METHOD} method"
                ))
                .with_hint(format!(
                    "Add an {JSON_KEYS_KEY} array listing the keys to emit, in order."
                )));
        }
    }
    let text = value.invoke_method(TO_JSON_METHOD, &[])?;
    out.extend_from_slice(text.as_bstr()?);
    Ok(())
}

fn write_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.push(b'"');
    for &byte in bytes {
        match byte {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\'' => out.extend_from_slice(b"\\'"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\n' => out.extend_from_slice(b"\\n"),
            other => out.push(other),
        }
    }
    out.push(b'"');
}

fn push_indent(level: usize, out: &mut Vec<u8>) {
    out.extend(std::iter::repeat_n(INDENT, level));
}
