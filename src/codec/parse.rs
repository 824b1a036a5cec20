//! Purpose: Single-pass recursive-descent scanner for the JSON superset.
//! Exports: `parse_with`.
//! Role: Builds host values directly; tagged objects are handed to registered constructors.
//! Invariants: No backtracking; each construct is chosen by its first significant byte.
//! Invariants: Any syntax error aborts the whole parse; no partial tree is returned.
//! Notes: Values are owned and moved into their table, so no rooting window is needed.
use tracing::{debug, trace};

use crate::codec::registry::ConstructorRegistry;
use crate::codec::{JSON_CONSTRUCTOR_KEY, ParseOptions};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::rational::Rational;
use crate::core::table::Table;
use crate::core::value::Value;

pub(crate) fn parse_with(
    source: &[u8],
    registry: &ConstructorRegistry,
    options: ParseOptions,
) -> Result<Value> {
    let mut scanner = Scanner {
        source,
        position: 0,
        depth: 0,
        registry,
        options,
    };
    let value = scanner.parse_value()?;
    scanner.skip_whitespace();
    if let Some(byte) = scanner.peek() {
        return Err(scanner.syntax_error(format!("unexpected trailing {}", describe(Some(byte)))));
    }
    debug!(bytes = source.len(), kind = value.type_name(), "parsed document");
    Ok(value)
}

struct Scanner<'a> {
    source: &'a [u8],
    position: usize,
    depth: usize,
    registry: &'a ConstructorRegistry,
    options: ParseOptions,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.source.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        Error::new(ErrorKind::Syntax)
            .with_message(message)
            .with_offset(self.position as u64)
    }

    fn expect_char(&mut self, expected: u8) -> Result<()> {
        if self.peek() != Some(expected) {
            return Err(self.syntax_error(format!(
                "expected char '{}' but got {} instead",
                expected as char,
                describe(self.peek())
            )));
        }
        self.position += 1;
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek() {
            let blank = match byte {
                b' ' | b'\t' => true,
                b'\n' | b'\r' => !self.options.strict_blank,
                _ => false,
            };
            if !blank {
                break;
            }
            self.position += 1;
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if let Some(max) = self.options.max_depth {
            if self.depth > max {
                return Err(Error::new(ErrorKind::DepthLimit)
                    .with_message(format!("nesting depth exceeds {max}"))
                    .with_offset(self.position as u64));
            }
        }
        Ok(())
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        trace!(position = self.position, "parse value");
        match self.peek() {
            Some(b'0'..=b'9' | b'-') => self.parse_number(),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            Some(b'n') => self.parse_literal("null", Value::Null),
            Some(b't') => self.parse_literal("true", Value::Boolean(true)),
            Some(b'f') => self.parse_literal("false", Value::Boolean(false)),
            other => Err(self.syntax_error(format!("unexpected {}", describe(other)))),
        }
    }

    fn parse_literal(&mut self, word: &str, value: Value) -> Result<Value> {
        if !self.source[self.position..].starts_with(word.as_bytes()) {
            return Err(self.syntax_error(format!("unexpected {}", describe(self.peek()))));
        }
        self.position += word.len();
        Ok(value)
    }

    fn scan_digits(&mut self) -> Result<()> {
        let start = self.position;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.position += 1;
        }
        if self.position == start {
            return Err(self.syntax_error(format!(
                "expected digit but got {} instead",
                describe(self.peek())
            )));
        }
        Ok(())
    }

    /// `-? digit+ ('.' digit+)? ('/' digit+)? 'r'?`; a fraction requires the `r` suffix.
    fn parse_number(&mut self) -> Result<Value> {
        let start = self.position;
        if self.peek() == Some(b'-') {
            self.position += 1;
        }
        self.scan_digits()?;
        if self.peek() == Some(b'.') {
            self.position += 1;
            self.scan_digits()?;
        }
        let fraction = self.peek() == Some(b'/');
        if fraction {
            self.position += 1;
            self.scan_digits()?;
        }

        let text = std::str::from_utf8(&self.source[start..self.position]).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("numeric literal is not ascii")
                .with_source(err)
        })?;

        if self.peek() == Some(b'r') {
            self.position += 1;
            return Rational::parse(text)
                .map(Value::Rational)
                .map_err(|err| err.with_offset(start as u64));
        }
        if fraction {
            return Err(self.syntax_error(format!(
                "expected char 'r' after fraction \"{text}\" but got {} instead",
                describe(self.peek())
            )));
        }
        let number = text.parse::<f64>().map_err(|err| {
            Error::new(ErrorKind::Syntax)
                .with_message(format!("invalid number \"{text}\""))
                .with_offset(start as u64)
                .with_source(err)
        })?;
        // Overflowing digit runs parse as infinity, which has no written form.
        if !number.is_finite() {
            return Err(Error::new(ErrorKind::Syntax)
                .with_message(format!("number \"{text}\" is out of range"))
                .with_offset(start as u64));
        }
        Ok(Value::Number(number))
    }

    fn parse_string(&mut self) -> Result<bstr::BString> {
        self.expect_char(b'"')?;
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                None => return Err(self.syntax_error("unterminated string")),
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = match self.bump() {
                        Some(b'"') => b'"',
                        Some(b'\'') => b'\'',
                        Some(b'\\') => b'\\',
                        Some(b't') => b'\t',
                        Some(b'n') => b'\n',
                        None => return Err(self.syntax_error("unterminated string")),
                        Some(other) => {
                            self.position -= 1;
                            return Err(self.syntax_error(format!(
                                "unexpected {} in \\ control sequence",
                                describe(Some(other))
                            )));
                        }
                    };
                    bytes.push(escaped);
                }
                Some(byte) => bytes.push(byte),
            }
        }
        Ok(bytes.into())
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.enter()?;
        self.expect_char(b'[')?;
        let mut elements = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.position += 1;
        } else {
            loop {
                elements.push(self.parse_value()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => self.position += 1,
                    Some(b']') => {
                        self.position += 1;
                        break;
                    }
                    other => {
                        return Err(self.syntax_error(format!(
                            "expected char ',' or ']' but got {} instead",
                            describe(other)
                        )));
                    }
                }
            }
        }
        self.depth -= 1;
        Ok(Value::array(elements))
    }

    fn parse_object(&mut self) -> Result<Value> {
        let start = self.position;
        self.enter()?;
        self.expect_char(b'{')?;
        let mut pairs = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.position += 1;
        } else {
            loop {
                let key = self.parse_value()?;
                self.skip_whitespace();
                self.expect_char(b':')?;
                let value = self.parse_value()?;
                pairs.push((key, value));
                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => self.position += 1,
                    Some(b'}') => {
                        self.position += 1;
                        break;
                    }
                    other => {
                        return Err(self.syntax_error(format!(
                            "expected char ',' or '}}' but got {} instead",
                            describe(other)
                        )));
                    }
                }
            }
        }
        self.depth -= 1;

        let table = Table::allocate(pairs.len());
        for (key, value) in pairs {
            table.set(key, value)?;
        }
        self.materialize(table, start)
    }

    /// Returns the raw table, or the registered constructor's result when tagged.
    fn materialize(&self, table: Table, start: usize) -> Result<Value> {
        let tag = table.get(JSON_CONSTRUCTOR_KEY);
        if tag.is_null() || self.options.keep_tagged {
            return Ok(Value::Table(table));
        }
        let name = tag.to_str_lossy()?;
        let Some(constructor) = self.registry.resolve(&name) else {
            return Err(Error::new(ErrorKind::UnknownConstructor)
                .with_message(format!("Invalid {JSON_CONSTRUCTOR_KEY} \"{name}\"."))
                .with_hint("Register the constructor before parsing.")
                .with_offset(start as u64));
        };
        let args: Vec<Value> = constructor
            .params()
            .iter()
            .map(|param| table.get(param.as_str()))
            .collect();
        debug!(constructor = %name, args = args.len(), "materializing typed object");
        constructor.callable().invoke(&args)
    }
}

fn describe(byte: Option<u8>) -> String {
    match byte {
        None => "end of input".to_string(),
        Some(b) if b.is_ascii_graphic() || b == b' ' => format!("char '{}'", b as char),
        Some(b) => format!("byte 0x{b:02x}"),
    }
}
