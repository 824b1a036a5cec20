//! Purpose: Closed dynamic value model the codec parses into and serializes from.
//! Exports: `Value`, `Callable`, `CustomObject`, `TO_JSON_METHOD`.
//! Role: Stands in for the scripting host's tagged union; all dispatch is by `match`.
//! Invariants: Every variant except `Custom` serializes without a host callback.
//! Invariants: Accessors on the wrong variant return `TypeMismatch`, never coerce.
use std::fmt;
use std::rc::Rc;

use bstr::{BStr, BString, ByteSlice};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::rational::Rational;
use crate::core::table::Table;

/// Method name the serializer invokes on values it cannot encode structurally.
pub const TO_JSON_METHOD: &str = "toJSON";

type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

#[derive(Clone)]
pub struct Callable {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl Callable {
    pub fn new(name: impl Into<Rc<str>>, func: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Errors raised by the callable propagate unchanged.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.func) as *const () as usize
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable").field("name", &self.name).finish()
    }
}

/// Host objects that control their own JSON representation.
pub trait CustomObject: fmt::Debug {
    fn type_name(&self) -> &str;

    /// Text spliced verbatim into serializer output; it is not validated.
    fn to_json_text(&self) -> Result<BString>;

    fn get_property(&self, _name: &str) -> Option<Value> {
        None
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Number(f64),
    Rational(Rational),
    Boolean(bool),
    String(BString),
    Table(Table),
    Callable(Callable),
    Custom(Rc<dyn CustomObject>),
}

impl Value {
    pub fn string(text: impl Into<BString>) -> Self {
        Self::String(text.into())
    }

    pub fn integer(value: i64) -> Self {
        Self::Rational(Rational::from_integer(value))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Self::Table(Table::array(elements))
    }

    /// Map-shaped table from string-keyed pairs.
    pub fn table<K: Into<BString>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Table(Table::from_pairs(
            pairs
                .into_iter()
                .map(|(key, value)| (Value::String(key.into()), value)),
        ))
    }

    pub fn custom(object: impl CustomObject + 'static) -> Self {
        Self::Custom(Rc::new(object))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Number(_) => "number",
            Self::Rational(_) => "rational",
            Self::Boolean(_) => "boolean",
            Self::String(_) => "string",
            Self::Table(_) => "table",
            Self::Callable(_) => "callable",
            Self::Custom(_) => "custom object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(value) => Ok(*value),
            other => Err(Error::type_mismatch("boolean", other.type_name())),
        }
    }

    pub fn as_bstr(&self) -> Result<&BStr> {
        match self {
            Self::String(text) => Ok(text.as_bstr()),
            other => Err(Error::type_mismatch("string", other.type_name())),
        }
    }

    /// String contents, with invalid UTF-8 replaced.
    pub fn to_str_lossy(&self) -> Result<String> {
        Ok(self.as_bstr()?.to_str_lossy().into_owned())
    }

    pub fn as_table(&self) -> Result<&Table> {
        match self {
            Self::Table(table) => Ok(table),
            other => Err(Error::type_mismatch("table", other.type_name())),
        }
    }

    pub fn as_callable(&self) -> Result<&Callable> {
        match self {
            Self::Callable(callable) => Ok(callable),
            other => Err(Error::type_mismatch("callable", other.type_name())),
        }
    }

    pub fn as_number(&self) -> Result<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Rational(value) => Ok(value.to_f64()),
            other => Err(Error::type_mismatch("number", other.type_name())),
        }
    }

    /// Integer in `[min, max)`.
    pub fn index(&self, min: usize, max: usize) -> Result<usize> {
        let num = self.as_number()?;
        if num.fract() != 0.0 || num < min as f64 || num >= max as f64 {
            return Err(Error::new(ErrorKind::TypeMismatch)
                .with_message(format!("{num} is outside the range of [{min}, {max}).")));
        }
        Ok(num as usize)
    }

    /// Duck-typed method call. Custom objects answer `toJSON` themselves and expose
    /// other methods as already-bound callables; tables look the method up as a
    /// callable property and pass themselves as the first argument.
    pub fn invoke_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self {
            Self::Custom(object) if name == TO_JSON_METHOD => {
                Ok(Value::string(object.to_json_text()?))
            }
            Self::Custom(object) => match object.get_property(name) {
                Some(Value::Callable(method)) => method.invoke(args),
                _ => Err(self.missing_method(name)),
            },
            Self::Table(table) => match table.get(name) {
                Value::Callable(method) => {
                    let mut call_args = Vec::with_capacity(args.len() + 1);
                    call_args.push(self.clone());
                    call_args.extend_from_slice(args);
                    method.invoke(&call_args)
                }
                _ => Err(self.missing_method(name)),
            },
            _ => Err(self.missing_method(name)),
        }
    }

    fn missing_method(&self, name: &str) -> Error {
        Error::new(ErrorKind::TypeMismatch)
            .with_message(format!("{} value has no method \"{name}\"", self.type_name()))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Rational(a), Self::Rational(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => a.structural_eq(b),
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<Rational> for Value {
    fn from(value: Rational) -> Self {
        Self::Rational(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(BString::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(BString::from(value))
    }
}

impl From<BString> for Value {
    fn from(value: BString) -> Self {
        Self::String(value)
    }
}

impl From<Table> for Value {
    fn from(value: Table) -> Self {
        Self::Table(value)
    }
}

impl From<Callable> for Value {
    fn from(value: Callable) -> Self {
        Self::Callable(value)
    }
}

#[cfg(test)]
mod tests {
    use bstr::BString;

    use super::{Callable, CustomObject, Value};
    use crate::core::error::{ErrorKind, Result};
    use crate::core::rational::Rational;

    #[derive(Debug)]
    struct Marker;

    impl CustomObject for Marker {
        fn type_name(&self) -> &str {
            "Marker"
        }

        fn to_json_text(&self) -> Result<BString> {
            Ok(BString::from("\"marker\""))
        }
    }

    #[test]
    fn accessors_report_type_mismatch() {
        let err = Value::Null.as_bstr().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(Value::from("x").as_table().is_err());
        assert!(Value::Boolean(true).as_bool().unwrap());
    }

    #[test]
    fn equality_is_structural_except_for_identity_variants() {
        assert_eq!(
            Value::array(vec![Value::from(1.5), Value::from("a")]),
            Value::array(vec![Value::from(1.5), Value::from("a")])
        );
        assert_ne!(Value::Number(1.0), Value::integer(1));
        assert_ne!(
            Value::Rational(Rational::zero(true)),
            Value::Rational(Rational::zero(false))
        );

        let f = Callable::new("f", |_| Ok(Value::Null));
        let g = Callable::new("f", |_| Ok(Value::Null));
        assert_eq!(Value::from(f.clone()), Value::from(f));
        assert_ne!(Value::from(g.clone()), Value::from(Callable::new("f", |_| Ok(Value::Null))));
    }

    #[test]
    fn index_rejects_out_of_range_and_fractions() {
        assert_eq!(Value::integer(2).index(0, 5).unwrap(), 2);
        assert_eq!(Value::Number(4.0).index(0, 5).unwrap(), 4);
        assert!(Value::integer(5).index(0, 5).is_err());
        assert!(Value::Number(1.5).index(0, 5).is_err());
        assert!(Value::integer(-1).index(0, 5).is_err());
    }

    #[test]
    fn invoke_method_dispatches_custom_and_table_methods() {
        let custom = Value::custom(Marker);
        let text = custom.invoke_method("toJSON", &[]).unwrap();
        assert_eq!(text, Value::from("\"marker\""));

        let table = Value::table([(
            "toJSON",
            Value::from(Callable::new("toJSON", |args| {
                assert_eq!(args.len(), 1);
                Ok(Value::from("{}"))
            })),
        )]);
        assert_eq!(table.invoke_method("toJSON", &[]).unwrap(), Value::from("{}"));

        let err = Value::integer(3).invoke_method("toJSON", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
