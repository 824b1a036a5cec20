//! Purpose: Table storage and the protocol the codec uses to read and write it.
//! Exports: `Table`, `Key`, `LENGTH_KEY`.
//! Role: One shared container type with an array/map shape flag, accessed by index or key.
//! Invariants: Every call passes straight through to storage; there is no caching layer.
//! Invariants: Map iteration order is unspecified; callers needing order carry `@json_keys`.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bstr::BString;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::rational::Rational;
use crate::core::value::Value;

/// Read-only pseudo-property holding an array's element count.
pub const LENGTH_KEY: &str = "@length";

/// Hashable projection of a `Value` used to address table entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Null,
    Boolean(bool),
    Number(u64),
    Rational(Rational),
    String(BString),
    Identity(usize),
}

impl Key {
    fn as_index(&self) -> Option<usize> {
        match self {
            Self::Rational(value) => value.as_index(),
            _ => None,
        }
    }

    fn is_length(&self) -> bool {
        matches!(self, Self::String(name) if name == LENGTH_KEY)
    }
}

impl From<&Value> for Key {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Boolean(b) => Self::Boolean(*b),
            // Integral floats address the same slot as the equal integer rational.
            Value::Number(n)
                if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 =>
            {
                Self::Rational(Rational::from_integer(*n as i64))
            }
            Value::Number(n) => Self::Number(n.to_bits()),
            Value::Rational(r) => Self::Rational(*r),
            Value::String(s) => Self::String(s.clone()),
            Value::Table(t) => Self::Identity(t.addr()),
            Value::Callable(c) => Self::Identity(c.addr()),
            Value::Custom(o) => Self::Identity(Rc::as_ptr(o) as *const () as usize),
        }
    }
}

#[derive(Default)]
struct TableData {
    is_array: bool,
    elements: Vec<Value>,
    properties: HashMap<Key, (Value, Value)>,
}

#[derive(Clone)]
pub struct Table(Rc<RefCell<TableData>>);

impl Table {
    /// New map-shaped table; `capacity` is a sizing hint only.
    pub fn allocate(capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(TableData {
            is_array: false,
            elements: Vec::new(),
            properties: HashMap::with_capacity(capacity),
        })))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(TableData {
            is_array: true,
            elements,
            properties: HashMap::new(),
        })))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let pairs = pairs.into_iter();
        let table = Self::allocate(pairs.size_hint().0);
        {
            let mut data = table.0.borrow_mut();
            for (key, value) in pairs {
                data.properties.insert(Key::from(&key), (key, value));
            }
        }
        table
    }

    pub fn is_array(&self) -> bool {
        self.0.borrow().is_array
    }

    pub fn get(&self, key: impl Into<Value>) -> Value {
        self.get_value(&key.into())
    }

    pub fn get_value(&self, key: &Value) -> Value {
        let key = Key::from(key);
        let data = self.0.borrow();
        if data.is_array {
            if let Some(index) = key.as_index() {
                return data.elements.get(index).cloned().unwrap_or(Value::Null);
            }
            if key.is_length() {
                return Value::integer(data.elements.len() as i64);
            }
        }
        data.properties
            .get(&key)
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn set(&self, key: impl Into<Value>, value: Value) -> Result<()> {
        let key = key.into();
        let hashed = Key::from(&key);
        let mut data = self.0.borrow_mut();
        if data.is_array {
            if let Some(index) = hashed.as_index() {
                let len = data.elements.len();
                return match index.cmp(&len) {
                    std::cmp::Ordering::Less => {
                        data.elements[index] = value;
                        Ok(())
                    }
                    std::cmp::Ordering::Equal => {
                        data.elements.push(value);
                        Ok(())
                    }
                    std::cmp::Ordering::Greater => Err(Error::new(ErrorKind::TypeMismatch)
                        .with_message(format!("{index} is outside the range of [0, {len}]."))),
                };
            }
            if hashed.is_length() {
                return Err(Error::new(ErrorKind::TypeMismatch)
                    .with_message(format!("{LENGTH_KEY} is read-only")));
            }
        }
        data.properties.insert(hashed, (key, value));
        Ok(())
    }

    /// Element count, read through the `@length` convention.
    /// Only meaningful on array-shaped tables; on a map this is a type mismatch.
    pub fn size(&self) -> Result<usize> {
        self.get(LENGTH_KEY).index(0, usize::MAX)
    }

    /// All entries, arrays first by index then named properties. Map order is unspecified.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        let data = self.0.borrow();
        let indexed = data
            .elements
            .iter()
            .enumerate()
            .map(|(index, value)| (Value::integer(index as i64), value.clone()));
        indexed
            .chain(data.properties.values().cloned())
            .collect()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn structural_eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let left = self.0.borrow();
        let right = other.0.borrow();
        left.is_array == right.is_array
            && left.elements == right.elements
            && left.properties.len() == right.properties.len()
            && left.properties.iter().all(|(key, (_, value))| {
                right
                    .properties
                    .get(key)
                    .is_some_and(|(_, other_value)| value == other_value)
            })
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Table")
            .field("is_array", &data.is_array)
            .field("elements", &data.elements)
            .field("properties", &data.properties.values().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{LENGTH_KEY, Table};
    use crate::core::error::ErrorKind;
    use crate::core::rational::Rational;
    use crate::core::value::Value;

    #[test]
    fn array_exposes_length_and_indices() {
        let table = Table::array(vec![Value::from("a"), Value::from("b")]);
        assert!(table.is_array());
        assert_eq!(table.size().unwrap(), 2);
        assert_eq!(table.get(LENGTH_KEY), Value::integer(2));
        assert_eq!(table.get(Value::integer(1)), Value::from("b"));
        assert_eq!(table.get(Value::Number(0.0)), Value::from("a"));
        assert_eq!(table.get(Value::integer(2)), Value::Null);
    }

    #[test]
    fn array_set_appends_at_end_and_rejects_gaps() {
        let table = Table::array(Vec::new());
        table.set(Value::integer(0), Value::from(true)).unwrap();
        table.set(Value::integer(0), Value::from(false)).unwrap();
        assert_eq!(table.size().unwrap(), 1);
        assert_eq!(table.get(Value::integer(0)), Value::Boolean(false));

        let err = table.set(Value::integer(5), Value::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(table.set(LENGTH_KEY, Value::integer(9)).is_err());
    }

    #[test]
    fn map_size_is_a_type_mismatch() {
        let table = Table::allocate(4);
        table.set("x", Value::integer(1)).unwrap();
        assert!(!table.is_array());
        assert_eq!(table.get("x"), Value::integer(1));
        assert_eq!(table.get("missing"), Value::Null);
        assert_eq!(table.size().unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn keys_hash_structurally() {
        let table = Table::allocate(0);
        table
            .set(Value::Rational(Rational::zero(true)), Value::from("neg"))
            .unwrap();
        table
            .set(Value::Rational(Rational::zero(false)), Value::from("pos"))
            .unwrap();
        assert_eq!(table.get(Value::Rational(Rational::zero(true))), Value::from("neg"));
        assert_eq!(table.get(Value::Number(0.0)), Value::from("pos"));
        assert_eq!(table.get(Value::Number(0.5)), Value::Null);

        let inner = Table::allocate(0);
        table.set(Value::Table(inner.clone()), Value::integer(7)).unwrap();
        assert_eq!(table.get(Value::Table(inner)), Value::integer(7));
        assert_eq!(table.get(Value::Table(Table::allocate(0))), Value::Null);
    }

    #[test]
    fn entries_cover_elements_and_properties() {
        let table = Table::array(vec![Value::Null]);
        table.set("name", Value::from("x")).unwrap();
        let entries = table.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (Value::integer(0), Value::Null));
    }
}
