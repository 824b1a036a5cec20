//! Purpose: Generic typed object produced by constructors registered through `Codec::register_record`.
//! Exports: `Record`.
//! Role: Ready-made custom object for callers that want typed round-trips without writing one.
//! Invariants: Field order is the registered parameter order, on read and on write.
//! Invariants: `toJSON` output re-parses into the same record when the constructor is registered.
use bstr::BString;

use crate::codec::{JSON_CONSTRUCTOR_KEY, JSON_KEYS_KEY, serialize};
use crate::core::error::Result;
use crate::core::table::Table;
use crate::core::value::{Callable, CustomObject, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(name: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Constructor callable pairing each positional argument with its parameter name.
    pub fn constructor(name: String, params: Vec<String>) -> Callable {
        Callable::new(name.clone(), move |args| {
            let fields = params
                .iter()
                .cloned()
                .zip(args.iter().cloned().chain(std::iter::repeat(Value::Null)))
                .collect();
            Ok(Value::custom(Record::new(name.clone(), fields)))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Tagged map table carrying the fields, the constructor name, and the key order.
    pub fn to_table(&self) -> Result<Table> {
        let table = Table::allocate(self.fields.len() + 2);
        for (field, value) in &self.fields {
            table.set(field.as_str(), value.clone())?;
        }
        table.set(JSON_CONSTRUCTOR_KEY, Value::from(self.name.as_str()))?;
        let keys = self
            .fields
            .iter()
            .map(|(field, _)| Value::from(field.as_str()))
            .collect();
        table.set(JSON_KEYS_KEY, Value::array(keys))?;
        Ok(table)
    }
}

impl CustomObject for Record {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn to_json_text(&self) -> Result<BString> {
        serialize(&Value::Table(self.to_table()?), false)
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        self.field(name).cloned()
    }
}
