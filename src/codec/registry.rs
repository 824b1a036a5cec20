//! Purpose: Name -> constructor mapping used to rehydrate typed objects.
//! Exports: `ConstructorRegistry`, `Constructor`.
//! Role: Consulted by the parser when an object carries `@json_constructor`.
//! Invariants: Registering an existing name replaces the prior entry (last write wins).
//! Invariants: Single-threaded; the registry lives as long as its owning codec.
use std::collections::HashMap;

use tracing::debug;

use crate::core::value::Callable;

#[derive(Clone, Debug)]
pub struct Constructor {
    callable: Callable,
    params: Vec<String>,
}

impl Constructor {
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Property names read from the parsed object, in argument order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConstructorRegistry {
    entries: HashMap<String, Constructor>,
}

impl ConstructorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, callable: Callable, params: Vec<String>) -> bool {
        let name = name.into();
        let replaced = self
            .entries
            .insert(name.clone(), Constructor { callable, params })
            .is_some();
        debug!(constructor = %name, replaced, "registered json constructor");
        true
    }

    pub fn resolve(&self, name: &str) -> Option<&Constructor> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
