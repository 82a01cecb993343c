//! The ordered parser registry.
//!
//! Mutations set a dirty flag; the name lookup table is rebuilt lazily on
//! the first use after a mutation rather than on every load. Integrity
//! problems (empty names, name conflicts) are diagnostic warnings, never
//! errors: both conflicting parsers stay in the ordered list.

use std::collections::HashMap;
use std::sync::Arc;

use crate::parser::AssetParser;

/// Ordered collection of pluggable parsers.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn AssetParser>>,
    by_name: HashMap<String, Arc<dyn AssetParser>>,
    dirty: bool,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parser. Selection order is registration order.
    pub fn register(&mut self, parser: Arc<dyn AssetParser>) {
        self.parsers.push(parser);
        self.dirty = true;
    }

    /// Remove every parser with the given name. Returns whether anything
    /// was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.parsers.len();
        self.parsers.retain(|parser| parser.name() != name);
        let removed = self.parsers.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Rebuild the name lookup if the list changed since the last use.
    fn validate(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.by_name.clear();
        for parser in &self.parsers {
            let name = parser.name();
            if name.is_empty() {
                log::warn!("Parser should have a name; it cannot be selected explicitly");
                continue;
            }
            if self.by_name.contains_key(name) {
                log::warn!(
                    "Parser name conflict for '{name}': both stay registered, \
                     the later registration wins name lookups"
                );
            }
            self.by_name.insert(name.to_string(), Arc::clone(parser));
        }
    }

    /// Look a parser up by name.
    ///
    /// When two registered parsers share a name, the last-registered one
    /// wins here; `test`-based selection still walks the full ordered
    /// list, so both remain reachable there.
    pub fn lookup(&mut self, name: &str) -> Option<Arc<dyn AssetParser>> {
        self.validate();
        self.by_name.get(name).cloned()
    }

    /// The parsers in registration order.
    pub fn ordered(&mut self) -> Vec<Arc<dyn AssetParser>> {
        self.validate();
        self.parsers.clone()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
