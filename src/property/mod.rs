//! `${token}` placeholder expansion over layered property maps.

mod env;
mod resolver;

use std::collections::BTreeMap;

pub use env::{Environment, MapEnvironment, ProcessEnvironment};
pub use resolver::{DefaultPropertyResolver, PropertyResolver};

/// A flat key/value property map.
pub type PropertyMap = BTreeMap<String, String>;

/// The property layers consulted when expanding a token.
///
/// Lookups go, highest priority first, through:
///
/// 1. the bootstrap map (loaded from bootstrap sources)
/// 2. system properties
/// 3. environment variables
/// 4. the default map (literal defaults declared on the resolver)
#[derive(Debug, Clone, Copy)]
pub struct PropertyLayers<'a> {
    bootstrap: &'a PropertyMap,
    environment: &'a dyn Environment,
    defaults: &'a PropertyMap,
}

impl<'a> PropertyLayers<'a> {
    pub fn new(
        bootstrap: &'a PropertyMap,
        environment: &'a dyn Environment,
        defaults: &'a PropertyMap,
    ) -> Self {
        Self {
            bootstrap,
            environment,
            defaults,
        }
    }

    /// Returns the value of `key` from the highest-priority layer that has it.
    pub fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.bootstrap.get(key) {
            return Some(value.clone());
        }
        if let Some(value) = self.environment.system_property(key) {
            return Some(value);
        }
        if let Some(value) = self.environment.var(key) {
            return Some(value);
        }
        self.defaults.get(key).cloned()
    }
}
