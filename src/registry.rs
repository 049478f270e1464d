//! Identifier → strategy lookup for locators and property resolvers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::locator::{FileLocator, Locator, MultiLocator, NullLocator, ResourceLocator, ResourcePath};
use crate::property::{DefaultPropertyResolver, PropertyResolver};
use crate::Error;

/// Dispatching locator; used when a source names no locator.
pub const MULTI_LOCATOR: &str = "multi";
pub const FILE_LOCATOR: &str = "file";
pub const RESOURCE_LOCATOR: &str = "resource";
pub const NULL_LOCATOR: &str = "null";
/// Used when a resolver configuration names no implementation.
pub const DEFAULT_RESOLVER: &str = "default";

/// Registry of the locator and resolver strategies a configuration can name.
///
/// Strategies are shared: every lookup of an identifier hands out the same
/// instance, so a strategy with internal state observes every use.
///
/// Lookups never fail for an unknown identifier as long as the default
/// strategy is registered; the default is used instead and a warning logged.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    locators: HashMap<String, Arc<dyn Locator>>,
    resolvers: HashMap<String, Arc<dyn PropertyResolver>>,
}

impl StrategyRegistry {
    /// A registry with nothing registered, not even the defaults.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in strategies, resolving resources in
    /// `resources`.
    pub fn with_defaults(resources: ResourcePath) -> Self {
        Self::empty()
            .with_locator(MULTI_LOCATOR, Arc::new(MultiLocator::new(resources.clone())))
            .with_locator(FILE_LOCATOR, Arc::new(FileLocator))
            .with_locator(RESOURCE_LOCATOR, Arc::new(ResourceLocator::new(resources)))
            .with_locator(NULL_LOCATOR, Arc::new(NullLocator))
            .with_resolver(DEFAULT_RESOLVER, Arc::new(DefaultPropertyResolver))
    }

    /// Registers `locator` as `id`, replacing any previous registration.
    #[must_use]
    pub fn with_locator(mut self, id: impl Into<String>, locator: Arc<dyn Locator>) -> Self {
        self.locators.insert(id.into(), locator);
        self
    }

    /// Registers `resolver` as `id`, replacing any previous registration.
    #[must_use]
    pub fn with_resolver(mut self, id: impl Into<String>, resolver: Arc<dyn PropertyResolver>) -> Self {
        self.resolvers.insert(id.into(), resolver);
        self
    }

    /// Looks up a locator, falling back to [`MULTI_LOCATOR`].
    pub fn locator(&self, id: Option<&str>) -> Result<Arc<dyn Locator>, Error> {
        resolve_or_fallback(&self.locators, id, MULTI_LOCATOR, "locator")
            .ok_or_else(|| Error::UnknownLocator(id.unwrap_or(MULTI_LOCATOR).to_string()))
    }

    /// Looks up a property resolver, falling back to [`DEFAULT_RESOLVER`].
    pub fn resolver(&self, id: Option<&str>) -> Result<Arc<dyn PropertyResolver>, Error> {
        resolve_or_fallback(&self.resolvers, id, DEFAULT_RESOLVER, "resolver")
            .ok_or_else(|| Error::UnknownResolver(id.unwrap_or(DEFAULT_RESOLVER).to_string()))
    }
}

fn resolve_or_fallback<T: ?Sized>(
    strategies: &HashMap<String, Arc<T>>,
    id: Option<&str>,
    default_id: &str,
    kind: &str,
) -> Option<Arc<T>> {
    match id {
        None => trace!(kind, "no strategy requested, using default"),
        Some(id) => {
            if let Some(strategy) = strategies.get(id) {
                debug!(kind, id, "using requested strategy");
                return Some(Arc::clone(strategy));
            }
            warn!(kind, id, fallback = default_id, "unknown strategy, falling back to default");
        }
    }

    strategies.get(default_id).map(Arc::clone)
}
