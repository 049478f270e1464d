//! The entry point that turns declarations into loaded configuration.

use std::io::Read;
use std::path::{Component, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::{Configuration, ResolverConfig};
use crate::load::{self, Properties, StructuredConfig};
use crate::locator::ResourcePath;
use crate::pipeline::Pipeline;
use crate::property::{Environment, ProcessEnvironment};
use crate::registry::StrategyRegistry;
use crate::source::Source;
use crate::Error;

/// Loads configuration from [`Configuration`] declarations.
///
/// Every call runs the whole pipeline: templates are resolved, sources are
/// located and loaded again. Nothing is cached between calls, so a context
/// can be shared freely between threads.
///
/// ## Example
///
/// ```no_run
/// use cfgsource::{ConfigContext, Configuration};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// let context = ConfigContext::builder().build();
///
/// let configuration = Configuration::new()
///     .with_source("/etc/app/server.toml")
///     .with_source("resource:server.toml")
///     .with_merge(true);
///
/// let server: Server = context.deserialize(&configuration)?;
/// # Ok::<(), cfgsource::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigContext {
    pipeline: Pipeline,
}

impl ConfigContext {
    /// Creates a new builder for constructing a `ConfigContext`.
    pub fn builder() -> ConfigContextBuilder {
        ConfigContextBuilder::default()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Locates the declared sources without loading them.
    pub fn sources(&self, configuration: &Configuration) -> Result<Vec<Source>, Error> {
        self.pipeline.locate(configuration)
    }

    /// Loads a flat property map.
    pub fn properties(&self, configuration: &Configuration) -> Result<Properties, Error> {
        let sources = self.sources(configuration)?;
        let properties = load::properties(&sources, configuration.merge());
        if configuration.log() {
            for (key, value) in &properties {
                info!(key = %key, value = %value, "configuration property");
            }
        }
        Ok(properties)
    }

    /// Loads a layered structured view.
    pub fn structured(&self, configuration: &Configuration) -> Result<StructuredConfig, Error> {
        let sources = self.sources(configuration)?;
        let config = load::structured(&sources, configuration.merge());
        if configuration.log() {
            for (key, value) in config.to_properties() {
                info!(key = %key, value = %value, "configuration property");
            }
        }
        Ok(config)
    }

    /// Loads a structured view and deserializes it into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self, configuration: &Configuration) -> Result<T, Error> {
        self.structured(configuration)?.deserialize()
    }

    /// Opens the first available source.
    pub fn stream(&self, configuration: &Configuration) -> Result<Box<dyn Read + Send>, Error> {
        let sources = self.sources(configuration)?;
        if configuration.log() {
            if let Some(source) = sources.iter().find(|source| source.available()) {
                info!(%source, "opening configuration stream");
            }
        }
        Ok(load::first_stream(&sources))
    }

    /// Opens every available source.
    pub fn streams(&self, configuration: &Configuration) -> Result<Vec<Box<dyn Read + Send>>, Error> {
        let sources = self.sources(configuration)?;
        if configuration.log() {
            for source in sources.iter().filter(|source| source.available()) {
                info!(%source, "opening configuration stream");
            }
        }
        Ok(load::streams(&sources))
    }

    /// Expands `template` through `resolver`.
    ///
    /// Falls back to the expanded `default` when the expansion is empty or
    /// leaves the template unchanged. An empty template returns `default`
    /// as given.
    pub fn property(&self, template: &str, default: &str, resolver: &ResolverConfig) -> Result<String, Error> {
        if template.is_empty() {
            return Ok(default.to_string());
        }

        let value = self.pipeline.resolve(template, resolver)?;
        if value.is_empty() || value == template {
            return self.pipeline.resolve(default, resolver);
        }
        Ok(value)
    }

    /// Like [`property`](Self::property), returning a lexically normalized path.
    pub fn property_path(&self, template: &str, default: &str, resolver: &ResolverConfig) -> Result<PathBuf, Error> {
        Ok(normalize(&self.property(template, default, resolver)?))
    }

    /// Looks up a system property, with no expansion.
    pub fn system_property(&self, key: &str, default: &str) -> String {
        self.pipeline
            .environment()
            .system_property(key)
            .unwrap_or_else(|| default.to_string())
    }
}

/// Removes `.` components and folds `..` into the preceding component.
fn normalize(path: &str) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in std::path::Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Builder for constructing a [`ConfigContext`].
///
/// Anything left unset gets a default: resource roots from
/// [`ResourcePath::from_env`], the process environment, and the built-in
/// strategies.
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigContextBuilder {
    resources: Option<ResourcePath>,
    environment: Option<Arc<dyn Environment>>,
    registry: Option<StrategyRegistry>,
}

impl ConfigContextBuilder {
    /// Sets where `resource:` paths are looked up.
    ///
    /// Ignored when a registry is supplied with
    /// [`with_registry`](Self::with_registry).
    pub fn with_resource_path(mut self, resources: ResourcePath) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Sets the provider of system properties and environment variables.
    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Sets the strategies declarations can name.
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> ConfigContext {
        let registry = match self.registry {
            Some(registry) => registry,
            None => StrategyRegistry::with_defaults(self.resources.unwrap_or_else(ResourcePath::from_env)),
        };
        let environment = self
            .environment
            .unwrap_or_else(|| Arc::new(ProcessEnvironment::new()));

        ConfigContext {
            pipeline: Pipeline::new(Arc::new(registry), environment),
        }
    }
}
