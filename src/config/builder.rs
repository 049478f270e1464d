use serde::{Deserialize, Serialize};

use crate::source::SupportedType;

/// Declaration of one candidate source.
///
/// `value` is a path template. It is used verbatim unless `resolve` is set,
/// in which case `${token}` placeholders are expanded first. Without a
/// `locator` the dispatching locator is used: a `resource:` prefix selects a
/// resource lookup, anything else a filesystem lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    value: String,
    #[serde(default)]
    resolve: bool,
    #[serde(default)]
    locator: Option<String>,
    #[serde(default, rename = "type")]
    content_type: SupportedType,
}

impl SourceSpec {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            resolve: false,
            locator: None,
            content_type: SupportedType::Auto,
        }
    }

    /// A source whose path template is property-expanded before lookup.
    pub fn resolved(value: impl Into<String>) -> Self {
        Self::new(value).with_resolve(true)
    }

    #[must_use]
    pub fn with_resolve(mut self, resolve: bool) -> Self {
        self.resolve = resolve;
        self
    }

    /// Names the locator strategy, as registered in the
    /// [`StrategyRegistry`](crate::registry::StrategyRegistry).
    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// Declares the content type, skipping type guessing for this source.
    #[must_use]
    pub fn with_type(mut self, content_type: SupportedType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn resolve(&self) -> bool {
        self.resolve
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn content_type(&self) -> SupportedType {
        self.content_type
    }
}

impl From<&str> for SourceSpec {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceSpec {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A literal default property declared on a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultProperty {
    key: String,
    value: String,
}

impl DefaultProperty {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Resolver settings for a bootstrap pass.
///
/// Unlike [`ResolverConfig`] this has no bootstrap of its own, so bootstrap
/// resolution is always exactly one level deep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapResolver {
    #[serde(default, rename = "impl")]
    implementation: Option<String>,
    #[serde(default)]
    properties: Vec<DefaultProperty>,
}

impl BootstrapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_implementation(mut self, id: impl Into<String>) -> Self {
        self.implementation = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(DefaultProperty::new(key, value));
        self
    }

    pub fn implementation(&self) -> Option<&str> {
        self.implementation.as_deref()
    }

    pub fn properties(&self) -> &[DefaultProperty] {
        &self.properties
    }
}

/// Sources loaded before the main resolution pass to seed the resolver.
///
/// Every key of the bootstrap configuration becomes a property that outranks
/// system properties, environment variables, and declared defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    sources: Vec<SourceSpec>,
    #[serde(default)]
    merge: bool,
    #[serde(default)]
    resolver: BootstrapResolver,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<SourceSpec>) -> Self {
        self.sources.push(source.into());
        self
    }

    #[must_use]
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: BootstrapResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    pub fn merge(&self) -> bool {
        self.merge
    }

    pub fn resolver(&self) -> &BootstrapResolver {
        &self.resolver
    }
}

/// How `${token}` placeholders in source paths are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default, rename = "impl")]
    implementation: Option<String>,
    #[serde(default)]
    bootstrap: Option<Bootstrap>,
    #[serde(default)]
    properties: Vec<DefaultProperty>,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the resolver strategy, as registered in the
    /// [`StrategyRegistry`](crate::registry::StrategyRegistry).
    #[must_use]
    pub fn with_implementation(mut self, id: impl Into<String>) -> Self {
        self.implementation = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Adds a default property. When a key is declared more than once the
    /// first declaration wins.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(DefaultProperty::new(key, value));
        self
    }

    pub fn implementation(&self) -> Option<&str> {
        self.implementation.as_deref()
    }

    pub fn bootstrap(&self) -> Option<&Bootstrap> {
        self.bootstrap.as_ref()
    }

    pub fn properties(&self) -> &[DefaultProperty] {
        &self.properties
    }
}

impl From<BootstrapResolver> for ResolverConfig {
    fn from(resolver: BootstrapResolver) -> Self {
        Self {
            implementation: resolver.implementation,
            bootstrap: None,
            properties: resolver.properties,
        }
    }
}

/// Declaration of a configuration to load.
///
/// Sources are listed in priority order: the first declared source has the
/// highest priority. Without `merge` only the first source that loads is
/// used. With `merge` every available source is loaded and, for keys defined
/// in more than one source, the value from the earliest declared source wins.
///
/// ## Example
///
/// ```no_run
/// use cfgsource::{Configuration, ConfigContext, ResolverConfig, SourceSpec};
///
/// let configuration = Configuration::new()
///     .with_source(SourceSpec::resolved("${user.home}/.app/app.properties"))
///     .with_source("/etc/app/app.properties")
///     .with_source("resource:defaults/app.properties")
///     .with_merge(true)
///     .with_resolver(ResolverConfig::new().with_property("user.home", "/root"));
///
/// let context = ConfigContext::builder().build();
/// let properties = context.properties(&configuration)?;
/// println!("{:?}", properties.get("listen.port"));
/// # Ok::<(), cfgsource::Error>(())
/// ```
///
/// Declarations can also be read from data:
///
/// ```
/// use cfgsource::Configuration;
///
/// let configuration: Configuration = toml::from_str(r#"
///     merge = true
///
///     [[sources]]
///     value = "resource:${profile}/app.properties"
///     resolve = true
///
///     [resolver]
///     properties = [{ key = "profile", value = "dev" }]
/// "#).unwrap();
///
/// assert!(configuration.merge());
/// assert_eq!(configuration.sources().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "a configuration does nothing until it is loaded"]
pub struct Configuration {
    #[serde(default)]
    sources: Vec<SourceSpec>,
    #[serde(default)]
    merge: bool,
    #[serde(default)]
    resolver: ResolverConfig,
    #[serde(default)]
    log: bool,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source. Sources added earlier have higher priority.
    pub fn with_source(mut self, source: impl Into<SourceSpec>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SourceSpec>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    /// Logs the loaded keys at `info` level.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    pub fn merge(&self) -> bool {
        self.merge
    }

    pub fn resolver(&self) -> &ResolverConfig {
        &self.resolver
    }

    pub fn log(&self) -> bool {
        self.log
    }
}
