//! Turns declarations into located sources.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{Bootstrap, Configuration, DefaultProperty, ResolverConfig, SourceSpec};
use crate::load;
use crate::property::{Environment, PropertyLayers, PropertyMap};
use crate::registry::StrategyRegistry;
use crate::source::{Source, SupportedType};
use crate::Error;

/// Source resolution pipeline.
///
/// Resolves the strategies a declaration names, expands path templates, and
/// locates every declared source. Missing files are never an error; only an
/// unknown strategy with no registered default is.
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: Arc<StrategyRegistry>,
    environment: Arc<dyn Environment>,
}

impl Pipeline {
    pub fn new(registry: Arc<StrategyRegistry>, environment: Arc<dyn Environment>) -> Self {
        Self {
            registry,
            environment,
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn environment(&self) -> &dyn Environment {
        self.environment.as_ref()
    }

    /// Locates the sources of `configuration`, in declaration order.
    pub fn locate(&self, configuration: &Configuration) -> Result<Vec<Source>, Error> {
        self.locate_sources(configuration.sources(), configuration.resolver())
    }

    /// Locates `specs`, expanding templates with the resolver `resolver`
    /// describes.
    ///
    /// The result has one source per spec, available or not. An empty
    /// declaration yields a single unavailable source with an empty path.
    pub fn locate_sources(
        &self,
        specs: &[SourceSpec],
        resolver: &ResolverConfig,
    ) -> Result<Vec<Source>, Error> {
        if specs.is_empty() {
            warn!("no sources declared, nothing will be loaded");
            return Ok(vec![Source::unfound("")]);
        }

        let strategy = self.registry.resolver(resolver.implementation())?;
        let (bootstrap, defaults) = self.property_maps(resolver)?;
        let layers = PropertyLayers::new(&bootstrap, self.environment(), &defaults);

        let mut sources = Vec::with_capacity(specs.len());
        for spec in specs {
            let locator = self.registry.locator(spec.locator())?;
            let path = if spec.resolve() {
                strategy.resolve(spec.value(), &layers)
            } else {
                spec.value().to_string()
            };

            let mut source = locator.locate(&path);
            if spec.content_type() != SupportedType::Auto {
                source.set_content_type(spec.content_type());
            }
            debug!(declared = spec.value(), %source, "located source");
            sources.push(source);
        }

        Ok(sources)
    }

    /// Expands `template` the way a resolved source path would be.
    pub fn resolve(&self, template: &str, resolver: &ResolverConfig) -> Result<String, Error> {
        let strategy = self.registry.resolver(resolver.implementation())?;
        let (bootstrap, defaults) = self.property_maps(resolver)?;
        let layers = PropertyLayers::new(&bootstrap, self.environment(), &defaults);
        Ok(strategy.resolve(template, &layers))
    }

    /// Builds the bootstrap and default property maps of `resolver`.
    ///
    /// Returns `(bootstrap, defaults)`.
    pub fn property_maps(&self, resolver: &ResolverConfig) -> Result<(PropertyMap, PropertyMap), Error> {
        let defaults = default_map(resolver.properties());
        let bootstrap = match resolver.bootstrap() {
            Some(bootstrap) if !bootstrap.sources().is_empty() => self.bootstrap_map(bootstrap)?,
            _ => PropertyMap::new(),
        };
        Ok((bootstrap, defaults))
    }

    fn bootstrap_map(&self, bootstrap: &Bootstrap) -> Result<PropertyMap, Error> {
        let resolver = ResolverConfig::from(bootstrap.resolver().clone());
        let sources = self.locate_sources(bootstrap.sources(), &resolver)?;
        let properties = load::structured(&sources, bootstrap.merge()).to_properties();
        debug!(keys = properties.len(), "loaded bootstrap properties");
        Ok(properties)
    }
}

fn default_map(properties: &[DefaultProperty]) -> PropertyMap {
    let mut defaults = PropertyMap::new();
    for property in properties {
        if property.key().is_empty() {
            trace!("skipping default property with empty key");
            continue;
        }
        if defaults.contains_key(property.key()) {
            trace!(key = property.key(), "ignoring duplicate default property");
            continue;
        }
        defaults.insert(property.key().to_string(), property.value().to_string());
    }
    defaults
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapResolver;
    use crate::locator::{Locator, ResourcePath};
    use crate::property::MapEnvironment;
    use std::fs;

    fn pipeline(resources: ResourcePath, env: MapEnvironment) -> Pipeline {
        Pipeline::new(
            Arc::new(StrategyRegistry::with_defaults(resources)),
            Arc::new(env),
        )
    }

    #[test]
    fn test_empty_declaration_yields_unfound_sentinel() {
        let sources = pipeline(ResourcePath::new(), MapEnvironment::new())
            .locate(&Configuration::new())
            .unwrap();

        assert_eq!(sources.len(), 1);
        assert!(!sources[0].available());
        assert_eq!(sources[0].path(), "");
    }

    #[test]
    fn test_sources_keep_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.properties");
        fs::write(&present, "a=1").unwrap();

        let configuration = Configuration::new()
            .with_source(dir.path().join("missing.properties").display().to_string())
            .with_source(present.display().to_string())
            .with_source("resource:nowhere.properties");

        let sources = pipeline(ResourcePath::new(), MapEnvironment::new())
            .locate(&configuration)
            .unwrap();

        let available: Vec<_> = sources.iter().map(Source::available).collect();
        assert_eq!(available, vec![false, true, false]);
        assert_eq!(sources[2].path(), "nowhere.properties");
    }

    #[test]
    fn test_unresolved_template_is_used_verbatim() {
        let resources = ResourcePath::new().with_embedded("${name}.properties", "a=1");
        let env = MapEnvironment::new().with_var("name", "other");

        let configuration = Configuration::new().with_source("resource:${name}.properties");
        let sources = pipeline(resources, env).locate(&configuration).unwrap();

        assert!(sources[0].available());
        assert_eq!(sources[0].path(), "${name}.properties");
    }

    #[test]
    fn test_resolved_template_uses_environment() {
        let resources = ResourcePath::new().with_embedded("dev/app.properties", "a=1");
        let env = MapEnvironment::new().with_var("profile", "dev");

        let configuration =
            Configuration::new().with_source(SourceSpec::resolved("resource:${profile}/app.properties"));
        let sources = pipeline(resources, env).locate(&configuration).unwrap();

        assert!(sources[0].available());
        assert_eq!(sources[0].path(), "dev/app.properties");
    }

    #[test]
    fn test_declared_type_is_stamped() {
        let configuration = Configuration::new()
            .with_source(SourceSpec::new("app.conf").with_type(SupportedType::Ini))
            .with_source("other.conf");

        let sources = pipeline(ResourcePath::new(), MapEnvironment::new())
            .locate(&configuration)
            .unwrap();

        assert_eq!(sources[0].content_type(), SupportedType::Ini);
        assert_eq!(sources[1].content_type(), SupportedType::Auto);
    }

    #[test]
    fn test_explicit_locator_is_used() {
        let resources = ResourcePath::new().with_embedded("app.properties", "a=1");
        let configuration = Configuration::new()
            .with_source(SourceSpec::new("app.properties").with_locator("resource"))
            .with_source(SourceSpec::new("resource:app.properties").with_locator("null"));

        let sources = pipeline(resources, MapEnvironment::new())
            .locate(&configuration)
            .unwrap();

        assert!(sources[0].available());
        assert!(!sources[1].available());
    }

    #[test]
    fn test_unknown_strategy_without_default_is_an_error() {
        #[derive(Debug)]
        struct Anything;
        impl Locator for Anything {
            fn locate(&self, path: &str) -> Source {
                Source::memory(path, "")
            }
        }

        let registry = StrategyRegistry::empty().with_locator("anything", Arc::new(Anything));
        let pipeline = Pipeline::new(Arc::new(registry), Arc::new(MapEnvironment::new()));

        let result = pipeline.locate(&Configuration::new().with_source("app.properties"));
        assert!(matches!(result, Err(Error::UnknownResolver(_))));
    }

    #[test]
    fn test_default_map_skips_empty_and_duplicate_keys() {
        let resolver = ResolverConfig::new()
            .with_property("", "ignored")
            .with_property("file", "priority")
            .with_property("file", "dupe");

        let (bootstrap, defaults) = pipeline(ResourcePath::new(), MapEnvironment::new())
            .property_maps(&resolver)
            .unwrap();

        assert!(bootstrap.is_empty());
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults["file"], "priority");
    }

    #[test]
    fn test_bootstrap_map_is_loaded_from_sources() {
        let resources = ResourcePath::new()
            .with_embedded("bootstrap.properties", "dir=conf\nname=${missing}")
            .with_embedded("extra.toml", "[server]\nport = 8080\n");

        let resolver = ResolverConfig::new().with_bootstrap(
            Bootstrap::new()
                .with_source("resource:bootstrap.properties")
                .with_source("resource:extra.toml")
                .with_merge(true),
        );

        let (bootstrap, _) = pipeline(resources, MapEnvironment::new())
            .property_maps(&resolver)
            .unwrap();

        assert_eq!(bootstrap["dir"], "conf");
        assert_eq!(bootstrap["name"], "${missing}");
        assert_eq!(bootstrap["server.port"], "8080");
    }

    #[test]
    fn test_bootstrap_sources_use_bootstrap_resolver() {
        let resources = ResourcePath::new().with_embedded("boot/dev.properties", "dir=conf");

        let resolver = ResolverConfig::new()
            .with_property("stage", "ignored")
            .with_bootstrap(
                Bootstrap::new()
                    .with_source(SourceSpec::resolved("resource:boot/${stage}.properties"))
                    .with_resolver(BootstrapResolver::new().with_property("stage", "dev")),
            );

        let (bootstrap, _) = pipeline(resources, MapEnvironment::new())
            .property_maps(&resolver)
            .unwrap();

        assert_eq!(bootstrap["dir"], "conf");
    }

    #[test]
    fn test_resolve_template() {
        let env = MapEnvironment::new().with_system_property("user.home", "/home/app");
        let resolved = pipeline(ResourcePath::new(), env)
            .resolve("${user.home}/.app", &ResolverConfig::new())
            .unwrap();

        assert_eq!(resolved, "/home/app/.app");
    }
}
