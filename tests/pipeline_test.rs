use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cfgsource::property::{DefaultPropertyResolver, MapEnvironment, PropertyLayers};
use cfgsource::registry::RESOURCE_LOCATOR;
use cfgsource::{
    Bootstrap, ConfigContext, Configuration, Locator, PropertyResolver, ResolverConfig, ResourcePath, Source,
    SourceSpec, StrategyRegistry, SupportedType,
};
use serde::Deserialize;

const RESOURCES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/resources");

fn resources() -> ResourcePath {
    ResourcePath::new().with_root(RESOURCES)
}

fn context() -> ConfigContext {
    ConfigContext::builder()
        .with_resource_path(resources())
        .with_environment(Arc::new(MapEnvironment::new()))
        .build()
}

fn priorities() -> Configuration {
    Configuration::new().with_sources([
        "resource:properties/priority1.properties",
        "resource:properties/priority2.properties",
        "resource:properties/priority3.properties",
    ])
}

#[test]
fn test_without_merge_first_source_wins() {
    let properties = context().properties(&priorities()).unwrap();

    assert_eq!(properties["common"], "value1");
    assert_eq!(properties["shared"], "shared");
    assert_eq!(properties["one"], "one");
    assert!(!properties.contains_key("two"));
    assert!(!properties.contains_key("three"));
}

#[test]
fn test_with_merge_union_and_first_declared_wins() {
    let properties = context().properties(&priorities().with_merge(true)).unwrap();

    assert_eq!(properties["common"], "value1");
    assert_eq!(properties["shared"], "shared");
    assert_eq!(properties["one"], "one");
    assert_eq!(properties["two"], "two");
    assert_eq!(properties["three"], "three");
}

#[test]
fn test_without_merge_missing_first_source_falls_through() {
    let configuration = Configuration::new().with_sources([
        "resource:properties/priority0.properties",
        "resource:properties/priority2.properties",
        "resource:properties/priority3.properties",
    ]);

    let properties = context().properties(&configuration).unwrap();
    assert_eq!(properties["common"], "value2");
    assert!(!properties.contains_key("three"));
}

#[test]
fn test_structured_respects_priority() {
    let context = context();

    let structured = context.structured(&priorities().with_merge(true)).unwrap();
    assert_eq!(structured.get_str("common").as_deref(), Some("value1"));
    assert_eq!(structured.get_str("three").as_deref(), Some("three"));
    assert_eq!(structured.origins().count(), 3);

    let structured = context.structured(&priorities()).unwrap();
    assert_eq!(structured.get_str("common").as_deref(), Some("value1"));
    assert!(!structured.contains_key("two"));
    assert_eq!(
        structured.resource_chain(),
        Some("[properties/priority1.properties]")
    );
}

#[test]
fn test_empty_declaration_yields_one_unfound_source() {
    let sources = context().sources(&Configuration::new()).unwrap();

    assert_eq!(sources.len(), 1);
    assert!(!sources[0].available());
}

#[test]
fn test_unavailable_source_has_empty_stream() {
    let configuration = Configuration::new()
        .with_source("/nonexistent/app.properties")
        .with_source("resource:properties/nonexistent.properties");

    let context = context();
    for source in context.sources(&configuration).unwrap() {
        assert!(!source.available());
        let mut content = Vec::new();
        source.stream().read_to_end(&mut content).unwrap();
        assert!(content.is_empty());
    }

    let mut content = Vec::new();
    context
        .stream(&configuration)
        .unwrap()
        .read_to_end(&mut content)
        .unwrap();
    assert!(content.is_empty());
}

#[test]
fn test_bootstrap_drives_path_resolution() {
    let resolver = ResolverConfig::new()
        .with_property("file", "priority")
        .with_property("extension", "bad")
        .with_property("propertiesPath", "none")
        .with_property("file", "dupe")
        .with_bootstrap(Bootstrap::new().with_source("resource:properties/bootstrap.properties"));

    let configuration = Configuration::new()
        .with_source(SourceSpec::resolved("resource:${propertiesPath}/${file}1.${extension}"))
        .with_resolver(resolver);

    let context = context();
    let sources = context.sources(&configuration).unwrap();
    assert_eq!(sources[0].path(), "properties/priority1.properties");
    assert!(sources[0].available());

    let properties = context.properties(&configuration).unwrap();
    assert_eq!(properties["common"], "value1");
}

#[test]
fn test_environment_outranks_defaults_in_paths() {
    let context = ConfigContext::builder()
        .with_resource_path(resources())
        .with_environment(Arc::new(MapEnvironment::new().with_var("level", "2")))
        .build();

    let configuration = Configuration::new()
        .with_source(SourceSpec::resolved("resource:properties/priority${level}.properties"))
        .with_resolver(ResolverConfig::new().with_property("level", "3"));

    assert_eq!(context.properties(&configuration).unwrap()["common"], "value2");
}

#[derive(Debug, Default)]
struct CountingResolver {
    calls: AtomicUsize,
}

impl PropertyResolver for CountingResolver {
    fn resolve(&self, template: &str, layers: &PropertyLayers<'_>) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DefaultPropertyResolver.resolve(template, layers)
    }
}

#[test]
fn test_shared_resolver_observes_every_resolution() {
    let counting = Arc::new(CountingResolver::default());
    let registry = StrategyRegistry::with_defaults(resources()).with_resolver("counting", counting.clone());
    let context = ConfigContext::builder()
        .with_registry(registry)
        .with_environment(Arc::new(MapEnvironment::new()))
        .build();

    let configuration = Configuration::new()
        .with_source(SourceSpec::resolved("resource:properties/${name}1.properties"))
        .with_source(SourceSpec::resolved("resource:properties/${name}2.properties"))
        .with_source("resource:properties/priority3.properties")
        .with_resolver(
            ResolverConfig::new()
                .with_implementation("counting")
                .with_property("name", "priority"),
        );

    context.sources(&configuration).unwrap();
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);

    let properties = context.properties(&configuration.with_merge(true)).unwrap();
    assert_eq!(counting.calls.load(Ordering::SeqCst), 4);
    assert_eq!(properties["two"], "two");
}

#[derive(Debug)]
struct EchoLocator;

impl Locator for EchoLocator {
    fn locate(&self, path: &str) -> Source {
        Source::memory(path, format!("located={path}"))
    }
}

#[test]
fn test_custom_and_unknown_locators() {
    let registry = StrategyRegistry::with_defaults(resources()).with_locator("echo", Arc::new(EchoLocator));
    let context = ConfigContext::builder()
        .with_registry(registry)
        .with_environment(Arc::new(MapEnvironment::new()))
        .build();

    let echoed = Configuration::new().with_source(SourceSpec::new("anything").with_locator("echo"));
    assert_eq!(context.properties(&echoed).unwrap()["located"], "anything");

    let unknown = Configuration::new()
        .with_source(SourceSpec::new("resource:properties/priority2.properties").with_locator("unknown"));
    assert_eq!(context.properties(&unknown).unwrap()["common"], "value2");

    let resource_only = Configuration::new()
        .with_source(SourceSpec::new("properties/priority3.properties").with_locator(RESOURCE_LOCATOR));
    assert_eq!(context.properties(&resource_only).unwrap()["common"], "value3");
}

#[test]
fn test_files_and_resources_mix() {
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("local.properties");
    std::fs::write(&local, "common=local\nlocal=yes\n").unwrap();

    let configuration = Configuration::new()
        .with_source(local.display().to_string())
        .with_source("resource:properties/priority1.properties")
        .with_merge(true);

    let properties = context().properties(&configuration).unwrap();
    assert_eq!(properties["common"], "local");
    assert_eq!(properties["local"], "yes");
    assert_eq!(properties["one"], "one");
}

#[test]
fn test_structured_formats() {
    #[derive(Debug, Deserialize)]
    struct Server {
        host: String,
        port: u16,
        timeout: u32,
        tls: bool,
    }

    #[derive(Debug, Deserialize)]
    struct App {
        name: String,
        feature: Vec<String>,
        server: Server,
    }

    let configuration = Configuration::new()
        .with_sources([
            "resource:structured/app.xml",
            "resource:structured/app.ini",
            "resource:structured/app.json",
        ])
        .with_merge(true);

    let context = context();
    let structured = context.structured(&configuration).unwrap();
    assert_eq!(structured.get_str("name").as_deref(), Some("from-xml"));
    assert_eq!(structured.get_str("server.host").as_deref(), Some("xml.example.com"));
    assert_eq!(structured.get_str("server.port").as_deref(), Some("8081"));
    assert_eq!(structured.get_str("server.timeout").as_deref(), Some("30"));
    assert_eq!(structured.get_str("server.tls").as_deref(), Some("true"));
    assert_eq!(
        structured.resource_chain(),
        Some("[structured/app.xml, structured/app.ini, structured/app.json]")
    );

    let app: App = context.deserialize(&configuration).unwrap();
    assert_eq!(app.name, "from-xml");
    assert_eq!(app.feature, vec!["alpha", "beta"]);
    assert_eq!(app.server.host, "xml.example.com");
    assert_eq!(app.server.port, 8081);
    assert_eq!(app.server.timeout, 30);
    assert!(app.server.tls);
}

#[test]
fn test_xml_properties_and_declared_types() {
    let configuration = Configuration::new()
        .with_source("resource:structured/entries.xml")
        .with_source(SourceSpec::new("resource:structured/app.ini").with_type(SupportedType::Ini))
        .with_source("resource:properties/priority1.properties")
        .with_merge(true);

    let context = context();
    let sources = context.sources(&configuration).unwrap();
    assert_eq!(sources[1].content_type(), SupportedType::Ini);

    let properties = context.properties(&configuration).unwrap();
    assert_eq!(properties["common"], "xml-value");
    assert_eq!(properties["xml.only"], "yes");
    assert_eq!(properties["server.port"], "8082");
    assert_eq!(properties["one"], "one");
}

#[test]
fn test_declaration_read_from_toml() {
    let configuration: Configuration = toml::from_str(
        r#"
        merge = true

        [[sources]]
        value = "resource:${propertiesPath}/priority2.properties"
        resolve = true

        [[sources]]
        value = "resource:properties/priority3.properties"

        [resolver.bootstrap]
        sources = [{ value = "resource:properties/bootstrap.properties" }]
        "#,
    )
    .unwrap();

    let properties = context().properties(&configuration).unwrap();
    assert_eq!(properties["common"], "value2");
    assert_eq!(properties["three"], "three");
}
