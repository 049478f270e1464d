use std::sync::Arc;

use cfgsource::property::ProcessEnvironment;
use cfgsource::{ConfigContext, Configuration, ResolverConfig, ResourcePath, SourceSpec};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct AppConfig {
    name: String,
    server: ServerSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    host: String,
    port: u16,
}

const DEFAULTS: &str = r#"
name = "demo"

[server]
host = "localhost"
port = 8080
"#;

fn main() -> Result<(), cfgsource::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // LAYERED__PROFILE=prod selects ~/.layered-demo/prod.ini
    let resources = ResourcePath::from_env().with_embedded("layered/defaults.toml", DEFAULTS);
    let context = ConfigContext::builder()
        .with_resource_path(resources)
        .with_environment(Arc::new(
            ProcessEnvironment::new().with_prefixed_vars("LAYERED", "__"),
        ))
        .build();

    let resolver = ResolverConfig::new().with_property("profile", "dev");
    let configuration = Configuration::new()
        .with_source(SourceSpec::resolved("${user.home}/.layered-demo/${profile}.ini"))
        .with_source("resource:layered/defaults.toml")
        .with_merge(true)
        .with_resolver(resolver.clone())
        .with_logging(true);

    for source in context.sources(&configuration)? {
        println!("{source}");
    }

    let structured = context.structured(&configuration)?;
    println!("loaded from {}", structured.resource_chain().unwrap_or("nothing"));

    let app: AppConfig = structured.deserialize()?;
    println!(
        "{} listens on {}:{} (profile {})",
        app.name,
        app.server.host,
        app.server.port,
        context.property("${profile}", "none", &resolver)?
    );

    Ok(())
}
