use serde::de::DeserializeOwned;
use toml::{Table, Value};

use super::format::{coerce_table, flatten, value_to_string};
use super::RESOURCE_CHAIN_KEY;
use crate::property::PropertyMap;
use crate::Error;

#[derive(Debug, Clone)]
struct Layer {
    /// `None` for the provenance layer.
    origin: Option<String>,
    table: Table,
    /// Scalars were read as text and are coerced in typed views.
    text: bool,
}

/// A layered configuration view.
///
/// Each loaded source contributes one layer. Queries walk the layers in
/// order and the first layer that has a key wins, so the source declared
/// first overrides everything after it. Missing keys are `None`, never an
/// error.
///
/// Keys are looked up both as flat keys (`server.port` in a properties file)
/// and as dotted paths into nested tables (`[server] port` in TOML).
///
/// The paths of the loaded sources are recorded under [`RESOURCE_CHAIN_KEY`]
/// as `[first, second, ...]`, or `[]` when nothing was loaded.
///
/// Formats without typed scalars (properties, INI, XML) hold every value as a
/// string. [`get`](Self::get) returns those strings as read; [`merged`](Self::merged)
/// and [`deserialize`](Self::deserialize) convert `true`/`false`, integers, and
/// decimals to typed values.
#[derive(Debug, Clone, Default)]
pub struct StructuredConfig {
    layers: Vec<Layer>,
}

impl StructuredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer below the existing ones. Empty tables are ignored.
    pub fn add_layer(&mut self, origin: impl Into<String>, table: Table) {
        self.push(origin.into(), table, false);
    }

    /// Adds a layer whose scalars are all strings read from text.
    pub fn add_text_layer(&mut self, origin: impl Into<String>, table: Table) {
        self.push(origin.into(), table, true);
    }

    fn push(&mut self, origin: String, table: Table, text: bool) {
        if table.is_empty() {
            return;
        }
        self.layers.push(Layer {
            origin: Some(origin),
            table,
            text,
        });
    }

    pub(crate) fn record_chain(&mut self) {
        let origins: Vec<&str> = self.origins().collect();
        let chain = format!("[{}]", origins.join(", "));
        let mut table = Table::new();
        table.insert(RESOURCE_CHAIN_KEY.to_string(), Value::String(chain));
        self.layers.push(Layer {
            origin: None,
            table,
            text: false,
        });
    }

    /// True when no source contributed a layer.
    pub fn is_empty(&self) -> bool {
        self.origins().next().is_none()
    }

    /// Paths of the loaded sources, highest priority first.
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter_map(|layer| layer.origin.as_deref())
    }

    /// The provenance chain, once recorded by the load engine.
    pub fn resource_chain(&self) -> Option<&str> {
        self.layers
            .iter()
            .filter(|layer| layer.origin.is_none())
            .find_map(|layer| layer.table.get(RESOURCE_CHAIN_KEY))
            .and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.layers.iter().find_map(|layer| {
            layer
                .table
                .get(key)
                .or_else(|| lookup_path(&layer.table, key))
        })
    }

    /// Returns the value of a scalar key as a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(value_to_string)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All flattened keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.to_properties().into_keys().collect()
    }

    /// Flattens every layer to dotted keys; earlier layers win.
    pub fn to_properties(&self) -> PropertyMap {
        let mut properties = PropertyMap::new();
        for layer in self.layers.iter().rev() {
            properties.extend(flatten(&layer.table));
        }
        properties
    }

    /// Deep-merges the loaded layers into one table; earlier layers win.
    ///
    /// Text scalars are coerced. The provenance chain is not part of the
    /// result.
    pub fn merged(&self) -> Table {
        let mut merged = Table::new();
        for layer in self.layers.iter().rev().filter(|layer| layer.origin.is_some()) {
            let table = if layer.text {
                coerce_table(layer.table.clone())
            } else {
                layer.table.clone()
            };
            deep_merge(&mut merged, table);
        }
        merged
    }

    /// Deserializes the merged view into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(Value::Table(self.merged()).try_into()?)
    }
}

fn lookup_path<'a>(root: &'a Table, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    if first.is_empty() {
        return None;
    }

    let mut current = root.get(first)?;
    for part in parts {
        if part.is_empty() {
            return None;
        }
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// Overlay wins, so callers apply layers lowest priority first.
fn deep_merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(base_table)), Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn table(text: &str) -> Table {
        toml::from_str(text).unwrap()
    }

    fn config() -> StructuredConfig {
        let mut config = StructuredConfig::new();
        config.add_layer(
            "first.toml",
            table(
                r#"
                name = "first"
                [server]
                host = "first.example.com"
                "#,
            ),
        );
        config.add_layer(
            "second.toml",
            table(
                r#"
                name = "second"
                extra = true
                [server]
                host = "second.example.com"
                port = 8080
                "#,
            ),
        );
        config.record_chain();
        config
    }

    #[test]
    fn test_earlier_layers_win() {
        let config = config();

        assert_eq!(config.get_str("name").as_deref(), Some("first"));
        assert_eq!(config.get_str("server.host").as_deref(), Some("first.example.com"));
        assert_eq!(config.get_str("server.port").as_deref(), Some("8080"));
        assert_eq!(config.get_str("extra").as_deref(), Some("true"));
    }

    #[test]
    fn test_missing_keys_are_none() {
        let config = config();

        assert!(config.get("missing").is_none());
        assert!(config.get("server.missing").is_none());
        assert!(config.get("name.nested").is_none());
        assert!(config.get("").is_none());
        assert!(config.get("server.").is_none());
        assert!(!config.contains_key("missing"));
        assert!(StructuredConfig::new().get("anything").is_none());
    }

    #[test]
    fn test_tables_are_not_strings() {
        let config = config();

        assert!(config.contains_key("server"));
        assert!(config.get_str("server").is_none());
    }

    #[test]
    fn test_flat_keys() {
        let mut config = StructuredConfig::new();
        let mut flat = Table::new();
        flat.insert("server.port".to_string(), Value::String("9090".to_string()));
        config.add_layer("app.properties", flat);
        config.add_layer("app.toml", table("[server]\nport = 8080\nhost = \"h\"\n"));

        assert_eq!(config.get_str("server.port").as_deref(), Some("9090"));
        assert_eq!(config.get_str("server.host").as_deref(), Some("h"));
    }

    #[test]
    fn test_to_properties_respects_priority() {
        let properties = config().to_properties();

        assert_eq!(properties["name"], "first");
        assert_eq!(properties["server.host"], "first.example.com");
        assert_eq!(properties["server.port"], "8080");
        assert_eq!(
            properties[RESOURCE_CHAIN_KEY],
            "[first.toml, second.toml]"
        );
    }

    #[test]
    fn test_resource_chain() {
        let config = config();

        assert_eq!(config.resource_chain(), Some("[first.toml, second.toml]"));
        assert_eq!(config.origins().collect::<Vec<_>>(), vec!["first.toml", "second.toml"]);

        assert!(StructuredConfig::new().resource_chain().is_none());

        let mut empty = StructuredConfig::new();
        empty.record_chain();
        assert!(empty.is_empty());
        assert_eq!(empty.resource_chain(), Some("[]"));
        assert!(empty.merged().is_empty());
    }

    #[test]
    fn test_empty_layers_are_ignored() {
        let mut config = StructuredConfig::new();
        config.add_layer("empty.toml", Table::new());

        assert!(config.is_empty());
        assert_eq!(config.origins().count(), 0);
    }

    #[test]
    fn test_keys() {
        let keys = config().keys();
        assert!(keys.contains(&"server.port".to_string()));
        assert!(keys.contains(&"extra".to_string()));
    }

    #[test]
    fn test_merged_deserialize() {
        #[derive(Debug, Deserialize)]
        struct Server {
            host: String,
            port: u16,
        }

        #[derive(Debug, Deserialize)]
        struct App {
            name: String,
            extra: bool,
            server: Server,
        }

        let config = config();
        assert!(!config.merged().contains_key(RESOURCE_CHAIN_KEY));

        let app: App = config.deserialize().unwrap();
        assert_eq!(app.name, "first");
        assert!(app.extra);
        assert_eq!(app.server.host, "first.example.com");
        assert_eq!(app.server.port, 8080);
    }

    #[test]
    fn test_deserialize_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Strict {
            required: String,
        }

        let result = config().deserialize::<Strict>();
        assert!(matches!(result, Err(Error::Deserialize(_))));
    }

    #[test]
    fn test_text_layers_are_coerced_for_typed_views() {
        #[derive(Debug, Deserialize)]
        struct Server {
            host: String,
            port: u16,
            tls: bool,
            ratio: f64,
        }

        let mut text = Table::new();
        text.insert("port".to_string(), Value::String("9090".to_string()));
        text.insert("tls".to_string(), Value::String("TRUE".to_string()));

        let mut config = StructuredConfig::new();
        config.add_text_layer("server.ini", text);
        config.add_layer(
            "server.toml",
            table("host = \"localhost\"\nport = 8080\ntls = false\nratio = 0.5\n"),
        );

        assert_eq!(config.get("port").and_then(Value::as_str), Some("9090"));

        let server: Server = config.deserialize().unwrap();
        assert_eq!(server.host, "localhost");
        assert_eq!(server.port, 9090);
        assert!(server.tls);
        assert_eq!(server.ratio, 0.5);
    }

    #[test]
    fn test_typed_layers_are_not_coerced() {
        let mut config = StructuredConfig::new();
        config.add_layer("app.toml", table("version = \"10\"\n"));

        assert_eq!(config.merged()["version"].as_str(), Some("10"));
    }
}
