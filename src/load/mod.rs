//! Loading located sources into properties, structured views, or streams.
//!
//! Unavailable sources are skipped as the loaders meet them. A source that
//! fails to parse is logged and contributes nothing. No sources at all yields
//! an empty result, never an error.

mod error;
mod format;
mod ini;
mod properties;
mod structured;
mod xml;

use std::io::{self, Read};

use toml::{Table, Value};
use tracing::{debug, error, trace};

pub use error::ParseError;
pub use structured::StructuredConfig;

use crate::property::PropertyMap;
use crate::source::{mime, Source, SupportedType};

/// A flat property map loaded from sources.
pub type Properties = PropertyMap;

/// Key under which a [`StructuredConfig`] records the loaded source paths.
pub const RESOURCE_CHAIN_KEY: &str = "cfgsource.resource.chain";

/// Loads a flat property map.
///
/// Without `merge` the first available source that loads is the result.
/// With `merge` every available source is loaded and, on conflicting keys,
/// the source declared first wins.
pub fn properties(sources: &[Source], merge: bool) -> Properties {
    if !merge {
        for source in sources {
            if !source.available() {
                trace!(%source, "skipping unavailable source");
                continue;
            }
            match read_properties(source) {
                Ok(properties) => {
                    debug!(path = source.path(), keys = properties.len(), "loaded properties");
                    return properties;
                }
                Err(e) => error!(path = source.path(), error = %e, "failed to load properties"),
            }
        }
        return Properties::new();
    }

    let mut merged = Properties::new();
    for source in sources.iter().rev() {
        if !source.available() {
            trace!(%source, "skipping unavailable source");
            continue;
        }
        match read_properties(source) {
            Ok(properties) => {
                debug!(path = source.path(), keys = properties.len(), "merging properties");
                merged.extend(properties);
            }
            Err(e) => error!(path = source.path(), error = %e, "failed to load properties"),
        }
    }
    merged
}

/// Loads a layered structured view, one layer per non-empty source.
///
/// Without `merge` loading stops after the first source that loads and is
/// not empty.
pub fn structured(sources: &[Source], merge: bool) -> StructuredConfig {
    let mut config = StructuredConfig::new();

    for source in sources {
        if !source.available() {
            trace!(%source, "skipping unavailable source");
            continue;
        }
        match read_layer(source) {
            Ok((_, table)) if table.is_empty() => {
                debug!(path = source.path(), "source is empty, skipping");
            }
            Ok((content_type, table)) => {
                debug!(
                    path = source.path(),
                    keys = table.len(),
                    %content_type,
                    "loaded configuration layer"
                );
                if has_text_scalars(content_type) {
                    config.add_text_layer(source.path(), table);
                } else {
                    config.add_layer(source.path(), table);
                }
                if !merge {
                    break;
                }
            }
            Err(e) => error!(path = source.path(), error = %e, "failed to load configuration"),
        }
    }

    config.record_chain();
    config
}

/// The stream of the first available source.
///
/// Falls back to the (empty) stream of the first source, or to an empty
/// stream when there are no sources.
pub fn first_stream(sources: &[Source]) -> Box<dyn Read + Send> {
    match sources.iter().find(|source| source.available()).or(sources.first()) {
        Some(source) => source.stream(),
        None => Box::new(io::empty()),
    }
}

/// The streams of every available source, in declaration order.
///
/// Never empty: a single empty stream stands in when nothing is available.
pub fn streams(sources: &[Source]) -> Vec<Box<dyn Read + Send>> {
    let streams: Vec<_> = sources
        .iter()
        .filter(|source| source.available())
        .map(Source::stream)
        .collect();

    if streams.is_empty() {
        trace!("no available sources, returning an empty stream");
        return vec![Box::new(io::empty())];
    }
    streams
}

/// Reads `source` as a flat property map.
pub fn read_properties(source: &Source) -> Result<Properties, ParseError> {
    let content = source.read_bytes()?;
    match content_type(source, &content) {
        SupportedType::Xml => xml::parse_properties(&content),
        SupportedType::Text | SupportedType::Auto => properties::parse(text(&content)?),
        other => Ok(format::flatten(&parse_table(other, &content)?)),
    }
}

/// Reads `source` as a table.
///
/// Properties files give a table of flat keys.
pub fn read_table(source: &Source) -> Result<Table, ParseError> {
    read_layer(source).map(|(_, table)| table)
}

fn read_layer(source: &Source) -> Result<(SupportedType, Table), ParseError> {
    let content = source.read_bytes()?;
    let content_type = content_type(source, &content);
    Ok((content_type, parse_table(content_type, &content)?))
}

fn has_text_scalars(content_type: SupportedType) -> bool {
    matches!(
        content_type,
        SupportedType::Xml | SupportedType::Ini | SupportedType::Text | SupportedType::Auto
    )
}

fn parse_table(content_type: SupportedType, content: &[u8]) -> Result<Table, ParseError> {
    let text = text(content)?;
    if text.trim().is_empty() {
        return Ok(Table::new());
    }

    match content_type {
        SupportedType::Xml => xml::parse(content),
        SupportedType::Json => format::parse_json(text),
        SupportedType::Yaml => format::parse_yaml(text),
        SupportedType::Toml => format::parse_toml(text),
        SupportedType::Ini => ini::parse(text),
        SupportedType::Text | SupportedType::Auto => Ok(properties::parse(text)?
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect()),
    }
}

fn content_type(source: &Source, content: &[u8]) -> SupportedType {
    match source.content_type() {
        SupportedType::Auto => mime::guess_content(content, source.extension()),
        declared => declared,
    }
}

fn text(content: &[u8]) -> Result<&str, ParseError> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    Ok(std::str::from_utf8(content)?)
}
