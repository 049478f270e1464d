//! JSON, YAML and TOML documents, all normalized to TOML values.
//!
//! JSON and YAML nulls have no TOML counterpart and are dropped.
//!
//! Text formats keep scalars as strings; [`coerce_table`] types them.

use toml::{Table, Value};

use super::ParseError;
use crate::property::PropertyMap;
use crate::source::SupportedType;

pub(crate) fn parse_json(text: &str) -> Result<Table, ParseError> {
    let document: serde_json::Value = serde_json::from_str(text)?;
    match from_json(document) {
        Some(Value::Table(table)) => Ok(table),
        _ => Err(ParseError::NotATable(SupportedType::Json)),
    }
}

pub(crate) fn parse_yaml(text: &str) -> Result<Table, ParseError> {
    let document: serde_yaml::Value = serde_yaml::from_str(text)?;
    match from_yaml(document) {
        Some(Value::Table(table)) => Ok(table),
        // an empty document
        None => Ok(Table::new()),
        Some(_) => Err(ParseError::NotATable(SupportedType::Yaml)),
    }
}

pub(crate) fn parse_toml(text: &str) -> Result<Table, ParseError> {
    Ok(toml::from_str(text)?)
}

fn from_json(value: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;

    match value {
        Json::Null => None,
        Json::Bool(b) => Some(Value::Boolean(b)),
        Json::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::String(n.to_string()),
        }),
        Json::String(s) => Some(Value::String(s)),
        Json::Array(items) => Some(Value::Array(items.into_iter().filter_map(from_json).collect())),
        Json::Object(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(key, value)| from_json(value).map(|value| (key, value)))
                .collect(),
        )),
    }
}

fn from_yaml(value: serde_yaml::Value) -> Option<Value> {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => None,
        Yaml::Bool(b) => Some(Value::Boolean(b)),
        Yaml::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::String(n.to_string()),
        }),
        Yaml::String(s) => Some(Value::String(s)),
        Yaml::Sequence(items) => Some(Value::Array(items.into_iter().filter_map(from_yaml).collect())),
        Yaml::Mapping(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(key, value)| Some((yaml_key(key)?, from_yaml(value)?)))
                .collect(),
        )),
        Yaml::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Some(s),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Converts a scalar TOML value to its string representation.
///
/// Returns `None` for arrays and tables.
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

/// Flattens nested tables to dotted keys.
///
/// Arrays of scalars are joined with `,`; other arrays are flattened with
/// their indices as keys.
pub(crate) fn flatten(table: &Table) -> PropertyMap {
    let mut properties = PropertyMap::new();
    flatten_table(&mut properties, None, table);
    properties
}

fn flatten_table(properties: &mut PropertyMap, prefix: Option<&str>, table: &Table) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        flatten_value(properties, key, value);
    }
}

fn flatten_value(properties: &mut PropertyMap, key: String, value: &Value) {
    match value {
        Value::Table(table) => flatten_table(properties, Some(&key), table),
        Value::Array(items) if items.iter().all(|item| value_to_string(item).is_some()) => {
            let joined: Vec<String> = items.iter().filter_map(value_to_string).collect();
            properties.insert(key, joined.join(","));
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(properties, format!("{key}.{index}"), item);
            }
        }
        scalar => {
            if let Some(value) = value_to_string(scalar) {
                properties.insert(key, value);
            }
        }
    }
}

/// Converts text scalars to booleans, integers and floats where they parse.
pub(crate) fn coerce_table(table: Table) -> Table {
    table
        .into_iter()
        .map(|(key, value)| (key, coerce(value)))
        .collect()
}

fn coerce(value: Value) -> Value {
    match value {
        Value::String(s) => coerce_value(&s),
        Value::Array(items) => Value::Array(items.into_iter().map(coerce).collect()),
        Value::Table(table) => Value::Table(coerce_table(table)),
        other => other,
    }
}

fn coerce_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }
    if s.contains('.') {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::String(s.to_string())
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
