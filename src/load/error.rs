use thiserror::Error;

use crate::source::SupportedType;

/// Why a single source could not be loaded.
///
/// Never fatal: the load engine logs it and carries on without the source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),

    #[error("source is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid properties at line {line}: {message}")]
    Properties { line: usize, message: String },

    #[error("invalid INI at line {line}: {message}")]
    Ini { line: usize, message: String },

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unclosed XML element '{0}'")]
    UnclosedElement(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0} document does not have a table at the top level")]
    NotATable(SupportedType),
}
