use thiserror::Error;

/// Top-level error type for the cfgsource library.
///
/// Missing sources and unparseable content are never errors; they degrade to
/// empty results. Only misconfiguration that cannot be guessed around is
/// reported here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("no locator registered as '{0}' and no default locator to fall back to")]
    UnknownLocator(String),

    #[error("no property resolver registered as '{0}' and no default resolver to fall back to")]
    UnknownResolver(String),

    #[error("failed to deserialize configuration: {0}")]
    Deserialize(#[from] toml::de::Error),
}
