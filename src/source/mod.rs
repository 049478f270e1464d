//! Lazy handles to candidate configuration blobs.

pub mod mime;

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::locator::ResourcePath;

/// Content types the load engine knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedType {
    Xml,
    Json,
    Yaml,
    Ini,
    Toml,
    Text,
    /// Not declared; the type is guessed when the source is loaded.
    #[default]
    Auto,
}

impl SupportedType {
    pub fn name(self) -> &'static str {
        match self {
            SupportedType::Xml => "xml",
            SupportedType::Json => "json",
            SupportedType::Yaml => "yaml",
            SupportedType::Ini => "ini",
            SupportedType::Toml => "toml",
            SupportedType::Text => "text",
            SupportedType::Auto => "auto",
        }
    }
}

impl fmt::Display for SupportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
enum Origin {
    File(PathBuf),
    Resource(ResourcePath),
    Memory(Arc<[u8]>),
    Unfound,
}

/// One candidate configuration blob.
///
/// A `Source` is only a handle: availability is checked on every call to
/// [`available`](Self::available) and the content is opened on every call to
/// [`stream`](Self::stream). A source that is not available still hands out a
/// valid, empty stream, so callers never have to special-case missing files.
#[derive(Debug, Clone)]
pub struct Source {
    path: String,
    origin: Origin,
    content_type: SupportedType,
}

impl Source {
    /// A source backed by a file on disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            path: path.display().to_string(),
            origin: Origin::File(path),
            content_type: SupportedType::Auto,
        }
    }

    /// A source backed by the resource `name` in `resources`.
    pub fn resource(resources: ResourcePath, name: impl Into<String>) -> Self {
        Self {
            path: name.into(),
            origin: Origin::Resource(resources),
            content_type: SupportedType::Auto,
        }
    }

    /// A source whose content is already in memory. Always available.
    pub fn memory(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content: Vec<u8> = content.into();
        Self {
            path: path.into(),
            origin: Origin::Memory(Arc::from(content)),
            content_type: SupportedType::Auto,
        }
    }

    /// A source that could not be found. `path` is kept for diagnostics.
    pub fn unfound(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            origin: Origin::Unfound,
            content_type: SupportedType::Auto,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The text after the final `.` of the last path segment, or `""`.
    pub fn extension(&self) -> &str {
        let name = self
            .path
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        match name.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => "",
        }
    }

    pub fn available(&self) -> bool {
        match &self.origin {
            Origin::File(path) => path.is_file(),
            Origin::Resource(resources) => resources.find(&self.path).is_some(),
            Origin::Memory(_) => true,
            Origin::Unfound => false,
        }
    }

    /// The declared content type, or [`SupportedType::Auto`] if none was declared.
    pub fn content_type(&self) -> SupportedType {
        self.content_type
    }

    pub fn set_content_type(&mut self, content_type: SupportedType) {
        self.content_type = content_type;
    }

    /// Opens the content of the source.
    ///
    /// Never fails: if the source is unavailable or cannot be opened the
    /// returned stream is empty.
    pub fn stream(&self) -> Box<dyn Read + Send> {
        match &self.origin {
            Origin::File(path) => match File::open(path) {
                Ok(file) => Box::new(BufReader::new(file)),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "could not open file source");
                    Box::new(io::empty())
                }
            },
            Origin::Resource(resources) => resources
                .open(&self.path)
                .unwrap_or_else(|| Box::new(io::empty())),
            Origin::Memory(content) => Box::new(Cursor::new(Arc::clone(content))),
            Origin::Unfound => Box::new(io::empty()),
        }
    }

    /// Reads the whole content of the source. The stream is closed on return.
    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.stream().read_to_end(&mut content)?;
        Ok(content)
    }

    fn kind(&self) -> &'static str {
        match self.origin {
            Origin::File(_) => "FileSource",
            Origin::Resource(_) => "ResourceSource",
            Origin::Memory(_) => "MemorySource",
            Origin::Unfound => "UnfoundSource",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' [available: {}]",
            self.kind(),
            self.path,
            self.available()
        )
    }
}
