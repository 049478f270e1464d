//! Resource lookup.
//!
//! A [`ResourcePath`] is an ordered search path of resource roots, plus
//! resources embedded in memory (typically with `include_bytes!`). Resource
//! names are relative, `/`-separated, and looked up against each root in
//! order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::Locator;
use crate::source::Source;

/// Environment variable holding the default resource roots, in the
/// platform's path-list syntax (`:`-separated on Unix).
pub const RESOURCE_PATH_VAR: &str = "CFGSOURCE_RESOURCE_PATH";

/// Where a resource was found.
#[derive(Debug, Clone)]
pub enum Resource {
    File(PathBuf),
    Embedded(Arc<[u8]>),
}

#[derive(Debug, Clone, Default)]
struct Inner {
    roots: Vec<PathBuf>,
    embedded: BTreeMap<String, Arc<[u8]>>,
}

/// Ordered set of places resources are looked up in.
///
/// Cheap to clone; clones share the same roots.
#[derive(Debug, Clone, Default)]
pub struct ResourcePath {
    inner: Arc<Inner>,
}

impl ResourcePath {
    /// An empty resource path; nothing can be found until roots are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots from [`RESOURCE_PATH_VAR`], or the current directory when the
    /// variable is unset.
    pub fn from_env() -> Self {
        match std::env::var_os(RESOURCE_PATH_VAR) {
            Some(value) => std::env::split_paths(&value)
                .filter(|root| !root.as_os_str().is_empty())
                .fold(Self::new(), |resources, root| resources.with_root(root)),
            None => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
                Self::new().with_root(cwd)
            }
        }
    }

    /// Appends a root directory. Earlier roots are searched first.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        Arc::make_mut(&mut self.inner)
            .roots
            .push(root.as_ref().to_path_buf());
        self
    }

    /// Registers an in-memory resource. Embedded resources are found before
    /// any root is searched.
    pub fn with_embedded(mut self, name: impl AsRef<str>, content: impl Into<Vec<u8>>) -> Self {
        let content: Vec<u8> = content.into();
        Arc::make_mut(&mut self.inner)
            .embedded
            .insert(normalize(name.as_ref()).to_string(), Arc::from(content));
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.inner.roots
    }

    /// Finds the resource `name`, if it exists.
    pub fn find(&self, name: &str) -> Option<Resource> {
        let name = normalize(name);
        if name.is_empty() {
            return None;
        }

        if let Some(content) = self.inner.embedded.get(name) {
            return Some(Resource::Embedded(Arc::clone(content)));
        }

        self.inner
            .roots
            .iter()
            .map(|root| root.join(name))
            .find(|candidate| candidate.is_file())
            .map(Resource::File)
    }

    /// Opens the resource `name`, or returns `None` if it cannot be found
    /// or opened.
    pub fn open(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        match self.find(name)? {
            Resource::Embedded(content) => Some(Box::new(Cursor::new(content))),
            Resource::File(path) => match File::open(&path) {
                Ok(file) => Some(Box::new(BufReader::new(file))),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "could not open resource");
                    None
                }
            },
        }
    }
}

fn normalize(name: &str) -> &str {
    name.trim_start_matches('/')
}

/// Treats the path as a resource name in a [`ResourcePath`].
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    resources: ResourcePath,
}

impl ResourceLocator {
    pub fn new(resources: ResourcePath) -> Self {
        Self { resources }
    }
}

impl Locator for ResourceLocator {
    fn locate(&self, path: &str) -> Source {
        if path.is_empty() {
            return Source::unfound("");
        }

        let source = Source::resource(self.resources.clone(), path);
        if !source.available() {
            return Source::unfound(path);
        }
        source
    }
}
