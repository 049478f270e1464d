//! Strategies that turn a path into a [`Source`].

mod file;
mod resource;

pub use file::FileLocator;
pub use resource::{Resource, ResourceLocator, ResourcePath, RESOURCE_PATH_VAR};

use crate::source::Source;

/// Marker that routes a path to the resource locator.
pub const RESOURCE_MARKER: &str = "resource:";

/// Resolves a path to a readable [`Source`].
///
/// A locator never fails. When nothing can be found at `path` it returns an
/// unavailable source that still carries the attempted path.
pub trait Locator: Send + Sync + std::fmt::Debug {
    fn locate(&self, path: &str) -> Source;
}

/// The default locator.
///
/// Paths starting with `resource:` (compared case-insensitively after
/// trimming) are looked up as resources with the marker removed; everything
/// else is looked up on the filesystem.
#[derive(Debug, Clone)]
pub struct MultiLocator {
    file: FileLocator,
    resource: ResourceLocator,
}

impl MultiLocator {
    pub fn new(resources: ResourcePath) -> Self {
        Self {
            file: FileLocator,
            resource: ResourceLocator::new(resources),
        }
    }
}

impl Locator for MultiLocator {
    fn locate(&self, path: &str) -> Source {
        if path.is_empty() {
            return Source::unfound(path);
        }

        if path.trim().to_lowercase().starts_with(RESOURCE_MARKER) {
            let name = path.strip_prefix(RESOURCE_MARKER).unwrap_or(path);
            return self.resource.locate(name);
        }

        self.file.locate(path)
    }
}

/// Never finds anything. Selectable as an explicit "do nothing" locator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLocator;

impl Locator for NullLocator {
    fn locate(&self, _path: &str) -> Source {
        Source::unfound("")
    }
}
