//! Filesystem locator.

use super::Locator;
use crate::source::Source;

/// Treats the path as a filesystem path.
///
/// The source is available only if the path exists and is a regular file;
/// directories and missing paths produce an unfound source.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLocator;

impl Locator for FileLocator {
    fn locate(&self, path: &str) -> Source {
        if path.is_empty() {
            return Source::unfound("");
        }

        let source = Source::file(path);
        if !source.available() {
            return Source::unfound(path);
        }
        source
    }
}
