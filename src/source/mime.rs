//! Best-effort content type guessing.
//!
//! The guess looks at the content first, then at the extension of the path,
//! and falls back to [`SupportedType::Text`]. It never fails.

use std::io::Read;

use tracing::trace;

use super::{Source, SupportedType};

/// How much of a stream is read when sniffing.
const SNIFF_LEN: u64 = 512;

/// Guesses the type of `source` by reading the start of its stream.
///
/// Unavailable or empty sources are treated as plain text.
pub fn guess(source: &Source) -> SupportedType {
    if !source.available() {
        return SupportedType::Text;
    }

    let mut head = Vec::new();
    if let Err(e) = source.stream().take(SNIFF_LEN).read_to_end(&mut head) {
        trace!(path = source.path(), error = %e, "could not read source for type guessing");
        return SupportedType::Text;
    }

    guess_content(&head, source.extension())
}

/// Guesses the type of already-read content, using `extension` as fallback.
pub fn guess_content(content: &[u8], extension: &str) -> SupportedType {
    if content.is_empty() {
        trace!("blank content will be treated as plain text");
        return SupportedType::Text;
    }

    let guessed = sniff(content).unwrap_or_else(|| from_extension(extension));
    trace!(extension, content_type = %guessed, "guessed content type");
    guessed
}

fn sniff(content: &[u8]) -> Option<SupportedType> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    let start = content.iter().position(|b| !b.is_ascii_whitespace())?;
    let head = &content[start..];

    if head.starts_with(b"<?xml") {
        return Some(SupportedType::Xml);
    }
    if head.first() == Some(&b'<')
        && head
            .get(1)
            .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'!')
    {
        return Some(SupportedType::Xml);
    }
    if head.first() == Some(&b'{') {
        return Some(SupportedType::Json);
    }
    if head.starts_with(b"---") || head.starts_with(b"%YAML") {
        return Some(SupportedType::Yaml);
    }

    None
}

fn from_extension(extension: &str) -> SupportedType {
    match extension.to_ascii_lowercase().as_str() {
        "xml" => SupportedType::Xml,
        "json" => SupportedType::Json,
        "yaml" | "yml" => SupportedType::Yaml,
        "ini" => SupportedType::Ini,
        "toml" => SupportedType::Toml,
        _ => SupportedType::Text,
    }
}
