//! Loop-safe `${token}` expansion.

use std::collections::HashSet;

use tracing::trace;

use super::PropertyLayers;

const OPEN: &str = "${";
const CLOSE: &str = "}";

/// Expands `${token}` placeholders in a string.
///
/// Implementations never fail: tokens that cannot be resolved are left in
/// the output as-is.
pub trait PropertyResolver: Send + Sync + std::fmt::Debug {
    fn resolve(&self, template: &str, layers: &PropertyLayers<'_>) -> String;
}

/// Iterative resolver that expands tokens until the output is stable.
///
/// Each pass collects every `${token}` in the current output, looks each one
/// up in the [`PropertyLayers`], and replaces all of its occurrences
/// literally. Values may themselves contain tokens, so chains like
/// `${a}` → `${b}` → `value` resolve across passes.
///
/// Every intermediate output is remembered. When a pass produces an output
/// that was already seen, resolution stops and that output is returned, so a
/// self-referencing (`a = ${a}`) or cyclic (`a → b → a`) token settles on the
/// literal `${a}` instead of looping.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertyResolver;

impl DefaultPropertyResolver {
    pub fn new() -> Self {
        Self
    }
}

impl PropertyResolver for DefaultPropertyResolver {
    fn resolve(&self, template: &str, layers: &PropertyLayers<'_>) -> String {
        let mut output = template.to_string();
        let mut seen = HashSet::new();
        seen.insert(output.clone());

        loop {
            let tokens = find_tokens(&output);
            if tokens.is_empty() {
                break;
            }

            for token in tokens {
                let Some(value) = layers.lookup(&token) else {
                    continue;
                };
                if value == token {
                    continue;
                }
                output = output.replace(&format!("{OPEN}{token}{CLOSE}"), &value);
            }

            trace!(template, output = %output, "resolved properties");

            if !seen.insert(output.clone()) {
                trace!(output = %output, "cyclic or recursive property resolution, done resolving");
                break;
            }
        }

        output
    }
}

/// Returns every non-overlapping substring between `${` and the next `}`.
fn find_tokens(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = s;

    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        tokens.push(after[..end].to_string());
        rest = &after[end + CLOSE.len()..];
    }

    tokens
}
