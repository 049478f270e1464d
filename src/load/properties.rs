//! `key=value` properties files.
//!
//! Follows the classic `.properties` format: `#` and `!` comments, `=`, `:`
//! or whitespace separators, backslash line continuations, and backslash
//! escapes including `\uXXXX`. Later duplicates replace earlier ones.

use std::str::Chars;

use super::ParseError;
use crate::property::PropertyMap;

pub(crate) fn parse(text: &str) -> Result<PropertyMap, ParseError> {
    let mut properties = PropertyMap::new();
    let mut lines = text.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let trimmed = line.trim_start_matches(is_blank);
        if trimmed.is_empty() || trimmed.starts_with(|c: char| c == '#' || c == '!') {
            continue;
        }

        let line_number = index + 1;
        let mut logical = trimmed.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        properties.insert(unescape(key, line_number)?, unescape(value, line_number)?);
    }

    Ok(properties)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\x0c'
}

/// An odd number of trailing backslashes joins the next line.
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(|c: char| c == '=' || c == ':') {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> Result<String, ParseError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => out.push(unicode_escape(&mut chars, line)?),
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

fn unicode_escape(chars: &mut Chars<'_>, line: usize) -> Result<char, ParseError> {
    let unit = hex_unit(chars, line)?;
    if !(0xD800..0xDC00).contains(&unit) {
        return char::from_u32(unit).ok_or_else(|| invalid(line, "unpaired surrogate in \\u escape"));
    }

    let low = match (chars.next(), chars.next()) {
        (Some('\\'), Some('u')) => hex_unit(chars, line)?,
        _ => return Err(invalid(line, "unpaired surrogate in \\u escape")),
    };
    if !(0xDC00..0xE000).contains(&low) {
        return Err(invalid(line, "unpaired surrogate in \\u escape"));
    }

    let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).ok_or_else(|| invalid(line, "invalid \\u escape"))
}

fn hex_unit(chars: &mut Chars<'_>, line: usize) -> Result<u32, ParseError> {
    let mut unit = 0;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| invalid(line, "malformed \\uxxxx encoding"))?;
        unit = unit * 16 + digit;
    }
    Ok(unit)
}

fn invalid(line: usize, message: &str) -> ParseError {
    ParseError::Properties {
        line,
        message: message.to_string(),
    }
}
