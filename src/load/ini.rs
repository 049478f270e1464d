//! INI files.
//!
//! `[section]` headers open nested tables (`[a.b]` nests `b` inside `a`);
//! keys before the first header live at the top level. Lines starting with
//! `;` or `#` are comments. Values may be quoted; unquoted values end at an
//! inline comment. The first definition of a key in a section is kept.

use toml::{Table, Value};

use super::ParseError;

pub(crate) fn parse(text: &str) -> Result<Table, ParseError> {
    let mut root = Table::new();
    let mut section: Vec<String> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(|c: char| c == ';' || c == '#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or_else(|| invalid(line_number, "section header is missing ']'"))?
                .trim();
            if name.is_empty() || name.split('.').any(|part| part.trim().is_empty()) {
                return Err(invalid(line_number, "empty section name"));
            }
            section = name.split('.').map(|part| part.trim().to_string()).collect();
            section_table(&mut root, &section, line_number)?;
            continue;
        }

        let (key, value) = match line.find(|c: char| c == '=' || c == ':') {
            Some(at) => (line[..at].trim(), parse_value(&line[at + 1..])),
            None => (line, String::new()),
        };
        if key.is_empty() {
            return Err(invalid(line_number, "missing key"));
        }

        let table = section_table(&mut root, &section, line_number)?;
        if !table.contains_key(key) {
            table.insert(key.to_string(), Value::String(value));
        }
    }

    Ok(root)
}

fn section_table<'a>(
    root: &'a mut Table,
    path: &[String],
    line: usize,
) -> Result<&'a mut Table, ParseError> {
    let mut current = root;
    for part in path {
        if !current.contains_key(part) {
            current.insert(part.clone(), Value::Table(Table::new()));
        }
        current = match current.get_mut(part) {
            Some(Value::Table(table)) => table,
            _ => return Err(invalid(line, "section name clashes with a key")),
        };
    }
    Ok(current)
}

fn parse_value(raw: &str) -> String {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = raw.strip_prefix(quote) {
            if let Some(end) = inner.find(quote) {
                return inner[..end].to_string();
            }
        }
    }

    let mut end = raw.len();
    let mut previous_blank = false;
    for (i, c) in raw.char_indices() {
        if (c == ';' || c == '#') && previous_blank {
            end = i;
            break;
        }
        previous_blank = c.is_whitespace();
    }
    raw[..end].trim_end().to_string()
}

fn invalid(line: usize, message: &str) -> ParseError {
    ParseError::Ini {
        line,
        message: message.to_string(),
    }
}
