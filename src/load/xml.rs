//! XML documents.
//!
//! Structured documents map onto tables: the root element is the document
//! itself, child elements become keys, attributes become keys of their
//! element, and repeated elements become arrays. Text of an element that also
//! has children or attributes is dropped.
//!
//! Property maps can also be read from the `<properties><entry key="..">`
//! form.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use toml::{Table, Value};

use super::format::flatten;
use super::ParseError;
use crate::property::PropertyMap;

struct Element {
    name: String,
    children: Table,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let mut children = Table::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            children.insert(key, Value::String(value));
        }

        Ok(Self {
            name: element_name(start),
            children,
            text: String::new(),
        })
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() {
            Value::String(self.text)
        } else {
            Value::Table(self.children)
        }
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

pub(crate) fn parse(content: &[u8]) -> Result<Table, ParseError> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut open: Vec<Element> = Vec::new();
    let mut document = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => open.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                close(&mut open, &mut document, element);
            }
            Event::End(_) => {
                if let Some(element) = open.pop() {
                    close(&mut open, &mut document, element);
                }
            }
            Event::Text(text) => {
                if let Some(element) = open.last_mut() {
                    element.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(element) = open.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(element) = open.pop() {
        return Err(ParseError::UnclosedElement(element.name));
    }
    Ok(document.unwrap_or_default())
}

fn close(open: &mut [Element], document: &mut Option<Table>, element: Element) {
    match open.last_mut() {
        Some(parent) => {
            let name = element.name.clone();
            insert_repeated(&mut parent.children, name, element.into_value());
        }
        None => *document = Some(element.children),
    }
}

fn insert_repeated(table: &mut Table, key: String, value: Value) {
    match table.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, Value::Array(Vec::new()));
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            table.insert(key, value);
        }
    }
}

/// Reads a property map from XML.
///
/// Documents rooted at `<properties>` are read as `<entry key="..">value</entry>`
/// pairs, later entries replacing earlier ones. Any other document is read as
/// a structured document and flattened to dotted keys.
pub(crate) fn parse_properties(content: &[u8]) -> Result<PropertyMap, ParseError> {
    let mut reader = Reader::from_reader(content);
    let mut properties = PropertyMap::new();
    let mut entry: Option<(Option<String>, String)> = None;
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if !seen_root && start.name().as_ref() != b"properties" {
                    return Ok(flatten(&parse(content)?));
                }
                seen_root = true;
                if start.name().as_ref() == b"entry" {
                    entry = Some((entry_key(&start)?, String::new()));
                }
            }
            Event::Empty(start) => {
                if !seen_root && start.name().as_ref() != b"properties" {
                    return Ok(flatten(&parse(content)?));
                }
                seen_root = true;
                if start.name().as_ref() == b"entry" {
                    if let Some(key) = entry_key(&start)? {
                        properties.insert(key, String::new());
                    }
                }
            }
            Event::Text(text) => {
                if let Some((_, value)) = entry.as_mut() {
                    value.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some((_, value)) = entry.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(end) => {
                if end.name().as_ref() == b"entry" {
                    if let Some((Some(key), value)) = entry.take() {
                        properties.insert(key, value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(properties)
}

fn entry_key(start: &BytesStart<'_>) -> Result<Option<String>, ParseError> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        if attribute.key.as_ref() == b"key" {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
