//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use ordered_float::OrderedFloat;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::date::Date;
use crate::error::{Error, Result};
use crate::value::{Dictionary, Value};
use crate::xml::base64_decode;

/// A structural item yielded while walking the children of a container
/// element. Whitespace, comments and processing instructions are skipped
/// before one of these is produced.
#[derive(Debug)]
enum Node {
    /// The start of a child element; `empty` marks the self-closing form.
    Element { name: String, empty: bool },
    /// The end tag of the enclosing container.
    End,
}

/// Decodes an XML property list document into a value tree.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();

    // Scan past the prologue to the <plist> element.
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                if name == "plist" {
                    break;
                }
                return Err(Error::XmlUnknownNode(name));
            }
            Event::Empty(_) | Event::Eof =>
                return Err(Error::MissingPlistElement),
            _ =>
                continue,
        }
    }

    // The document value is the first element child of <plist>.
    match next_node(&mut reader, &mut buf)? {
        Node::Element { name, empty } =>
            parse_element(&mut reader, &mut buf, &name, empty),
        Node::End =>
            Err(Error::MissingPlistElement),
    }
}

/// Returns the next structural node within the current container.
fn next_node(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<Node> {
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(element) => {
                return Ok(Node::Element {
                    name: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
                    empty: false,
                });
            }
            Event::Empty(element) => {
                return Ok(Node::Element {
                    name: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
                    empty: true,
                });
            }
            Event::End(_) =>
                return Ok(Node::End),
            Event::Eof =>
                return Err(Error::Eof),
            Event::Text(text) => {
                let content = text.unescape().map_err(quick_xml::Error::from)?;
                if !content.trim().is_empty() {
                    return Err(Error::XmlUnknownNode(String::from("#text")));
                }
            }
            Event::CData(section) => {
                if !section.as_ref().iter().all(u8::is_ascii_whitespace) {
                    return Err(Error::XmlUnknownNode(String::from("#cdata")));
                }
            }
            _ =>
                continue,
        }
    }
}

/// Collects the text content of the current element through its end tag.
///
/// Content is returned verbatim aside from entity unescaping: strings may
/// legitimately carry leading or trailing whitespace.
fn element_text(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<String> {
    let mut content = String::new();
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Text(text) =>
                content.push_str(&text.unescape().map_err(quick_xml::Error::from)?),
            Event::CData(section) =>
                content.push_str(&String::from_utf8_lossy(section.as_ref())),
            Event::End(_) =>
                return Ok(content),
            Event::Eof =>
                return Err(Error::Eof),
            Event::Start(element) | Event::Empty(element) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                return Err(Error::XmlUnknownNode(name));
            }
            _ =>
                continue,
        }
    }
}

/// Parses one element whose start (or self-closing) tag has been consumed.
fn parse_element(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    name: &str,
    empty: bool,
) -> Result<Value> {
    match name {
        "dict" => {
            if empty {
                Ok(Value::Dictionary(Dictionary::new()))
            } else {
                parse_dictionary(reader, buf)
            }
        }

        "array" => {
            if empty {
                Ok(Value::Array(Vec::new()))
            } else {
                parse_array(reader, buf)
            }
        }

        "string" => {
            if empty {
                Ok(Value::String(String::new()))
            } else {
                Ok(Value::String(element_text(reader, buf)?))
            }
        }

        "integer" => {
            let text = if empty { String::new() } else { element_text(reader, buf)? };
            text.trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| Error::InvalidInteger(text))
        }

        "real" => {
            let text = if empty { String::new() } else { element_text(reader, buf)? };
            text.trim()
                .parse::<f64>()
                .map(|value| Value::Real(OrderedFloat(value)))
                .map_err(|_| Error::InvalidReal(text))
        }

        "true" | "false" => {
            // The singleton carries no content; consume through the end tag
            // when the long form is used.
            if !empty {
                element_text(reader, buf)?;
            }
            Ok(Value::Boolean(name == "true"))
        }

        "data" => {
            let text = if empty { String::new() } else { element_text(reader, buf)? };
            base64_decode(&text).map(Value::Data)
        }

        "date" => {
            let text = if empty { String::new() } else { element_text(reader, buf)? };
            Date::from_iso8601(text.trim()).map(Value::Date)
        }

        other =>
            Err(Error::XmlUnknownNode(String::from(other))),
    }
}

/// Parses the children of a non-empty `<array>` element.
fn parse_array(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<Value> {
    let mut elements = Vec::new();
    loop {
        match next_node(reader, buf)? {
            Node::Element { name, empty } =>
                elements.push(parse_element(reader, buf, &name, empty)?),
            Node::End =>
                return Ok(Value::Array(elements)),
        }
    }
}

/// Parses the children of a non-empty `<dict>` element, which must alternate
/// strictly between `<key>` elements and value elements.
fn parse_dictionary(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<Value> {
    let mut entries = Dictionary::new();
    loop {
        let key = match next_node(reader, buf)? {
            Node::End =>
                return Ok(Value::Dictionary(entries)),
            Node::Element { name, empty } => {
                if name != "key" {
                    return Err(Error::XmlDictionaryMalformed(
                        format!("key expected but found <{}>", name)
                    ));
                }
                if empty {
                    String::new()
                } else {
                    element_text(reader, buf)?
                }
            }
        };

        match next_node(reader, buf)? {
            Node::End => {
                return Err(Error::XmlDictionaryMalformed(
                    format!("value expected for key \"{}\" but not found", key)
                ));
            }
            Node::Element { name, empty } => {
                if name == "key" {
                    return Err(Error::XmlDictionaryMalformed(
                        format!("value expected for key \"{}\" but found another key", key)
                    ));
                }
                let value = parse_element(reader, buf, &name, empty)?;
                entries.insert(key, value);
            }
        }
    }
}
