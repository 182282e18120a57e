//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::value::Value;
use crate::xml::{base64_encode_wrapped, PLIST_DOCTYPE};

/// Encodes a value tree as a complete XML property list document.
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped(PLIST_DOCTYPE)))?;

    let mut plist = BytesStart::new("plist");
    plist.push_attribute(("version", "1.0"));
    writer.write_event(Event::Start(plist))?;
    write_node(&mut writer, value)?;
    writer.write_event(Event::End(BytesEnd::new("plist")))?;

    let mut document = writer.into_inner();
    document.push(b'\n');
    Ok(document)
}

/// Encodes a value tree and writes the document to the given sink.
pub fn to_writer<W: Write>(mut writer: W, value: &Value) -> Result<()> {
    writer.write_all(&to_bytes(value)?)?;
    Ok(())
}

/// Encodes a value tree and writes the document to a file at the given path.
pub fn to_file<P: AsRef<Path>>(path: P, value: &Value) -> Result<()> {
    to_writer(fs::File::create(path)?, value)
}

/// Writes one element holding text content.
fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Recursively writes the element for a value.
fn write_node<W: Write>(writer: &mut Writer<W>, value: &Value) -> Result<()> {
    match value {
        Value::Boolean(true) => {
            writer.write_event(Event::Empty(BytesStart::new("true")))?;
        }

        Value::Boolean(false) => {
            writer.write_event(Event::Empty(BytesStart::new("false")))?;
        }

        // Shortest round-trip formatting, so values read back exactly.
        Value::Integer(value) =>
            write_text_element(writer, "integer", &value.to_string())?,
        Value::Real(value) =>
            write_text_element(writer, "real", &value.to_string())?,

        Value::String(value) =>
            write_text_element(writer, "string", value)?,

        Value::Date(date) =>
            write_text_element(writer, "date", &date.to_iso8601()?)?,

        Value::Data(bytes) =>
            write_text_element(writer, "data", &base64_encode_wrapped(bytes))?,

        Value::Array(elements) => {
            if elements.is_empty() {
                writer.write_event(Event::Empty(BytesStart::new("array")))?;
            } else {
                writer.write_event(Event::Start(BytesStart::new("array")))?;
                for element in elements {
                    write_node(writer, element)?;
                }
                writer.write_event(Event::End(BytesEnd::new("array")))?;
            }
        }

        Value::Dictionary(entries) => {
            if entries.is_empty() {
                writer.write_event(Event::Empty(BytesStart::new("dict")))?;
            } else {
                writer.write_event(Event::Start(BytesStart::new("dict")))?;
                for (key, value) in entries {
                    write_text_element(writer, "key", key)?;
                    write_node(writer, value)?;
                }
                writer.write_event(Event::End(BytesEnd::new("dict")))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::Date;
    use crate::value::Dictionary;

    fn document_text(value: &Value) -> String {
        String::from_utf8(to_bytes(value).unwrap()).unwrap()
    }

    #[test]
    fn test_to_bytes_prologue() {
        let text = document_text(&Value::Dictionary(Dictionary::new()));
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains(concat!(
            r#"<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "#,
            r#""http://www.apple.com/DTDs/PropertyList-1.0.dtd">"#,
        )));
        assert!(text.contains("<plist version=\"1.0\">"));
        assert!(text.ends_with("</plist>\n"));
    }

    #[test]
    fn test_to_bytes_scalars() {
        let mut dictionary = Dictionary::new();
        dictionary.insert(String::from("int"), Value::Integer(-3455));
        dictionary.insert(String::from("real"), Value::from(1.34223));
        dictionary.insert(String::from("yes"), Value::Boolean(true));
        dictionary.insert(String::from("no"), Value::Boolean(false));
        dictionary.insert(
            String::from("when"),
            Value::Date(Date::from_apple_epoch(338610664.0)),
        );

        let text = document_text(&Value::Dictionary(dictionary));
        assert!(text.contains("<integer>-3455</integer>"));
        assert!(text.contains("<real>1.34223</real>"));
        assert!(text.contains("<true/>"));
        assert!(text.contains("<false/>"));
        assert!(text.contains("<date>2011-09-25T02:31:04Z</date>"));
    }

    #[test]
    fn test_to_bytes_escapes_string_content() {
        let text = document_text(&Value::String(String::from("a <b> & c")));
        assert!(text.contains("<string>a &lt;b&gt; &amp; c</string>"));
    }

    #[test]
    fn test_to_bytes_keys_in_sorted_order() {
        let mut dictionary = Dictionary::new();
        dictionary.insert(String::from("zebra"), Value::Integer(1));
        dictionary.insert(String::from("apple"), Value::Integer(2));

        let text = document_text(&Value::Dictionary(dictionary));
        let apple = text.find("<key>apple</key>").unwrap();
        let zebra = text.find("<key>zebra</key>").unwrap();
        assert!(apple < zebra);
    }

    #[test]
    fn test_to_bytes_empty_containers_self_close() {
        let mut dictionary = Dictionary::new();
        dictionary.insert(String::from("a"), Value::Array(vec![]));
        dictionary.insert(String::from("d"), Value::Dictionary(Dictionary::new()));

        let text = document_text(&Value::Dictionary(dictionary));
        assert!(text.contains("<array/>"));
        assert!(text.contains("<dict/>"));
    }

    #[test]
    fn test_to_bytes_data_is_wrapped_base64() {
        let text = document_text(&Value::Data(vec![0x55; 114]));
        // Two full 76-column lines of encoded content.
        assert!(text.contains("<data>"));
        let start = text.find("<data>").unwrap() + "<data>".len();
        let end = text.find("</data>").unwrap();
        let content = &text[start .. end];
        assert_eq!(content.split_whitespace().collect::<String>().len(), 152);
    }
}
