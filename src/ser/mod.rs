//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Binary property list writer.
//!
//! The document is produced in a single forward pass. A counting pre-pass
//! fixes the total number of objects, and with it the width of a container
//! reference. Every object's index is then known before it is emitted:
//! indices are assigned in pre-order, with a dictionary's keys taking the
//! consecutive indices after the dictionary itself and each container
//! element followed immediately by its own subtree. The object table is laid
//! down in index order starting with the root at offset 8, followed by the
//! offset table and the 32-byte trailer.

use ascii::AsciiStr;
use log::debug;

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::document::{ObjectFormat, MAGIC_BPLIST00};
use crate::error::Result;
use crate::value::Value;

/// Returns the number of objects the value contributes to a document.
///
/// Scalars count one. A container counts itself plus every child; each
/// dictionary key is an object in its own right.
fn object_count(value: &Value) -> usize {
    match value {
        Value::Array(elements) =>
            1 + elements.iter().map(object_count).sum::<usize>(),
        Value::Dictionary(entries) =>
            1 + entries.len() + entries.values().map(object_count).sum::<usize>(),
        _ =>
            1,
    }
}

/// Returns the minimum number of bytes required to represent the value
/// big-endian, at least one.
fn minimum_byte_length(value: u64) -> usize {
    let significant_bits = 64 - value.leading_zeros() as usize;
    std::cmp::max(1, (significant_bits + 7) / 8)
}

/// Encodes an integer object: a marker with the power-of-two body length in
/// its low nibble, then the body itself.
///
/// The value starts from its full 8-byte two's complement image and is
/// trimmed to the minimum byte length before rounding back up to a power of
/// two. A negative value keeps all eight bytes significant and therefore
/// always serializes at the widest width.
fn integer_bytes(value: i64) -> Vec<u8> {
    let image = (value as u64).to_be_bytes();
    let length = minimum_byte_length(value as u64).next_power_of_two();
    let format = match length {
        1 => ObjectFormat::UInt8,
        2 => ObjectFormat::UInt16,
        4 => ObjectFormat::UInt32,
        _ => ObjectFormat::SInt64,
    };
    let mut bytes = Vec::with_capacity(1 + length);
    bytes.push(format.marker());
    bytes.extend_from_slice(&image[image.len() - length ..]);
    bytes
}

/// Accumulates the object table and offset table of a document being encoded.
struct Encoder {
    /// Bytes of the document laid down so far, starting with the header.
    object_table: Vec<u8>,
    /// Absolute position of each object, indexed by object reference.
    offset_table: Vec<usize>,
    /// The byte length of an object reference.
    reference_width: usize,
}

impl Encoder {

    /// Appends a container reference at the document's reference width.
    fn push_reference(&mut self, reference: usize) {
        let image = (reference as u64).to_be_bytes();
        self.object_table
            .extend_from_slice(&image[image.len() - self.reference_width ..]);
    }

    /// Appends a marker carrying a payload count. Counts of 15 and above
    /// spill into a trailing integer object embedded after the marker.
    fn push_count_marker(&mut self, base_marker: u8, count: usize) {
        if count < 15 {
            self.object_table.push(base_marker | count as u8);
        } else {
            self.object_table.push(base_marker | 0x0F);
            let count_object = integer_bytes(count as i64);
            self.object_table.extend_from_slice(&count_object);
        }
    }

    /// Appends a string object body: ASCII content uses the one-byte-per-
    /// character encoding, anything else the UTF-16 big-endian encoding with
    /// the length counted in code units.
    fn push_string(&mut self, value: &str) {
        match AsciiStr::from_ascii(value.as_bytes()) {
            Ok(ascii) => {
                self.push_count_marker(ObjectFormat::AsciiString.marker(), ascii.len());
                self.object_table.extend_from_slice(ascii.as_bytes());
            }
            Err(_) => {
                let code_units = value.encode_utf16().collect::<Vec<u16>>();
                self.push_count_marker(ObjectFormat::Utf16String.marker(), code_units.len());
                for code_unit in code_units {
                    self.object_table.extend_from_slice(&code_unit.to_be_bytes());
                }
            }
        }
    }

    /// Emits the object with the given pre-assigned reference, then its
    /// children in index order.
    fn push_object(&mut self, reference: usize, value: &Value) {
        self.offset_table[reference] = self.object_table.len();

        match value {
            Value::Boolean(true) =>
                self.object_table.push(ObjectFormat::Boolean.marker() | 1),
            Value::Boolean(false) =>
                self.object_table.push(ObjectFormat::Boolean.marker()),

            Value::Integer(value) => {
                let bytes = integer_bytes(*value);
                self.object_table.extend_from_slice(&bytes);
            }

            // Reals always serialize at full double precision; the narrower
            // on-disk width is a decode-only compatibility.
            Value::Real(value) => {
                self.object_table.push(ObjectFormat::Float64.marker());
                self.object_table.extend_from_slice(&value.0.to_be_bytes());
            }

            Value::Date(date) => {
                self.object_table.push(ObjectFormat::Date.marker());
                self.object_table.extend_from_slice(&date.as_apple_epoch().to_be_bytes());
            }

            Value::Data(bytes) => {
                self.push_count_marker(ObjectFormat::Data.marker(), bytes.len());
                self.object_table.extend_from_slice(bytes);
            }

            Value::String(value) =>
                self.push_string(value),

            Value::Array(elements) => {
                // Each element owns the index range of its subtree; the
                // references of the direct children are recovered by
                // re-walking the element counts.
                let mut references = Vec::with_capacity(elements.len());
                let mut next_reference = reference + 1;
                for element in elements {
                    references.push(next_reference);
                    next_reference += object_count(element);
                }

                self.push_count_marker(ObjectFormat::Array.marker(), elements.len());
                for element_reference in &references {
                    self.push_reference(*element_reference);
                }
                for (element_reference, element) in references.iter().zip(elements) {
                    self.push_object(*element_reference, element);
                }
            }

            Value::Dictionary(entries) => {
                // Keys occupy the indices immediately after the dictionary;
                // values follow, each with its subtree.
                let key_references = (reference + 1 .. reference + 1 + entries.len())
                    .collect::<Vec<usize>>();
                let mut value_references = Vec::with_capacity(entries.len());
                let mut next_reference = reference + 1 + entries.len();
                for value in entries.values() {
                    value_references.push(next_reference);
                    next_reference += object_count(value);
                }

                self.push_count_marker(ObjectFormat::Dictionary.marker(), entries.len());
                for key_reference in &key_references {
                    self.push_reference(*key_reference);
                }
                for value_reference in &value_references {
                    self.push_reference(*value_reference);
                }

                for (key_reference, key) in key_references.iter().zip(entries.keys()) {
                    self.offset_table[*key_reference] = self.object_table.len();
                    self.push_string(key);
                }
                for (value_reference, value) in value_references.iter().zip(entries.values()) {
                    self.push_object(*value_reference, value);
                }
            }
        }
    }

}

/// Encodes a value tree as a complete binary property list document.
pub fn to_bytes(value: &Value) -> Vec<u8> {
    let total_objects = object_count(value);
    let reference_width = minimum_byte_length((total_objects - 1) as u64);

    let mut encoder = Encoder {
        object_table: Vec::from(&MAGIC_BPLIST00[..]),
        offset_table: vec![0; total_objects],
        reference_width,
    };
    encoder.push_object(0, value);

    // Lay down the offset table. Entry width accommodates the largest
    // absolute position recorded during emission.
    let offset_table_position = encoder.object_table.len();
    let greatest_offset = encoder.offset_table.iter().copied().max().unwrap_or(0);
    let offset_entry_width = minimum_byte_length(greatest_offset as u64);
    let mut document = encoder.object_table;
    for offset in &encoder.offset_table {
        let image = (*offset as u64).to_be_bytes();
        document.extend_from_slice(&image[image.len() - offset_entry_width ..]);
    }

    // Five reserved bytes and the zero sort version open the trailer.
    document.extend_from_slice(&[0; 6]);
    document.push(offset_entry_width as u8);
    document.push(reference_width as u8);
    document.extend_from_slice(&(total_objects as u64).to_be_bytes());
    document.extend_from_slice(&0u64.to_be_bytes());
    document.extend_from_slice(&(offset_table_position as u64).to_be_bytes());

    debug!(
        "encoded bplist document: {} objects, {} bytes",
        total_objects,
        document.len(),
    );
    document
}

/// Encodes a value tree and writes the document to the given sink.
pub fn to_writer<W: Write>(mut writer: W, value: &Value) -> Result<()> {
    writer.write_all(&to_bytes(value))?;
    Ok(())
}

/// Encodes a value tree and writes the document to a file at the given path.
pub fn to_file<P: AsRef<Path>>(path: P, value: &Value) -> Result<()> {
    to_writer(fs::File::create(path)?, value)
}
