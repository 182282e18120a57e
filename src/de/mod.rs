//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Binary property list reader.
//!
//! Decoding proceeds in two phases. The first parses the document metadata:
//! the header is validated, the trailer is pulled from the final 32 bytes,
//! and the offset table it locates is decoded in full. The second phase
//! resolves the root object reference recursively into a [`Value`] tree.

mod parser;

use log::debug;
use ordered_float::OrderedFloat;

use std::collections::BTreeSet;

use crate::date::Date;
use crate::document::{
    HEADER_SIZE,
    TRAILER_SIZE,
    VERSION_00,
    ObjectFormat,
};
use crate::error::{Error, Result};
use crate::value::{Dictionary, Value};

#[derive(Clone, Eq, PartialEq, Debug)]
struct Metadata {
    /// The table of offsets from the start of the input to the location of a given object.
    offset_table: Vec<usize>,
    /// The byte length of an object reference.
    reference_width: usize,
    /// The reference of the root object to decode.
    root_reference: usize,
    /// The range of bytes of the input where objects may reside.
    object_table_range: std::ops::Range<usize>,
}

impl Metadata {
    /// Utilizes the offset table to compute the offset of the given object.
    fn offset_of(&self, object: usize) -> Result<usize> {
        if object >= self.offset_table.len() {
            Err(Error::InvalidObjectReference)
        } else {
            Ok(self.offset_table[object])
        }
    }
}

/// Parses the metadata necessary to interpret the contents of the document.
///
/// # Notes
///
/// The smallest possible document consists of:
///   1. A fixed-sized header.
///   2. An object table with a single one-byte entry such as a zero-length array.
///   3. An offset table with a single one-byte entry for the root object.
///   4. A fixed-sized trailer.
fn parse_metadata(input: &[u8]) -> Result<Metadata> {
    if input.len() < HEADER_SIZE + 2 + TRAILER_SIZE {
        return Err(Error::Eof);
    }

    // Parse the header and verify both the magic number and the version marker.
    let header_slice = &input[0 .. HEADER_SIZE];
    let (_, version) = parser::document::header(header_slice).map_err(|_| {
        Error::MissingOrInvalidHeader
    })?;
    if version != VERSION_00 {
        return Err(Error::UnsupportedVersion);
    }

    // Parse the trailer from the end of the input and sanity check the
    // fields. Both widths must land in the 1 to 8 byte range the offset and
    // reference parsers accept.
    let trailer_slice = &input[input.len() - TRAILER_SIZE .. ];
    let (_, trailer) = parser::document::trailer(trailer_slice).map_err(|_| {
        Error::MissingOrInvalidTrailer
    })?;
    if trailer.root_reference >= trailer.object_count {
        return Err(Error::MissingOrInvalidTrailer);
    }
    if !(1 ..= 8).contains(&trailer.offset_entry_width)
        || !(1 ..= 8).contains(&trailer.reference_width)
    {
        return Err(Error::MissingOrInvalidTrailer);
    }

    // Compute the location and length of the offset table.
    let offset_table_start = trailer.offset_table_position;
    let offset_table_length = trailer
        .object_count
        .checked_mul(trailer.offset_entry_width)
        .ok_or(Error::MissingOrInvalidOffsetTable)?;

    // The offset table should not be defined as overlapping with the trailer.
    let offset_table_end = offset_table_start
        .checked_add(offset_table_length)
        .ok_or(Error::MissingOrInvalidOffsetTable)?;
    if offset_table_end > (input.len() - TRAILER_SIZE) {
        return Err(Error::MissingOrInvalidOffsetTable);
    }

    // Parse the offset table.
    let offset_table_slice = &input[offset_table_start .. offset_table_end];
    let (_, offset_table) = parser::document::offset_table(
        trailer.object_count,
        trailer.offset_entry_width
    )(offset_table_slice).map_err(|_| {
        Error::MissingOrInvalidOffsetTable
    })?;

    debug!(
        "parsed bplist metadata: {} objects, {}-byte references, offset table at {}",
        trailer.object_count,
        trailer.reference_width,
        trailer.offset_table_position,
    );

    Ok(Metadata {
        offset_table,
        reference_width: trailer.reference_width,
        root_reference: trailer.root_reference,
        object_table_range: (HEADER_SIZE .. offset_table_start),
    })
}

/// Provides access to objects within the object table.
#[derive(Debug)]
struct ObjectTable<'a> {
    input: &'a [u8],
    metadata: Metadata,
}

/// Defines a basic parser with codec error handling.
macro_rules! define_parser {
    ($name:ident, $parser:expr, $type:ty, $expected_error:path) => {
        fn $name(&self, object: usize) -> Result<$type> {
            let data = self.data_for(object)?;
            $parser(data)
                .map(|(_, value)| value)
                .map_err(|_| $expected_error)
        }
    };
}

impl<'a> ObjectTable<'a> {

    /// Returns the slice of the input corresponding to the object.
    fn data_for(&self, object: usize) -> Result<&[u8]> {
        let offset = self.metadata.offset_of(object)?;

        // Make sure the offset is to a point within the object table.
        if !self.metadata.object_table_range.contains(&offset) {
            return Err(Error::InvalidOffsetToObject);
        }

        Ok(&self.input[offset .. ])
    }

    /// Parses the marker byte for the specified object and returns the format.
    fn kind_of(&self, object: usize) -> Result<ObjectFormat> {
        let data = self.data_for(object)?;
        parser::object::any_marker(data)
            .map(|(_, (format, _))| format)
            .map_err(|_| Error::InvalidOrUnsupportedObjectFormat)
    }

    define_parser![
        parse_boolean,
        parser::object::boolean,
        bool,
        Error::ExpectedBoolean
    ];
    define_parser![
        parse_integer,
        parser::object::integer,
        i64,
        Error::ExpectedInteger
    ];
    define_parser![
        parse_real,
        parser::object::real,
        f64,
        Error::ExpectedReal
    ];
    define_parser![
        parse_date,
        parser::object::date,
        f64,
        Error::ExpectedDate
    ];
    define_parser![
        parse_data,
        parser::object::data,
        &[u8],
        Error::ExpectedData
    ];
    define_parser![
        parse_ascii_string,
        parser::object::ascii_string,
        &str,
        Error::ExpectedString
    ];
    define_parser![
        parse_utf16_string,
        parser::object::utf16_string,
        String,
        Error::ExpectedString
    ];

    /// Parses an array of objects whose reference size is determined in metadata.
    fn parse_array(&self, object: usize) -> Result<Vec<usize>> {
        let data = self.data_for(object)?;
        parser::object::array(self.metadata.reference_width)(data)
            .map(|(_, objects)| objects)
            .map_err(|_| Error::ExpectedArray)
    }

    /// Parses a dictionary of objects whose reference size is determined in metadata.
    fn parse_dictionary(&self, object: usize) -> Result<Vec<(usize, usize)>> {
        let data = self.data_for(object)?;
        parser::object::dictionary(self.metadata.reference_width)(data)
            .map(|(_, pairs)| pairs)
            .map_err(|_| Error::ExpectedDictionary)
    }

    /// Parses a string object at either supported encoding.
    fn parse_string(&self, object: usize) -> Result<String> {
        match self.kind_of(object)? {
            ObjectFormat::AsciiString =>
                self.parse_ascii_string(object).map(String::from),
            ObjectFormat::Utf16String =>
                self.parse_utf16_string(object),
            _ =>
                Err(Error::ExpectedString),
        }
    }

}

/// Recursively materializes object references into values.
#[derive(Debug)]
struct Resolver<'a> {
    /// The object table over the totality of the input document.
    object_table: ObjectTable<'a>,
    /// Ordered set of the collections being processed to detect cycles.
    collection_stack: BTreeSet<usize>,
}

impl<'a> Resolver<'a> {

    /// Pushes an object onto the collection stack to ensure no cycles can occur.
    #[must_use = "the result must be checked to avoid entering a cycle"]
    fn enter_collection(&mut self, object: usize) -> Result<()> {
        let already_visited = self.collection_stack.insert(object) == false;
        if already_visited {
            Err(Error::CycleDetected)
        } else {
            Ok(())
        }
    }

    /// Removes a fully processed collection from the stack.
    fn exit_collection(&mut self, object: usize) {
        self.collection_stack.remove(&object);
    }

    /// Resolves the specified object reference into a value, descending
    /// through containers.
    fn resolve(&mut self, object: usize) -> Result<Value> {
        match self.object_table.kind_of(object)? {

            // The null and fill singletons have no value-tree representation.
            ObjectFormat::Null | ObjectFormat::Fill =>
                Err(Error::UnsupportedSingleton),

            // Scalars resolve directly, widening to the model's payload types.
            ObjectFormat::Boolean =>
                Ok(Value::Boolean(self.object_table.parse_boolean(object)?)),
            ObjectFormat::UInt8 | ObjectFormat::UInt16 | ObjectFormat::UInt32 | ObjectFormat::SInt64 =>
                Ok(Value::Integer(self.object_table.parse_integer(object)?)),
            ObjectFormat::Float32 | ObjectFormat::Float64 =>
                Ok(Value::Real(OrderedFloat(self.object_table.parse_real(object)?))),
            ObjectFormat::Date =>
                Ok(Value::Date(Date::from_apple_epoch(self.object_table.parse_date(object)?))),
            ObjectFormat::Data =>
                Ok(Value::Data(Vec::from(self.object_table.parse_data(object)?))),
            ObjectFormat::AsciiString | ObjectFormat::Utf16String =>
                Ok(Value::String(self.object_table.parse_string(object)?)),

            // Containers resolve each reference recursively. The collection
            // stack holds every container on the current descent path, so a
            // document whose references loop fails instead of recursing
            // without bound.
            ObjectFormat::Array => {
                let references = self.object_table.parse_array(object)?;

                self.enter_collection(object)?;
                let mut elements = Vec::with_capacity(references.len());
                for reference in references {
                    elements.push(self.resolve(reference)?);
                }
                self.exit_collection(object);

                Ok(Value::Array(elements))
            }

            ObjectFormat::Dictionary => {
                let pairs = self.object_table.parse_dictionary(object)?;

                self.enter_collection(object)?;
                let mut dictionary = Dictionary::new();
                for (key_reference, value_reference) in pairs {
                    let key = self
                        .object_table
                        .parse_string(key_reference)
                        .map_err(|_| Error::DictionaryKeyNotString)?;
                    let value = self.resolve(value_reference)?;
                    dictionary.insert(key, value);
                }
                self.exit_collection(object);

                Ok(Value::Dictionary(dictionary))
            }
        }
    }

}

/// Decodes a binary property list document into a value tree.
pub fn from_slice(input: &[u8]) -> Result<Value> {
    let metadata = parse_metadata(input)?;
    let root_reference = metadata.root_reference;

    let mut resolver = Resolver {
        object_table: ObjectTable { input, metadata },
        collection_stack: BTreeSet::new(),
    };
    resolver.resolve(root_reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A document containing the dictionary {"k": -3455}.
    const DICTIONARY_WITH_INTEGER: &[u8] = &[
        // Header.
        0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30,
        // Object 0: dictionary with one entry, key ref 1, value ref 2.
        0xD1, 0x01, 0x02,
        // Object 1: ASCII string "k".
        0x51, 0x6B,
        // Object 2: SInt64(-3455).
        0x13, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xF2, 0x81,
        // Offset table.
        0x08, 0x0B, 0x0D,
        // Trailer.
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x01, 0x01,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x16,
    ];

    #[test]
    fn test_from_slice_dictionary_with_integer() {
        let value = from_slice(DICTIONARY_WITH_INTEGER).unwrap();
        let dictionary = value.as_dictionary().unwrap();
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.get("k").and_then(Value::as_integer), Some(-3455));
    }

    #[test]
    fn test_from_slice_rejects_truncated_document() {
        assert!(matches!(from_slice(&[]), Err(Error::Eof)));
        assert!(matches!(
            from_slice(&DICTIONARY_WITH_INTEGER[.. 32]),
            Err(Error::Eof)
        ));
    }

    #[test]
    fn test_from_slice_rejects_unsupported_version() {
        let mut document = Vec::from(DICTIONARY_WITH_INTEGER);
        document[7] = 0x31;
        assert!(matches!(from_slice(&document), Err(Error::UnsupportedVersion)));
    }

    #[test]
    fn test_from_slice_rejects_out_of_range_offset_table() {
        let mut document = Vec::from(DICTIONARY_WITH_INTEGER);
        let trailer_offset = document.len() - 1;
        document[trailer_offset] = 0xFF;
        assert!(matches!(
            from_slice(&document),
            Err(Error::MissingOrInvalidOffsetTable)
        ));
    }

    #[test]
    fn test_from_slice_rejects_root_out_of_range() {
        let mut document = Vec::from(DICTIONARY_WITH_INTEGER);
        let root_index_offset = document.len() - 9;
        document[root_index_offset] = 0x03;
        assert!(matches!(
            from_slice(&document),
            Err(Error::MissingOrInvalidTrailer)
        ));
    }

    #[test]
    fn test_from_slice_rejects_zero_width_fields() {
        let mut document = Vec::from(DICTIONARY_WITH_INTEGER);
        let entry_width_offset = document.len() - 26;
        document[entry_width_offset] = 0x00;
        assert!(matches!(
            from_slice(&document),
            Err(Error::MissingOrInvalidTrailer)
        ));

        let mut document = Vec::from(DICTIONARY_WITH_INTEGER);
        let reference_width_offset = document.len() - 25;
        document[reference_width_offset] = 0x09;
        assert!(matches!(
            from_slice(&document),
            Err(Error::MissingOrInvalidTrailer)
        ));
    }

    #[test]
    fn test_from_slice_honors_nonzero_root() {
        // Point the root at object 2, the integer.
        let mut document = Vec::from(DICTIONARY_WITH_INTEGER);
        let root_index_offset = document.len() - 9;
        document[root_index_offset] = 0x02;
        assert_eq!(from_slice(&document).unwrap(), Value::Integer(-3455));
    }
}
