//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std;
use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, Error>;

/// Property list serialization and deserialization error.
#[derive(Debug)]
pub enum Error {
    /// The input buffer or stream was zero-length.
    EmptyInput,
    /// The underlying file or stream could not be read or written.
    Io(std::io::Error),
    /// The bplist magic number is missing or invalid.
    MissingOrInvalidHeader,
    /// The version number in the header is not one of the versions supported by this library.
    UnsupportedVersion,
    /// The trailer with the metadata necessary to interpret the offset table and object table is missing or invalid.
    MissingOrInvalidTrailer,
    /// The offset table used to determine the location of objects in the object table is missing or invalid.
    MissingOrInvalidOffsetTable,
    /// Encountered a reference to an object not in the offset table.
    InvalidObjectReference,
    /// Encountered an offset to an object not in the object table.
    InvalidOffsetToObject,
    /// Encountered a marker byte for an object format not supported by this library.
    InvalidOrUnsupportedObjectFormat,
    /// Encountered a `null` or `fill` singleton, which has no value-tree representation.
    UnsupportedSingleton,
    /// A dictionary key reference resolved to an object which is not a string.
    DictionaryKeyNotString,
    /// Binary property lists are directed acyclic graphs and objects cannot reference each other.
    CycleDetected,
    /// The current object was expected to be a valid boolean, but parsing it failed.
    ExpectedBoolean,
    /// The current object was expected to be a valid integer, but parsing it failed.
    ExpectedInteger,
    /// The current object was expected to be a valid floating-point value, but parsing it failed.
    ExpectedReal,
    /// The current object was expected to be a valid date, but parsing it failed.
    ExpectedDate,
    /// The current object was expected to be a valid data buffer, but parsing it failed.
    ExpectedData,
    /// The current object was expected to be a valid ASCII or UTF-16 string, but parsing it failed.
    ExpectedString,
    /// The current object was expected to be a valid array, but parsing it failed.
    ExpectedArray,
    /// The current object was expected to be a valid dictionary, but parsing it failed.
    ExpectedDictionary,
    /// Prematurely reached the end of the file.
    Eof,
    /// The underlying XML reader or writer failed.
    XmlParse(quick_xml::Error),
    /// An XML element name is not part of the property list vocabulary.
    XmlUnknownNode(String),
    /// An XML dictionary did not alternate strictly between `<key>` elements and values.
    XmlDictionaryMalformed(String),
    /// The document has no `<plist>` element, or the element has no value child.
    MissingPlistElement,
    /// A date could not be converted to or from the ISO-8601 convention.
    InvalidDate(String),
    /// An `<integer>` element does not hold a signed decimal.
    InvalidInteger(String),
    /// A `<real>` element does not hold a decimal floating-point value.
    InvalidReal(String),
    /// A `<data>` element does not hold valid base64.
    InvalidBase64(base64::DecodeError),
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyInput =>
                formatter.write_str("cannot read a zero-length property list"),
            Error::Io(e) =>
                write!(formatter, "i/o error: {}", e),
            Error::MissingOrInvalidHeader =>
                formatter.write_str("missing or invalid bplist header"),
            Error::UnsupportedVersion =>
                formatter.write_str("document is not a version (0,0) bplist"),
            Error::MissingOrInvalidTrailer =>
                formatter.write_str("missing or invalid bplist trailer"),
            Error::MissingOrInvalidOffsetTable =>
                formatter.write_str("missing or invalid bplist offset table"),
            Error::InvalidObjectReference =>
                formatter.write_str("invalid reference to object not in offset table"),
            Error::InvalidOffsetToObject =>
                formatter.write_str("invalid offset to element in offset table"),
            Error::InvalidOrUnsupportedObjectFormat =>
                formatter.write_str("invalid or unsupported object format encountered"),
            Error::UnsupportedSingleton =>
                formatter.write_str("null or fill singleton encountered"),
            Error::DictionaryKeyNotString =>
                formatter.write_str("dictionary key cannot be parsed as a string"),
            Error::CycleDetected =>
                formatter.write_str("cycle detected"),
            Error::ExpectedBoolean =>
                formatter.write_str("expected boolean"),
            Error::ExpectedInteger =>
                formatter.write_str("expected integer"),
            Error::ExpectedReal =>
                formatter.write_str("expected floating-point value"),
            Error::ExpectedDate =>
                formatter.write_str("expected date value"),
            Error::ExpectedData =>
                formatter.write_str("expected data"),
            Error::ExpectedString =>
                formatter.write_str("expected string"),
            Error::ExpectedArray =>
                formatter.write_str("expected array of object references"),
            Error::ExpectedDictionary =>
                formatter.write_str("expected dictionary"),
            Error::Eof =>
                formatter.write_str("unexpected end of input"),
            Error::XmlParse(e) =>
                write!(formatter, "xml parsed with error: {}", e),
            Error::XmlUnknownNode(name) =>
                write!(formatter, "xml unknown node type: {}", name),
            Error::XmlDictionaryMalformed(detail) =>
                write!(formatter, "xml dictionary malformed: {}", detail),
            Error::MissingPlistElement =>
                formatter.write_str("xml document has no plist value"),
            Error::InvalidDate(detail) =>
                write!(formatter, "invalid date: {}", detail),
            Error::InvalidInteger(text) =>
                write!(formatter, "invalid integer: {}", text),
            Error::InvalidReal(text) =>
                write!(formatter, "invalid real: {}", text),
            Error::InvalidBase64(e) =>
                write!(formatter, "invalid base64 data: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::XmlParse(e)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::InvalidBase64(e)
    }
}
