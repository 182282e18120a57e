//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # proplist
//!
//! A native Rust serializer and deserializer for Apple property lists,
//! covering both the XML variant and the binary `bplist00` variant.
//!
//! Reads auto-detect the on-disk representation by sniffing the 8-byte
//! `bplist00` magic number and produce a [`Value`] tree; writes take a
//! [`Value`] tree and target either representation explicitly:
//!
//! ```no_run
//! use proplist::{Value, Dictionary};
//!
//! let mut dictionary = Dictionary::new();
//! dictionary.insert(String::from("answer"), Value::Integer(42));
//! let tree = Value::Dictionary(dictionary);
//!
//! proplist::binary::to_file("answer.plist", &tree).unwrap();
//! assert_eq!(proplist::from_file("answer.plist").unwrap(), tree);
//! ```

mod date;
mod de;
mod document;
mod error;
mod ser;
mod value;

pub mod xml;

pub use date::Date;
pub use error::{Error, Result};
pub use value::{Array, Dictionary, Value};

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::document::MAGIC_BPLIST00;

/// The binary `bplist00` representation.
pub mod binary {
    pub use crate::de::from_slice;
    pub use crate::ser::{to_bytes, to_file, to_writer};
}

/// Decodes a property list from a byte buffer, auto-detecting the format.
///
/// A buffer beginning with the `bplist00` magic number decodes through the
/// binary reader; anything else is treated as an XML document.
pub fn from_slice(data: &[u8]) -> Result<Value> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    if data.len() >= MAGIC_BPLIST00.len() && &data[.. MAGIC_BPLIST00.len()] == MAGIC_BPLIST00 {
        de::from_slice(data)
    } else {
        xml::from_slice(data)
    }
}

/// Decodes a property list from a stream, auto-detecting the format.
pub fn from_reader<R: Read>(mut reader: R) -> Result<Value> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    from_slice(&data)
}

/// Decodes a property list from a file at the given path, auto-detecting the format.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    from_reader(fs::File::open(path)?)
}
