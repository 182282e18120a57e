//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! XML property list reader and writer.
//!
//! The XML representation wraps a single value element in a
//! `<plist version="1.0">` root, preceded by the XML declaration and the
//! Apple property list DOCTYPE. Element names map one-to-one onto the value
//! model; dictionaries alternate `<key>` elements with value elements.

mod de;
mod ser;

pub use de::from_slice;
pub use ser::{to_bytes, to_file, to_writer};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Result;

/// Content of the document type declaration every XML property list carries.
const PLIST_DOCTYPE: &str = concat!(
    r#"plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "#,
    r#""http://www.apple.com/DTDs/PropertyList-1.0.dtd""#,
);

/// Column at which encoded `<data>` content wraps.
const BASE64_LINE_WIDTH: usize = 76;

/// Line terminator for wrapped `<data>` content, following the host convention.
#[cfg(windows)]
const BASE64_LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const BASE64_LINE_ENDING: &str = "\n";

/// Encodes bytes as MIME-style base64, broken into 76-column lines.
fn base64_encode_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_WIDTH + 1);
    for (index, character) in encoded.chars().enumerate() {
        if index > 0 && index % BASE64_LINE_WIDTH == 0 {
            wrapped.push_str(BASE64_LINE_ENDING);
        }
        wrapped.push(character);
    }
    wrapped
}

/// Decodes base64 text, ignoring the whitespace introduced by line wrapping
/// and document indentation.
fn base64_decode(text: &str) -> Result<Vec<u8>> {
    let compact = text
        .chars()
        .filter(|character| !character.is_ascii_whitespace())
        .collect::<String>();
    Ok(STANDARD.decode(compact)?)
}
