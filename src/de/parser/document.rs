//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{
    IResult,
    bytes::complete::{tag, take},
    multi::count,
    number::complete::be_u8,
};

use crate::de::parser::be_length;
use crate::document::{Trailer, MAGIC};

/// Parses the document header, yielding the two version digits which follow
/// the magic number. Version checking is left to the caller so that an
/// unsupported version can be reported distinctly from a missing header.
pub fn header(input: &[u8]) -> IResult<&[u8], [u8; 2]> {
    let (input, _) = tag(MAGIC)(input)?;
    let (input, digits) = take(2usize)(input)?;
    Ok((input, [digits[0], digits[1]]))
}

/// Returns a parser for an offset table of `entries` positions, each stored
/// at the trailer-declared width.
pub fn offset_table(
    entries: usize,
    entry_width: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    move |input: &[u8]| {
        count(be_length(entry_width), entries)(input)
    }
}

/// Parses the 32-byte trailer.
///
/// Five reserved bytes open the trailer, then the sort version, the two
/// width bytes, and three 8-byte big-endian fields: object count, root
/// reference, offset table position. The count is taken from trailer offset
/// 8 as a full 64-bit quantity; documents from writers which stored a
/// 32-bit count at offset 12 read identically, as such writers zero the
/// four bytes in between.
pub fn trailer(input: &[u8]) -> IResult<&[u8], Trailer> {
    let (input, _) = take(5usize)(input)?;
    let (input, sort_version) = be_u8(input)?;
    let (input, offset_entry_width) = be_length(1)(input)?;
    let (input, reference_width) = be_length(1)(input)?;
    let (input, object_count) = be_length(8)(input)?;
    let (input, root_reference) = be_length(8)(input)?;
    let (input, offset_table_position) = be_length(8)(input)?;
    Ok((input, Trailer {
        sort_version,
        offset_entry_width,
        reference_width,
        object_count,
        root_reference,
        offset_table_position,
    }))
}
