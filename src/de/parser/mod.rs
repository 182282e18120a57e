//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

pub mod document;
pub mod object;

use nom::{
    IResult,
    bytes::complete::take,
    combinator::map_res,
};

use std::convert::TryFrom;

/// Returns a parser for an unsigned big-endian quantity of the given width,
/// 1 through 8 bytes.
///
/// The bytes are right-aligned into an 8-byte image before conversion, the
/// mirror of the trimming the writer applies. A set high bit in a narrow
/// width therefore carries magnitude, never sign; only a full 8-byte
/// quantity can hold a negative value, which the caller reinterprets.
pub fn be_uint(
    width: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], u64> {
    assert!(width >= 1 && width <= 8, "width outside the 1 to 8 byte range");
    move |input: &[u8]| {
        let (rest, raw) = take(width)(input)?;
        let mut image = [0u8; 8];
        image[8 - raw.len() ..].copy_from_slice(raw);
        Ok((rest, u64::from_be_bytes(image)))
    }
}

/// Returns a parser for a length or reference field of the given width.
///
/// Reads like [`be_uint`] and then range-checks the result into a `usize`,
/// so an 8-byte field too large for the platform word fails cleanly rather
/// than truncating.
pub fn be_length(
    width: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    move |input: &[u8]| {
        map_res(
            be_uint(width),
            usize::try_from
        )(input)
    }
}
