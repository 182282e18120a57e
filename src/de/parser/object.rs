//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use ascii::AsciiStr;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::take,
    combinator::{map, map_opt, map_res},
    multi::count,
    number::complete::{be_u8, be_u16, be_u32, be_i64, be_f32, be_f64},
    sequence::preceded,
};

use std::convert::TryFrom;

use crate::de::parser::be_length;
use crate::document::ObjectFormat;

/// Returns a parser which consumes one marker byte of the expected format
/// and yields the payload bits it embeds. Any other marker, known or not,
/// fails the parse.
fn marker(
    format: ObjectFormat
) -> impl Fn(&[u8]) -> IResult<&[u8], u8> {
    move |input: &[u8]| {
        map_opt(take(1usize), |bytes: &[u8]| {
            match ObjectFormat::classify(bytes[0]) {
                Some((found, bits)) if found == format => Some(bits),
                _ => None,
            }
        })(input)
    }
}

/// Parses one marker byte of any supported format, yielding the format and
/// its embedded payload bits.
pub fn any_marker(input: &[u8]) -> IResult<&[u8], (ObjectFormat, u8)> {
    map_opt(take(1usize), |bytes: &[u8]| {
        ObjectFormat::classify(bytes[0])
    })(input)
}

/// Parses a boolean object. The truth value lives in the marker itself.
pub fn boolean(input: &[u8]) -> IResult<&[u8], bool> {
    map(
        marker(ObjectFormat::Boolean),
        |bits| bits != 0
    )(input)
}

/// Parses an integer object at whichever of the four widths its marker
/// declares, widening the body to 64 bits.
///
/// The three narrow widths are unsigned by construction: the writer trims a
/// left-zero-padded image, so a set high bit is magnitude. Only the 8-byte
/// width, where every bit survives, is signed.
pub fn integer(input: &[u8]) -> IResult<&[u8], i64> {
    alt((
        map(preceded(marker(ObjectFormat::UInt8), be_u8), i64::from),
        map(preceded(marker(ObjectFormat::UInt16), be_u16), i64::from),
        map(preceded(marker(ObjectFormat::UInt32), be_u32), i64::from),
        preceded(marker(ObjectFormat::SInt64), be_i64),
    ))(input)
}

/// Parses a floating-point object at either declared width, widening the
/// body to double precision.
pub fn real(input: &[u8]) -> IResult<&[u8], f64> {
    alt((
        map(preceded(marker(ObjectFormat::Float32), be_f32), f64::from),
        preceded(marker(ObjectFormat::Float64), be_f64),
    ))(input)
}

/// Parses a date object: always a full double of Core-Data-Epoch seconds.
pub fn date(input: &[u8]) -> IResult<&[u8], f64> {
    preceded(marker(ObjectFormat::Date), be_f64)(input)
}

/// Returns a parser for the element count of a variable-length object,
/// given the nibble its marker embedded.
///
/// A nibble below 15 is the count itself and consumes nothing. The nibble
/// 15 announces that an integer object follows the marker carrying the true
/// count; that integer is consumed and read as an unsigned quantity.
fn payload_count(
    embedded_bits: u8,
) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    move |input: &[u8]| {
        match embedded_bits {
            0x0F => map_res(
                integer,
                |value| usize::try_from(value as u64)
            )(input),
            inline => Ok((input, inline as usize)),
        }
    }
}

/// Parses a data object and yields its payload as a slice of the input.
pub fn data(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, embedded_bits) = marker(ObjectFormat::Data)(input)?;
    let (input, byte_count) = payload_count(embedded_bits)(input)?;
    take(byte_count)(input)
}

/// Parses an ASCII string object, yielding a borrowed slice of the input
/// after confirming every byte is 7-bit. No allocation takes place.
pub fn ascii_string(input: &[u8]) -> IResult<&[u8], &str> {
    let (input, embedded_bits) = marker(ObjectFormat::AsciiString)(input)?;
    let (input, byte_count) = payload_count(embedded_bits)(input)?;
    map_res(take(byte_count), |bytes: &[u8]| {
        AsciiStr::from_ascii(bytes).map(AsciiStr::as_str)
    })(input)
}

/// Parses a UTF-16 string object into an owned string. The count is in
/// 16-bit code units, so the body spans twice that many bytes; unpaired
/// surrogates fail the parse.
pub fn utf16_string(input: &[u8]) -> IResult<&[u8], String> {
    let (input, embedded_bits) = marker(ObjectFormat::Utf16String)(input)?;
    let (input, unit_count) = payload_count(embedded_bits)(input)?;
    map_res(
        count(be_u16, unit_count),
        |units| String::from_utf16(&units)
    )(input)
}

/// Returns a parser for an array object, yielding one reference per element
/// at the document's reference width.
pub fn array(
    reference_width: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    move |input: &[u8]| {
        let (input, embedded_bits) = marker(ObjectFormat::Array)(input)?;
        let (input, element_count) = payload_count(embedded_bits)(input)?;
        count(be_length(reference_width), element_count)(input)
    }
}

/// Returns a parser for a dictionary object.
///
/// The body is every key reference followed by every value reference, two
/// parallel runs of equal length; they are paired up positionally, key
/// first, in the order the document stores them.
pub fn dictionary(
    reference_width: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<(usize, usize)>> {
    move |input: &[u8]| {
        let (input, embedded_bits) = marker(ObjectFormat::Dictionary)(input)?;
        let (input, entry_count) = payload_count(embedded_bits)(input)?;
        let (input, keys) = count(be_length(reference_width), entry_count)(input)?;
        let (input, values) = count(be_length(reference_width), entry_count)(input)?;
        Ok((input, keys.into_iter().zip(values).collect()))
    }
}
