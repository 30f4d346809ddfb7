//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{
    IResult,
    bytes::complete::{tag, take},
    combinator::map,
    multi::count,
    number::complete::{le_u16, le_u32, le_u8},
    sequence::tuple,
};

use crate::document::{Bucket, Header, HEADER_MAGIC_NUMBER};

/// Parses the fixed-sized 20-byte file header from the input slice.
///
/// The magic number is matched here; the version byte is returned for the
/// caller to validate so that a version mismatch can be reported
/// distinctly from a foreign file.
pub fn header(input: &[u8]) -> IResult<&[u8], Header> {
    map(
        tuple((
            tag(HEADER_MAGIC_NUMBER),
            le_u8,
            le_u8,
            le_u16,
            take(4usize),
            le_u32,
            le_u32,
        )), |(
            _,
            version,
            _,
            crc,
            _,
            size1,
            size2,
        )| Header {
            version,
            crc,
            size1,
            size2,
        }
    )(input)
}

/// Parses a hash-map header: the length of the bucket array that
/// follows it.
pub fn bucket_count(input: &[u8]) -> IResult<&[u8], u32> {
    le_u32(input)
}

/// Parses a single hash-map bucket slot.
pub fn bucket(input: &[u8]) -> IResult<&[u8], Bucket> {
    map(
        tuple((
            le_u32,
            le_u32,
        )), |(
            entry_count,
            entries_offset,
        )| Bucket {
            entry_count,
            entries_offset,
        }
    )(input)
}

/// Returns a parser for a bucket array with the specified number of slots.
pub fn buckets(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<Bucket>> {
    move |input: &[u8]| {
        count(bucket, n)(input)
    }
}

/// Parses a single hash-map entry: a key and the absolute offset of its
/// value word.
pub fn entry(input: &[u8]) -> IResult<&[u8], (u32, u32)> {
    tuple((le_u32, le_u32))(input)
}

/// Returns a parser for an entry array with the specified number of
/// entries.
pub fn entries(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<(u32, u32)>> {
    move |input: &[u8]| {
        count(entry, n)(input)
    }
}
