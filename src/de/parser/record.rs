//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Parsers for the schema-specific payloads of the LaunchServices tables:
//! `<array>` integer sequences, `BindingList` entries, `Claim` records and
//! the `DB Header` extra region.

use nom::{
    IResult,
    combinator::{map, verify},
    multi::count,
    number::complete::{le_u16, le_u32},
    sequence::tuple,
};

use crate::document::{
    ARRAY_COUNT_MASK,
    ARRAY_FULL_FLAG,
    DB_HEADER_BUILD_SIZE,
    DB_HEADER_MODEL_SIZE,
    DB_HEADER_TERMINATOR_MASK,
    DbHeader,
    RawBinding,
    RawClaim,
};
use crate::de::parser::utils::padded_utf8;

/// Parses the `<string>` table's `extra` region: the absolute offset of
/// the table's refcount hash map.
pub fn string_extra(input: &[u8]) -> IResult<&[u8], u32> {
    le_u32(input)
}

/// Parses an `<array>` entry payload.
///
/// The leading word selects the element width: with the full flag set,
/// elements are 32 bits wide, otherwise 16. The low 29 bits of the word
/// carry the element count.
pub fn array(input: &[u8]) -> IResult<&[u8], Vec<u32>> {
    let (input, word) = le_u32(input)?;
    let elements = (word & ARRAY_COUNT_MASK) as usize;
    if word & ARRAY_FULL_FLAG != 0 {
        count(le_u32, elements)(input)
    } else {
        count(map(le_u16, u32::from), elements)(input)
    }
}

/// Parses one named value list of a `BindingList` entry.
fn binding(input: &[u8]) -> IResult<&[u8], RawBinding> {
    let (input, name_sid) = le_u32(input)?;
    let (input, value_count) = le_u32(input)?;
    let (input, values) = count(le_u32, value_count as usize)(input)?;
    Ok((input, RawBinding { name_sid, values }))
}

/// Parses a `BindingList` entry payload: a counted sequence of named
/// value lists. The value words are left undecoded.
pub fn binding_list(input: &[u8]) -> IResult<&[u8], Vec<RawBinding>> {
    let (input, list_count) = le_u32(input)?;
    count(binding, list_count as usize)(input)
}

/// Parses a `Claim` record payload.
///
/// The record layout is fixed; every cross-reference (strings, arrays,
/// bindings) is left unresolved. Callers are expected to reject trailing
/// input themselves since an empty remainder is part of the record's
/// contract rather than of its syntax.
pub fn claim(input: &[u8]) -> IResult<&[u8], RawClaim> {
    let (input, claiming_bundle_record) = le_u32(input)?;
    let (input, generation) = le_u32(input)?;
    let (input, flags) = le_u32(input)?;
    let (input, rank) = le_u16(input)?;
    let (input, roles) = le_u16(input)?;
    let (input, bundle) = le_u32(input)?;
    let (input, localized_names) = le_u32(input)?;
    let (input, required_capabilities) = le_u32(input)?;

    let mut icon_files = [0u32; 9];
    let mut input = input;
    for slot in icon_files.iter_mut() {
        let (rest, value) = le_u32(input)?;
        *slot = value;
        input = rest;
    }

    let (input, delegate) = le_u32(input)?;
    let (input, bindings) = le_u32(input)?;

    Ok((input, RawClaim {
        claiming_bundle_record,
        generation,
        flags,
        rank,
        roles,
        bundle,
        localized_names,
        required_capabilities,
        icon_files,
        delegate,
        bindings,
    }))
}

/// Parses the `DB Header` table's `extra` region.
///
/// The body between the two leading words and the build string is a
/// sequence of key/zero pairs. It ends when `header_length` bytes of the
/// region (counted from its start) have been consumed, or early at the
/// first key carrying a terminator bit. Each pair's second word must be
/// zero; the `verify` failure is distinguishable from truncation by its
/// error kind.
pub fn db_header(input: &[u8]) -> IResult<&[u8], DbHeader> {
    let region_length = input.len();
    let (input, (schema, header_length)) = tuple((le_u32, le_u32))(input)?;

    let mut input = input;
    while ((region_length - input.len()) as u32) < header_length {
        let (rest, (key, _)) = tuple((
            le_u32,
            verify(le_u32, |value| *value == 0),
        ))(input)?;
        input = rest;
        if key & DB_HEADER_TERMINATOR_MASK != 0 {
            break;
        }
    }

    let (input, build) = padded_utf8(DB_HEADER_BUILD_SIZE)(input)?;
    let (input, model) = padded_utf8(DB_HEADER_MODEL_SIZE)(input)?;

    Ok((input, DbHeader {
        schema,
        build: String::from(build),
        model: String::from(model),
    }))
}
