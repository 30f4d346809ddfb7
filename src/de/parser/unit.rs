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
    bytes::complete::take,
    combinator::map,
    number::complete::le_u32,
    sequence::tuple,
};

use crate::document::{ALL_FLAGS, TABLE_NAME_SIZE, TABLE_RESERVED_SIZE, TableHeader};
use crate::de::parser::utils::padded_utf8;
use crate::store::Unit;

/// Parses a unit at the start of the input slice.
///
/// The leading word carries the flag bits and the unit id pre-shifted
/// right by two; both are recovered here. The payload is copied out of
/// the input.
pub fn unit(input: &[u8]) -> IResult<&[u8], Unit> {
    let (input, id_and_flags) = le_u32(input)?;
    let (input, size) = le_u32(input)?;
    let (input, data) = take(size)(input)?;
    Ok((input, Unit {
        id: (id_and_flags & !ALL_FLAGS) << 2,
        flags: id_and_flags & ALL_FLAGS,
        data: data.to_vec(),
    }))
}

/// Parses the fixed table header at the start of a unit payload.
///
/// The unconsumed remainder of the payload is the table's `extra` region.
/// The stored next-unit-id is scaled back up on read; unit ids are
/// allocated in multiples of four and stored divided by four.
pub fn table_header(input: &[u8]) -> IResult<&[u8], TableHeader> {
    map(
        tuple((
            padded_utf8(TABLE_NAME_SIZE),
            take(TABLE_RESERVED_SIZE),
            le_u32,
            le_u32,
        )), |(
            name,
            _,
            next_unit_raw,
            hashmap_offset,
        )| TableHeader {
            name: String::from(name),
            next_unit_id: next_unit_raw << 2,
            hashmap_offset,
        }
    )(input)
}

#[cfg(test)]
mod tests {
    use crate::document::{FLAG_CATALOG, TableHeader};
    use crate::store::Unit;
    use super::{table_header, unit};

    #[test]
    fn test_unit() {
        let test_input = &[
            // id 0x30 stored as 0x0C, no flags.
            0x0C, 0x00, 0x00, 0x00,
            0x03, 0x00, 0x00, 0x00,
            0xAA, 0xBB, 0xCC,
            // trailing input left untouched
            0xFF,
        ];
        assert_eq!(
            unit(test_input),
            Ok((
                &test_input[11 ..],
                Unit {
                    id: 0x30,
                    flags: 0,
                    data: vec![0xAA, 0xBB, 0xCC],
                },
            ))
        );
    }

    #[test]
    fn test_unit_catalog_flag_split() {
        let test_input = &[
            // id 0x10 stored as 0x04 with the catalog flag folded in.
            0x04, 0x00, 0x00, 0x40,
            0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(
            unit(test_input),
            Ok((
                &test_input[8 ..],
                Unit {
                    id: 0x10,
                    flags: FLAG_CATALOG,
                    data: vec![],
                },
            ))
        );
    }

    #[test]
    fn test_unit_truncated_payload() {
        let test_input = &[
            0x00, 0x00, 0x00, 0x00,
            0x04, 0x00, 0x00, 0x00,
            0xAA,
        ];
        assert_eq!(unit(test_input).is_err(), true);
    }

    #[test]
    fn test_table_header() {
        let mut test_input = Vec::new();
        test_input.extend_from_slice(b"BindingList");
        test_input.resize(0x30 + 0x10, 0);
        // next unit id 0x20 stored as 0x08
        test_input.extend_from_slice(&[0x08, 0x00, 0x00, 0x00]);
        test_input.extend_from_slice(&[0x00, 0x10, 0x00, 0x00]);
        // extra region
        test_input.extend_from_slice(&[0xDE, 0xAD]);

        let (extra, value) = table_header(&test_input).unwrap();
        assert_eq!(extra, &[0xDE, 0xAD]);
        assert_eq!(value, TableHeader {
            name: String::from("BindingList"),
            next_unit_id: 0x20,
            hashmap_offset: 0x1000,
        });
    }

    #[test]
    fn test_table_header_too_short() {
        assert_eq!(table_header(&[0x00; 0x40]).is_err(), true);
    }
}
