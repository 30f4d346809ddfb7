//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Store decoding.
//!
//! A CS store is a pointer-rich structure: units, tables and hash maps
//! reference each other by absolute byte offset. Rather than seeking a
//! mutable cursor back and forth, every nested lookup here derives a
//! fresh sub-slice of the immutable input at a validated offset and
//! parses forward from there.

pub(crate) mod parser;

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::document::{
    FLAG_CATALOG,
    HEADER_MAGIC_NUMBER,
    HEADER_SIZE,
    HEADER_VERSION_2,
    REFCOUNT_HINT,
    TABLE_HEADER_SIZE,
};
use crate::error::{Error, Result};
use crate::store::{Refcount, Store, StringContainer, Table, TableKind, Unit};

/// Decodes a CS store from a byte buffer.
///
/// Validates the magic number and version, decodes the catalog unit that
/// follows the file header, and materializes every child table the
/// catalog's hash map references. The `<string>` table is diverted into
/// the store's string container instead of the general table set.
pub fn from_slice(input: &[u8]) -> Result<Store> {
    let magic = input.get(.. HEADER_MAGIC_NUMBER.len()).ok_or(Error::Truncated)?;
    if magic != HEADER_MAGIC_NUMBER {
        return Err(Error::BadMagic);
    }
    let version = *input.get(HEADER_MAGIC_NUMBER.len()).ok_or(Error::Truncated)?;
    if version != HEADER_VERSION_2 {
        return Err(Error::BadVersion);
    }

    let header_slice = input.get(.. HEADER_SIZE).ok_or(Error::Truncated)?;
    let (_, header) = parser::document::header(header_slice).map_err(|_| Error::Truncated)?;

    // The catalog unit sits immediately after the file header.
    let (_, catalog_unit) = parser::unit::unit(&input[HEADER_SIZE ..])
        .map_err(|_| Error::Truncated)?;
    if catalog_unit.flags & FLAG_CATALOG == 0 {
        return Err(Error::NotCatalog);
    }
    let catalog = decode_table(input, catalog_unit)?;
    debug!("decoded catalog with {} child tables", catalog.units.len());

    let mut tables = BTreeMap::new();
    let mut strings = None;
    for (key, unit) in &catalog.units {
        let table = decode_table(input, unit.clone())?;
        if table.flags & FLAG_CATALOG != 0 {
            warn!("table {:?} carries the catalog flag", table.name);
        }
        debug!("decoded table {:?} with {} units", table.name, table.units.len());
        if table.kind() == TableKind::Strings {
            strings = Some(decode_string_container(input, table)?);
        } else {
            tables.insert(*key, table);
        }
    }

    Ok(Store::new(header, catalog, tables, strings))
}

/// Reinterprets a unit as a table, reading the table's hash map from the
/// offset named in its payload. A zero offset means the table carries no
/// hash map.
fn decode_table(input: &[u8], unit: Unit) -> Result<Table> {
    if unit.data.len() < TABLE_HEADER_SIZE {
        return Err(Error::TruncatedPayload);
    }
    // With the length gate above, the only way the header parse can fail
    // is a name field that is not UTF-8.
    let (extra, table_header) = parser::unit::table_header(&unit.data)
        .map_err(|_| Error::BadUtf8)?;

    let units = if table_header.hashmap_offset != 0 {
        read_unit_hashmap(input, table_header.hashmap_offset as usize)?
    } else {
        BTreeMap::new()
    };

    Ok(Table {
        id: unit.id,
        flags: unit.flags,
        name: table_header.name,
        next_unit_id: table_header.next_unit_id,
        extra: extra.to_vec(),
        units,
    })
}

/// Builds the string container from a decoded `<string>` table.
///
/// The table's `extra` names the absolute offset of a secondary hash map
/// whose values are refcount words rather than unit offsets.
fn decode_string_container(input: &[u8], table: Table) -> Result<StringContainer> {
    let (_, offset) = parser::record::string_extra(&table.extra).map_err(|_| Error::Truncated)?;

    let mut refcounts = BTreeMap::new();
    for (key, word) in read_raw_hashmap(input, offset as usize)? {
        let high = word & 0xFF00;
        if high != 0 && high != REFCOUNT_HINT {
            return Err(Error::RefcountInvariant);
        }
        let count = word & 0xFF;
        if count == 0 {
            trace!("string {} retained with a zero refcount", key);
        }
        refcounts.insert(key, Refcount { count, hinted: high == REFCOUNT_HINT });
    }

    Ok(StringContainer::new(table, refcounts))
}

/// Walks the hash map rooted at `offset`, yielding the raw `(key, word)`
/// pairs of every bucket. Buckets with no entries are not dereferenced.
/// A key appearing in more than one bucket resolves to the last
/// occurrence in walk order.
fn read_raw_hashmap(input: &[u8], offset: usize) -> Result<Vec<(u32, u32)>> {
    let header_slice = slice_from(input, offset)?;
    let (bucket_slice, bucket_count) = parser::document::bucket_count(header_slice)
        .map_err(|_| Error::Truncated)?;
    let (_, buckets) = parser::document::buckets(bucket_count as usize)(bucket_slice)
        .map_err(|_| Error::Truncated)?;

    let mut pairs = Vec::new();
    for bucket in buckets {
        if bucket.entry_count == 0 {
            continue;
        }
        let entries_slice = slice_from(input, bucket.entries_offset as usize)?;
        let (_, entries) = parser::document::entries(bucket.entry_count as usize)(entries_slice)
            .map_err(|_| Error::Truncated)?;
        pairs.extend(entries);
    }
    Ok(pairs)
}

/// Walks the hash map rooted at `offset`, dereferencing each value word
/// as the absolute offset of a unit.
fn read_unit_hashmap(input: &[u8], offset: usize) -> Result<BTreeMap<u32, Unit>> {
    let mut units = BTreeMap::new();
    for (key, unit_offset) in read_raw_hashmap(input, offset)? {
        let unit_slice = slice_from(input, unit_offset as usize)?;
        let (_, unit) = parser::unit::unit(unit_slice).map_err(|_| Error::Truncated)?;
        units.insert(key, unit);
    }
    Ok(units)
}

/// Returns the input from `offset` onward, rejecting offsets past the end.
fn slice_from(input: &[u8], offset: usize) -> Result<&[u8]> {
    input.get(offset ..).ok_or(Error::BadOffset)
}

/// Extracts the error kind from a nom failure, if it carries one.
pub(crate) fn error_kind(
    error: &nom::Err<(&[u8], nom::error::ErrorKind)>
) -> Option<nom::error::ErrorKind> {
    match error {
        nom::Err::Error((_, kind)) | nom::Err::Failure((_, kind)) => Some(*kind),
        nom::Err::Incomplete(_) => None,
    }
}
