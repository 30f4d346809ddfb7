//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Store construction.
//!
//! The write path builds minimal fresh stores only: it lays out the file
//! header, a catalog table and a catalog hash map whose 1024 buckets are
//! all empty. Child table payloads and populated buckets are not
//! emitted, so an image written here reads back as a store with zero
//! child tables. Re-serializing a decoded store byte-exactly is not a
//! goal of this module.

use std::collections::BTreeMap;

use tracing::debug;

use crate::document::{
    CATALOG_UNIT_ID,
    FLAG_CATALOG,
    HEADER_MAGIC_NUMBER,
    HEADER_VERSION_2,
    TABLE_NAME_CATALOG,
    TABLE_NAME_SIZE,
    TABLE_RESERVED_SIZE,
    UNIT_HEADER_SIZE,
    WRITER_BUCKET_COUNT,
    WRITER_MIN_IMAGE_SIZE,
};

/// Accumulates the units of one table on the write path.
///
/// A builder starts out empty and begins receiving units with the first
/// [`store_unit`](TableBuilder::store_unit) call; unit ids are allocated
/// in steps of four, exactly as a decoded table would allocate them.
/// Serialization consumes the owning [`StoreBuilder`] by value, so a
/// builder can never receive units again after its table is written.
#[derive(Clone, Debug, Default)]
pub struct TableBuilder {
    name: String,
    next_unit_id: u32,
    units: BTreeMap<u32, Vec<u8>>,
}

impl TableBuilder {
    /// Creates an empty builder for a table with the given name.
    pub fn new(name: &str) -> TableBuilder {
        TableBuilder {
            name: String::from(name),
            next_unit_id: 0,
            units: BTreeMap::new(),
        }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocates the next unit id and records the payload under it.
    pub fn store_unit(&mut self, data: Vec<u8>) -> u32 {
        let id = self.next_unit_id;
        self.units.insert(id, data);
        self.next_unit_id += 4;
        id
    }

    /// Number of units recorded so far.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

/// Assembles a fresh CS store image.
#[derive(Clone, Debug, Default)]
pub struct StoreBuilder {
    tables: Vec<TableBuilder>,
}

impl StoreBuilder {
    /// Creates a builder for an empty store.
    pub fn new() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Registers a table with the store.
    pub fn push_table(&mut self, table: TableBuilder) {
        self.tables.push(table);
    }

    /// Serializes the store into a fresh byte buffer.
    ///
    /// The catalog allocates one unit id per registered table, but its
    /// buckets are written empty; both size fields are back-patched with
    /// the laid-out length and the image is zero-padded out to the
    /// minimum store size.
    pub fn to_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WRITER_MIN_IMAGE_SIZE);

        out.extend_from_slice(HEADER_MAGIC_NUMBER);
        out.push(HEADER_VERSION_2);
        out.push(0);
        out.extend_from_slice(&0u16.to_le_bytes());  // crc, not computed
        out.extend_from_slice(&1u32.to_le_bytes());  // reserved
        let sizes_at = out.len();
        out.extend_from_slice(&[0u8; 8]);            // size1/size2, patched below

        let mut catalog = TableBuilder::new(TABLE_NAME_CATALOG);
        for table in &self.tables {
            let id = catalog.store_unit(Vec::new());
            debug!("catalog slot {} allocated for table {:?}", id, table.name());
        }
        write_table(&mut out, &catalog, CATALOG_UNIT_ID, FLAG_CATALOG);

        let size = (out.len() as u32).to_le_bytes();
        out[sizes_at .. sizes_at + 4].copy_from_slice(&size);
        out[sizes_at + 4 .. sizes_at + 8].copy_from_slice(&size);

        if out.len() < WRITER_MIN_IMAGE_SIZE {
            out.resize(WRITER_MIN_IMAGE_SIZE, 0);
        }
        out
    }
}

/// Appends a unit in its wire form: the id word with the flags folded
/// back in, the payload length, and the payload.
pub(crate) fn write_unit(out: &mut Vec<u8>, id: u32, flags: u32, data: &[u8]) {
    out.extend_from_slice(&((id >> 2) | flags).to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

/// Appends a table unit followed by its hash map. The payload's
/// hash-map offset field names the position immediately past the unit,
/// which is where the map header lands.
fn write_table(out: &mut Vec<u8>, table: &TableBuilder, id: u32, flags: u32) {
    let mut payload = Vec::new();
    payload.extend_from_slice(table.name.as_bytes());
    payload.resize(TABLE_NAME_SIZE + TABLE_RESERVED_SIZE, 0);
    payload.extend_from_slice(&(table.next_unit_id >> 2).to_le_bytes());

    let hashmap_offset = out.len() + UNIT_HEADER_SIZE + payload.len() + 4;
    payload.extend_from_slice(&(hashmap_offset as u32).to_le_bytes());

    write_unit(out, id, flags, &payload);
    debug_assert_eq!(out.len(), hashmap_offset);

    write_empty_hashmap(out);
}

/// Appends a hash map whose buckets are all empty.
///
/// Each bucket still names an offset into a laid-out entry region, but
/// with an entry count of zero no reader ever dereferences it; the
/// region is filled with inert placeholder slots.
fn write_empty_hashmap(out: &mut Vec<u8>) {
    out.extend_from_slice(&WRITER_BUCKET_COUNT.to_le_bytes());

    let entries_start = out.len() + WRITER_BUCKET_COUNT as usize * 8;
    for i in 0 .. WRITER_BUCKET_COUNT as usize {
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&((entries_start + i * 8) as u32).to_le_bytes());
    }
    for _ in 0 .. WRITER_BUCKET_COUNT {
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
    }
}
