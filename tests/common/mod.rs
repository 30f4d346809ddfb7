//! Assembles synthetic CS store images with real absolute offsets, so
//! integration tests can exercise the full decoder without binary
//! fixtures. Layout: the 20-byte file header, the catalog unit, then
//! units and hash maps in append order, with the catalog's hash-map
//! offset patched in last.

#![allow(dead_code)]

/// Absolute position of the catalog payload's hash-map offset field.
pub const CATALOG_MAP_FIELD: usize = 0x60;

pub struct ImageBuilder {
    buf: Vec<u8>,
    catalog_entries: Vec<(u32, u32)>,
}

impl ImageBuilder {
    pub fn new() -> ImageBuilder {
        let mut builder = ImageBuilder {
            buf: Vec::new(),
            catalog_entries: Vec::new(),
        };
        builder.buf.extend_from_slice(b"bdsl");
        builder.buf.push(2);
        builder.buf.push(0);
        builder.buf.extend_from_slice(&[0u8; 2]); // crc
        builder.buf.extend_from_slice(&[0u8; 4]); // reserved
        builder.buf.extend_from_slice(&[0u8; 8]); // size1, size2

        // Catalog unit with a placeholder hash-map offset.
        let payload = table_payload("<catalog>", 0, 0, &[]);
        builder.unit(0xFFFF_6D74, 0x4000_0000, &payload);
        builder
    }

    /// Appends a unit and returns its absolute offset.
    pub fn unit(&mut self, id: u32, flags: u32, data: &[u8]) -> u32 {
        let offset = self.buf.len() as u32;
        self.buf.extend_from_slice(&((id >> 2) | flags).to_le_bytes());
        self.buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(data);
        offset
    }

    /// Appends a single-bucket hash map and returns its absolute offset.
    pub fn hashmap(&mut self, pairs: &[(u32, u32)]) -> u32 {
        let offset = self.buf.len() as u32;
        self.buf.extend_from_slice(&1u32.to_le_bytes());
        self.buf.extend_from_slice(&(pairs.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(&(offset + 12).to_le_bytes());
        for (key, value) in pairs {
            self.buf.extend_from_slice(&key.to_le_bytes());
            self.buf.extend_from_slice(&value.to_le_bytes());
        }
        offset
    }

    /// Appends a table (its hash map first, then the table unit) and
    /// registers it with the catalog under the given key. The unit pairs
    /// map hash-map keys to absolute unit offsets.
    pub fn table(&mut self, key: u32, name: &str, unit_pairs: &[(u32, u32)], extra: &[u8]) -> u32 {
        let map_offset = self.hashmap(unit_pairs);
        let payload = table_payload(name, 0, map_offset, extra);
        let offset = self.unit(0, 0, &payload);
        self.catalog_entries.push((key, offset));
        offset
    }

    /// Appends a table without a hash map and registers it with the
    /// catalog under the given key.
    pub fn table_without_map(&mut self, key: u32, name: &str, extra: &[u8]) -> u32 {
        let payload = table_payload(name, 0, 0, extra);
        let offset = self.unit(0, 0, &payload);
        self.catalog_entries.push((key, offset));
        offset
    }

    /// Writes the catalog hash map, patches the catalog unit to point at
    /// it, and returns the finished image.
    pub fn finish(mut self) -> Vec<u8> {
        let entries = self.catalog_entries.clone();
        let map_offset = self.hashmap(&entries);
        self.buf[CATALOG_MAP_FIELD .. CATALOG_MAP_FIELD + 4]
            .copy_from_slice(&map_offset.to_le_bytes());
        self.buf
    }
}

/// Lays out a table unit payload: NUL-padded name, reserved bytes, the
/// next-unit-id word (stored divided by four), the hash-map offset, and
/// the extra region.
pub fn table_payload(name: &str, next_unit_id: u32, hashmap_offset: u32, extra: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(name.as_bytes());
    payload.resize(0x40, 0);
    payload.extend_from_slice(&(next_unit_id >> 2).to_le_bytes());
    payload.extend_from_slice(&hashmap_offset.to_le_bytes());
    payload.extend_from_slice(extra);
    payload
}

/// Packs a five-character name the way it appears on disk: last
/// character in the lowest symbol position, discriminator bit set.
pub fn pack(name: &str) -> u32 {
    const ALPHABET: &[u8; 64] =
        b"\x00 abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    assert!(name.len() <= 5);
    name.bytes().rev().enumerate().fold(1u32, |word, (i, b)| {
        let index = ALPHABET.iter().position(|&symbol| symbol == b).unwrap();
        word | (index as u32) << (2 + 6 * i)
    })
}

/// Lays out a compact `<array>` entry payload with 16-bit elements.
pub fn compact_array(elements: &[u16]) -> Vec<u8> {
    let mut payload = (elements.len() as u32).to_le_bytes().to_vec();
    for element in elements {
        payload.extend_from_slice(&element.to_le_bytes());
    }
    payload
}

/// Lays out a full `<array>` entry payload with 32-bit elements.
pub fn full_array(elements: &[u32]) -> Vec<u8> {
    let mut payload = (elements.len() as u32 | 0x2000_0000).to_le_bytes().to_vec();
    for element in elements {
        payload.extend_from_slice(&element.to_le_bytes());
    }
    payload
}

/// A claim record laid out field by field.
pub struct ClaimRecord {
    pub claiming_bundle_record: u32,
    pub generation: u32,
    pub flags: u32,
    pub rank: u16,
    pub roles: u16,
    pub bundle: u32,
    pub localized_names: u32,
    pub required_capabilities: u32,
    pub icon_files: [u32; 9],
    pub delegate: u32,
    pub bindings: u32,
}

impl Default for ClaimRecord {
    fn default() -> ClaimRecord {
        ClaimRecord {
            claiming_bundle_record: 0x11,
            generation: 1,
            flags: 0x21,
            rank: 0x1F4,
            roles: 0x2,
            bundle: 0x77,
            localized_names: 0x99,
            required_capabilities: 0,
            icon_files: [0, 1, 5, 0, 1, 0, 0, 0, 0],
            delegate: 12,
            bindings: 4,
        }
    }
}

impl ClaimRecord {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut record = Vec::new();
        record.extend_from_slice(&self.claiming_bundle_record.to_le_bytes());
        record.extend_from_slice(&self.generation.to_le_bytes());
        record.extend_from_slice(&self.flags.to_le_bytes());
        record.extend_from_slice(&self.rank.to_le_bytes());
        record.extend_from_slice(&self.roles.to_le_bytes());
        record.extend_from_slice(&self.bundle.to_le_bytes());
        record.extend_from_slice(&self.localized_names.to_le_bytes());
        record.extend_from_slice(&self.required_capabilities.to_le_bytes());
        for sid in &self.icon_files {
            record.extend_from_slice(&sid.to_le_bytes());
        }
        record.extend_from_slice(&self.delegate.to_le_bytes());
        record.extend_from_slice(&self.bindings.to_le_bytes());
        record
    }
}
