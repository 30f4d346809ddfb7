//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The CS store object model.
//!
//! A decoded store is an owned, acyclic value rooted at [`Store`]: the
//! store owns the catalog and the child tables, each table owns its
//! `extra` bytes and its map of units, and the string container owns the
//! `<string>` table together with the reference counts read from its
//! sibling hash map. Nothing in the model refers back into the input
//! buffer.

use std::collections::BTreeMap;
use std::str;

use crate::de;
use crate::document::{
    TABLE_NAME_ARRAYS,
    TABLE_NAME_BINDING_LIST,
    TABLE_NAME_CLAIMS,
    TABLE_NAME_DB_HEADER,
    TABLE_NAME_STRINGS,
    Header,
};
use crate::error::{Error, Result};
use crate::ser;

/// The primitive addressable record of a CS store.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Unit {
    /// The logical unit id. Ids are allocated in multiples of four; the
    /// low two bits of the on-disk field are unused.
    pub id: u32,
    /// The unit flag bitmask.
    pub flags: u32,
    /// The opaque payload.
    pub data: Vec<u8>,
}

impl Unit {
    /// Encodes the unit in its wire form: the id word with the flags
    /// folded back in, the payload length, and the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(crate::document::UNIT_HEADER_SIZE + self.data.len());
        ser::write_unit(&mut out, self.id, self.flags, &self.data);
        out
    }
}

/// Classification of a table by its name.
///
/// Tables the LaunchServices overlay knows how to decode get their own
/// variant; everything else is retained as [`TableKind::Raw`] with its
/// `extra` bytes and units undecoded.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TableKind {
    /// The `<string>` string container table.
    Strings,
    /// The `<array>` integer array table.
    Arrays,
    /// The `BindingList` table.
    BindingList,
    /// The `Claim` table.
    Claims,
    /// The `DB Header` table.
    DbHeader,
    /// Any table with no decoder in this library.
    Raw,
}

impl TableKind {
    /// Classifies a table name.
    pub fn from_name(name: &str) -> TableKind {
        match name {
            TABLE_NAME_STRINGS => TableKind::Strings,
            TABLE_NAME_ARRAYS => TableKind::Arrays,
            TABLE_NAME_BINDING_LIST => TableKind::BindingList,
            TABLE_NAME_CLAIMS => TableKind::Claims,
            TABLE_NAME_DB_HEADER => TableKind::DbHeader,
            _ => TableKind::Raw,
        }
    }
}

/// A named unit whose payload indexes a hash map of child units.
///
/// A table carries the identity fields of the unit it was decoded from
/// alongside its own: the stripped name, the next unit id it would
/// allocate, the schema-specific `extra` bytes, and the decoded units of
/// its hash map.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Table {
    /// Logical id of the table's unit.
    pub id: u32,
    /// Flag bitmask of the table's unit.
    pub flags: u32,
    /// Table name with the padding stripped.
    pub name: String,
    /// The next unit id this table would allocate.
    pub next_unit_id: u32,
    /// Schema-specific bytes following the table header.
    pub extra: Vec<u8>,
    /// Decoded units of the table's hash map, keyed as on disk.
    pub units: BTreeMap<u32, Unit>,
}

impl Table {
    /// Classifies the table by its name.
    pub fn kind(&self) -> TableKind {
        TableKind::from_name(&self.name)
    }

    /// Allocates the next unit id and stores a fresh unit with the given
    /// payload under it. Ids advance in steps of four.
    pub fn store_unit(&mut self, data: Vec<u8>) -> u32 {
        let id = self.next_unit_id;
        self.units.insert(id, Unit { id, flags: 0, data });
        self.next_unit_id += 4;
        id
    }
}

/// A string's reference count as read from the refcount hash map.
///
/// The on-disk word stores the count in its low byte; the high byte is
/// either zero or a hint marker. Counts of zero are tolerated and the
/// entry retained.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Refcount {
    /// The reference count.
    pub count: u32,
    /// Whether the hint marker was set on the stored word.
    pub hinted: bool,
}

/// A view over the `<string>` table and its sibling refcount hash map.
///
/// Entry payloads in the `<string>` table are the UTF-8 bytes of the
/// string itself, with no terminator.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringContainer {
    table: Table,
    refcounts: BTreeMap<u32, Refcount>,
}

impl StringContainer {
    pub(crate) fn new(table: Table, refcounts: BTreeMap<u32, Refcount>) -> StringContainer {
        StringContainer { table, refcounts }
    }

    /// Returns the string stored under the given id.
    pub fn get(&self, key: u32) -> Result<&str> {
        let unit = self.table.units.get(&key).ok_or(Error::UnknownString)?;
        str::from_utf8(&unit.data).map_err(|_| Error::BadUtf8)
    }

    /// Returns the reference count recorded for the given id, if any.
    pub fn refcount(&self, key: u32) -> Option<Refcount> {
        self.refcounts.get(&key).copied()
    }

    /// Increments the reference count of the given id.
    pub fn retain(&mut self, key: u32) -> Result<()> {
        let refcount = self.refcounts.get_mut(&key).ok_or(Error::UnknownString)?;
        refcount.count += 1;
        Ok(())
    }

    /// Decrements the reference count of the given id, dropping the
    /// refcount entry when it reaches zero.
    pub fn release(&mut self, key: u32) -> Result<()> {
        let refcount = self.refcounts.get_mut(&key).ok_or(Error::UnknownString)?;
        refcount.count -= 1;
        if refcount.count == 0 {
            self.refcounts.remove(&key);
        }
        Ok(())
    }

    /// Stores a fresh string under a newly allocated id with a reference
    /// count of one, and returns the id.
    pub fn put(&mut self, s: &str) -> u32 {
        let key = self.table.store_unit(s.as_bytes().to_vec());
        self.refcounts.insert(key, Refcount { count: 1, hinted: false });
        key
    }

    /// Number of strings held by the container.
    pub fn len(&self) -> usize {
        self.table.units.len()
    }

    /// Whether the container holds no strings.
    pub fn is_empty(&self) -> bool {
        self.table.units.is_empty()
    }
}

/// A decoded CS store.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Store {
    /// The file header as read.
    pub header: Header,
    /// The root catalog table.
    pub catalog: Table,
    /// Child tables keyed by their catalog hash-map key. The `<string>`
    /// table is not included here; it lives in the string container.
    pub tables: BTreeMap<u32, Table>,
    strings: Option<StringContainer>,
}

impl Store {
    pub(crate) fn new(
        header: Header,
        catalog: Table,
        tables: BTreeMap<u32, Table>,
        strings: Option<StringContainer>,
    ) -> Store {
        Store { header, catalog, tables, strings }
    }

    /// Decodes a store from a byte buffer.
    pub fn from_slice(input: &[u8]) -> Result<Store> {
        de::from_slice(input)
    }

    /// Whether the store carried a `<string>` table.
    pub fn has_strings(&self) -> bool {
        self.strings.is_some()
    }

    /// The store's string container.
    pub fn strings(&self) -> Result<&StringContainer> {
        self.strings.as_ref().ok_or(Error::UnknownTable)
    }

    /// The store's string container, mutably.
    pub fn strings_mut(&mut self) -> Result<&mut StringContainer> {
        self.strings.as_mut().ok_or(Error::UnknownTable)
    }

    /// Looks up a child table by name.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .values()
            .find(|table| table.name == name)
            .ok_or(Error::UnknownTable)
    }

    /// Resolves a string id through the string container.
    pub fn string(&self, key: u32) -> Result<&str> {
        self.strings()?.get(key)
    }

    /// Decodes the `<array>` entry stored under the given key.
    pub fn array(&self, key: u32) -> Result<Vec<u32>> {
        let table = self.table(TABLE_NAME_ARRAYS)?;
        let unit = table.units.get(&key).ok_or(Error::UnknownArray)?;
        de::parser::record::array(&unit.data)
            .map(|(_, elements)| elements)
            .map_err(|_| Error::BadCount)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::error::Error;
    use super::{Refcount, StringContainer, Table, TableKind, Unit};

    fn string_table() -> Table {
        let mut units = BTreeMap::new();
        units.insert(4, Unit { id: 4, flags: 0, data: b"public.text".to_vec() });
        units.insert(8, Unit { id: 8, flags: 0, data: vec![0xFF, 0xFE] });
        Table {
            id: 0x10,
            flags: 0,
            name: String::from("<string>"),
            next_unit_id: 12,
            extra: vec![],
            units,
        }
    }

    fn container() -> StringContainer {
        let mut refcounts = BTreeMap::new();
        refcounts.insert(4, Refcount { count: 2, hinted: true });
        StringContainer::new(string_table(), refcounts)
    }

    #[test]
    fn test_get() {
        let strings = container();
        assert_eq!(strings.get(4), Ok("public.text"));
        assert_eq!(strings.get(8), Err(Error::BadUtf8));
        assert_eq!(strings.get(100), Err(Error::UnknownString));
    }

    #[test]
    fn test_retain_release() {
        let mut strings = container();
        strings.retain(4).unwrap();
        assert_eq!(strings.refcount(4), Some(Refcount { count: 3, hinted: true }));
        strings.release(4).unwrap();
        strings.release(4).unwrap();
        strings.release(4).unwrap();
        // Dropped at zero; the string unit itself stays.
        assert_eq!(strings.refcount(4), None);
        assert_eq!(strings.get(4), Ok("public.text"));
        assert_eq!(strings.retain(100), Err(Error::UnknownString));
    }

    #[test]
    fn test_put_allocates_in_steps_of_four() {
        let mut strings = container();
        let first = strings.put("com.example.md");
        let second = strings.put("md");
        assert_eq!(first, 12);
        assert_eq!(second, 16);
        assert_eq!(strings.get(first), Ok("com.example.md"));
        assert_eq!(strings.refcount(first), Some(Refcount { count: 1, hinted: false }));
    }

    #[test]
    fn test_table_kind() {
        assert_eq!(TableKind::from_name("<string>"), TableKind::Strings);
        assert_eq!(TableKind::from_name("<array>"), TableKind::Arrays);
        assert_eq!(TableKind::from_name("BindingList"), TableKind::BindingList);
        assert_eq!(TableKind::from_name("Claim"), TableKind::Claims);
        assert_eq!(TableKind::from_name("DB Header"), TableKind::DbHeader);
        assert_eq!(TableKind::from_name("Alias"), TableKind::Raw);
    }

    #[test]
    fn test_unit_encode_decode_identity() {
        let original = Unit {
            id: 0xFFFF_6D74,
            flags: crate::document::FLAG_CATALOG,
            data: vec![0x01, 0x02, 0x03],
        };
        let encoded = original.to_bytes();
        let (rest, decoded) = crate::de::parser::unit::unit(&encoded).unwrap();
        assert_eq!(rest.len(), 0);
        assert_eq!(decoded, original);
    }
}
