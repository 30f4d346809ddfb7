//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The LaunchServices registry model.
//!
//! This module layers the LaunchServices data model over a decoded
//! [`Store`]: the database header (schema, build and model strings), the
//! binding table mapping binding keys to named attribute lists, and the
//! claim records asserting which bundle handles which type. Everything
//! here works on decoded tables and string ids; no raw file offset
//! reaches this layer.

mod claim;
mod packed;

pub use claim::{Claim, ClaimFlags, ClaimRoles};
pub use packed::unpack;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::de::{error_kind, parser};
use crate::document::{
    TABLE_NAME_BINDING_LIST,
    TABLE_NAME_CLAIMS,
    TABLE_NAME_DB_HEADER,
};
use crate::error::{Error, Result};
use crate::store::Store;

/// A UTI binding: attribute names mapped to their value lists, for
/// example `"ext" → ["txt", "text"]`.
pub type Binding = BTreeMap<String, Vec<String>>;

/// A LaunchServices database decoded from a CS store.
///
/// Construction eagerly decodes the `DB Header` table and the full
/// binding table; claims resolve against both and are decoded on demand.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Database {
    store: Store,
    schema: u32,
    build: String,
    model: String,
    bindings: BTreeMap<u32, Binding>,
}

impl Database {
    /// Decodes a database from a byte buffer.
    pub fn from_slice(input: &[u8]) -> Result<Database> {
        Database::from_store(Store::from_slice(input)?)
    }

    /// Builds the overlay over an already decoded store.
    pub fn from_store(store: Store) -> Result<Database> {
        let header = decode_db_header(&store)?;
        debug!(
            "database schema {} built on {:?} for {:?}",
            header.schema, header.build, header.model,
        );
        let bindings = decode_binding_list(&store)?;
        Ok(Database {
            store,
            schema: header.schema,
            build: header.build,
            model: header.model,
            bindings,
        })
    }

    /// The underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The database schema number.
    pub fn schema(&self) -> u32 {
        self.schema
    }

    /// The OS build the database was generated on.
    pub fn build(&self) -> &str {
        &self.build
    }

    /// The hardware model the database was generated on.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The decoded binding table.
    pub fn bindings(&self) -> &BTreeMap<u32, Binding> {
        &self.bindings
    }

    /// Decodes every claim record in the `Claim` table.
    ///
    /// Records with an empty payload carry no claim and are omitted from
    /// the result.
    pub fn claims(&self) -> Result<BTreeMap<u32, Claim>> {
        let table = self.store.table(TABLE_NAME_CLAIMS)?;
        let mut claims = BTreeMap::new();
        for (key, unit) in &table.units {
            if unit.data.is_empty() {
                trace!("claim {} carries no record", key);
                continue;
            }
            let (rest, raw) = parser::record::claim(&unit.data).map_err(|_| Error::Truncated)?;
            if !rest.is_empty() {
                return Err(Error::UnexpectedTrailing);
            }
            claims.insert(*key, Claim::from_raw(raw, self)?);
        }
        Ok(claims)
    }

    /// Resolves an `<array>` entry whose elements are string ids.
    pub fn string_array(&self, key: u32) -> Result<Vec<String>> {
        self.store
            .array(key)?
            .into_iter()
            .map(|sid| self.store.string(sid).map(String::from))
            .collect()
    }
}

/// Decodes the `DB Header` table's `extra` region.
fn decode_db_header(store: &Store) -> Result<crate::document::DbHeader> {
    let table = store.table(TABLE_NAME_DB_HEADER)?;
    let (_, header) = parser::record::db_header(&table.extra).map_err(|e| {
        match error_kind(&e) {
            Some(nom::error::ErrorKind::Verify) => Error::BadHeaderPair,
            Some(nom::error::ErrorKind::MapRes) => Error::BadUtf8,
            _ => Error::Truncated,
        }
    })?;
    Ok(header)
}

/// Decodes every entry of the `BindingList` table, resolving attribute
/// names and values through the string container.
fn decode_binding_list(store: &Store) -> Result<BTreeMap<u32, Binding>> {
    let table = store.table(TABLE_NAME_BINDING_LIST)?;
    let mut bindings = BTreeMap::new();
    for (key, unit) in &table.units {
        let (_, raw_bindings) = parser::record::binding_list(&unit.data)
            .map_err(|_| Error::Truncated)?;

        let mut binding = Binding::new();
        for raw in raw_bindings {
            let name = String::from(store.string(raw.name_sid)?);
            let values = raw
                .values
                .into_iter()
                .map(|word| decode_binding_value(store, word))
                .collect::<Result<Vec<String>>>()?;
            binding.insert(name, values);
        }
        bindings.insert(*key, binding);
    }
    Ok(bindings)
}

/// Decodes one binding value word: a packed five-character name when the
/// low bit is set, a string id otherwise.
fn decode_binding_value(store: &Store, word: u32) -> Result<String> {
    if word & 1 == 1 {
        Ok(packed::unpack(word))
    } else {
        store.string(word).map(String::from)
    }
}
