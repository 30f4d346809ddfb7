//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, Error>;

/// CS store decoding and construction error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input ended before a complete header, unit or record could be read.
    Truncated,
    /// A table unit's payload is shorter than the fixed table header.
    TruncatedPayload,
    /// The file does not open with the CS store magic number.
    BadMagic,
    /// The version in the file header is not one supported by this library.
    BadVersion,
    /// The unit following the file header does not carry the catalog flag.
    NotCatalog,
    /// A hash-map, entry or unit offset points outside the input.
    BadOffset,
    /// A string payload or padded name field is not valid UTF-8.
    BadUtf8,
    /// An array payload is shorter than its declared element count requires.
    BadCount,
    /// A referenced string id is not present in the string container.
    UnknownString,
    /// A table with the requested name is not present in the store.
    UnknownTable,
    /// A referenced array key is not present in the array table.
    UnknownArray,
    /// A claim references a binding list key that is not present.
    UnknownBinding,
    /// A claim carries a non-empty delegate string, which this library
    /// does not decode yet.
    DelegateUnsupported,
    /// A claim record carries bytes past its final field.
    UnexpectedTrailing,
    /// A refcount word carries a high byte other than the hint marker or zero.
    RefcountInvariant,
    /// A DB Header key pair carries a non-zero second word.
    BadHeaderPair,
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated =>
                formatter.write_str("unexpected end of input"),
            Error::TruncatedPayload =>
                formatter.write_str("table payload shorter than a table header"),
            Error::BadMagic =>
                formatter.write_str("missing or invalid CS store magic number"),
            Error::BadVersion =>
                formatter.write_str("document is not a version 2 CS store"),
            Error::NotCatalog =>
                formatter.write_str("root unit does not carry the catalog flag"),
            Error::BadOffset =>
                formatter.write_str("offset points outside the input"),
            Error::BadUtf8 =>
                formatter.write_str("string payload is not valid UTF-8"),
            Error::BadCount =>
                formatter.write_str("array payload shorter than its element count"),
            Error::UnknownString =>
                formatter.write_str("referenced string id not present"),
            Error::UnknownTable =>
                formatter.write_str("referenced table not present"),
            Error::UnknownArray =>
                formatter.write_str("referenced array key not present"),
            Error::UnknownBinding =>
                formatter.write_str("referenced binding list key not present"),
            Error::DelegateUnsupported =>
                formatter.write_str("claim carries a non-empty delegate"),
            Error::UnexpectedTrailing =>
                formatter.write_str("claim record carries trailing bytes"),
            Error::RefcountInvariant =>
                formatter.write_str("refcount word carries an invalid high byte"),
            Error::BadHeaderPair =>
                formatter.write_str("DB Header key pair carries a non-zero value"),
        }
    }
}

impl std::error::Error for Error {}
