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
    combinator::map_res,
};

use std::str;

/// Returns a parser which consumes a fixed-width NUL-padded field and
/// yields the contained UTF-8 string with the trailing padding stripped.
///
/// # Notes
///
/// 1. Exactly `n` bytes of input are consumed regardless of padding.
/// 2. The bytes up to the padding are validated as UTF-8.
/// 3. This is a zero-copy operation.
pub fn padded_utf8(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], &str> {
    move |input: &[u8]| {
        map_res(
            take(n),
            |bytes: &[u8]| -> Result<&str, str::Utf8Error> {
                let end = bytes
                    .iter()
                    .rposition(|&b| b != 0)
                    .map_or(0, |index| index + 1);
                str::from_utf8(&bytes[.. end])
            }
        )(input)
    }
}
