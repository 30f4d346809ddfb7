//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

mod de;
mod document;
mod error;
mod ser;
mod store;

pub mod registry;
pub use registry::{Binding, Claim, ClaimFlags, ClaimRoles, Database};

pub use de::from_slice;
pub use document::Header;
pub use error::{Error, Result};
pub use ser::{StoreBuilder, TableBuilder};
pub use store::{Refcount, Store, StringContainer, Table, TableKind, Unit};
