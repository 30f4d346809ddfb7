//
// Copyright 2026 csstore Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use bitflags::bitflags;

use crate::document::RawClaim;
use crate::error::{Error, Result};
use crate::registry::{Binding, Database};

bitflags! {
    /// Flag bits stored in a claim record.
    ///
    /// Decoded with `from_bits_retain`, so bits outside this vocabulary
    /// survive a decode unaltered.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
    pub struct ClaimFlags : u32 {
        /// The claim is an Apple-provided default handler.
        const APPLE_DEFAULT = 0x1;

        /// The Apple default may not be overridden by third parties.
        const APPLE_DEFAULT_NO_OVERRIDE = 0x2;

        /// The claiming bundle is Apple-internal.
        const APPLE_INTERNAL = 0x4;

        /// The claimed type is a document package (a directory treated
        /// as a single document).
        const PACKAGE = 0x8;

        /// The claim uses a pre-UTI wildcard extension match.
        const LEGACY_WILDCARD = 0x10;

        /// The claim covers a document type.
        const DOC_TYPE = 0x20;

        /// The claim covers a URL scheme.
        const URL_TYPE = 0x40;

        /// The claimed URL scheme is private to the claiming bundle.
        const PRIVATE_SCHEME = 0x80;

        /// The handler is available even when the bundle is not present
        /// locally.
        const ALWAYS_AVAILABLE = 0x100;

        /// The handler participates in iCloud conflict resolution.
        const RESOLVES_ICLOUD_CONFLICTS = 0x200;

        /// The claim matches any UTI.
        const UTI_WILDCARD = 0x400;

        /// The handler supports collaborative documents.
        const SUPPORTS_COLLABORATION = 0x800;

        /// Icon file paths are relative to the bundle rather than
        /// absolute.
        const RELATIVE_ICON_PATH = 0x1000;
    }
}

bitflags! {
    /// Role bits stored in a claim record.
    ///
    /// Decoded with `from_bits_retain`, so bits outside this vocabulary
    /// survive a decode unaltered.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
    pub struct ClaimRoles : u16 {
        /// The bundle claims the type without offering to open it.
        const NONE = 0x1;

        /// The bundle can display the type.
        const VIEWER = 0x2;

        /// The bundle can edit the type.
        const EDITOR = 0x4;

        /// The bundle executes the type.
        const SHELL = 0x8;

        /// The bundle can convert the type into another it handles.
        const IMPORTER = 0x10;

        /// The bundle generates Quick Look previews for the type.
        const QLGENERATOR = 0x20;
    }
}

/// A LaunchServices claim: a bundle's assertion that it handles a type
/// or URL scheme with a given role and rank.
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Claim {
    /// Record id of the claiming bundle.
    pub claiming_bundle_record: u32,
    /// Generation counter of the claim.
    pub generation: u32,
    /// The stored flag word.
    pub flags: ClaimFlags,
    /// Claim rank, used to order competing handlers.
    pub rank: u16,
    /// The stored role word.
    pub roles: ClaimRoles,
    /// Bundle reference.
    pub bundle: u32,
    /// Localized-names reference, preserved undecoded.
    pub localized_names: u32,
    /// Capabilities the claiming bundle requires, resolved to strings.
    pub required_capabilities: Vec<String>,
    /// Icon file names, with unused slots omitted.
    pub icon_files: Vec<String>,
    /// The claim delegate. Always empty in the stores this library
    /// accepts.
    pub delegate: String,
    /// The claim's UTI bindings, resolved from the binding table.
    pub bindings: Binding,
}

impl Claim {
    /// Resolves a raw claim record against the database overlay.
    pub(crate) fn from_raw(raw: RawClaim, database: &Database) -> Result<Claim> {
        let required_capabilities = database.string_array(raw.required_capabilities)?;

        let mut icon_files = Vec::new();
        for &sid in raw.icon_files.iter() {
            // 0 and 1 mark unused slots.
            if sid == 0 || sid == 1 {
                continue;
            }
            icon_files.push(String::from(database.store().string(sid)?));
        }

        let delegate = String::from(database.store().string(raw.delegate)?);
        if !delegate.is_empty() {
            return Err(Error::DelegateUnsupported);
        }

        let bindings = database
            .bindings()
            .get(&raw.bindings)
            .cloned()
            .ok_or(Error::UnknownBinding)?;

        Ok(Claim {
            claiming_bundle_record: raw.claiming_bundle_record,
            generation: raw.generation,
            flags: ClaimFlags::from_bits_retain(raw.flags),
            rank: raw.rank,
            roles: ClaimRoles::from_bits_retain(raw.roles),
            bundle: raw.bundle,
            localized_names: raw.localized_names,
            required_capabilities,
            icon_files,
            delegate,
            bindings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ClaimFlags, ClaimRoles};

    #[test]
    fn test_flags_preserve_unknown_bits() {
        let flags = ClaimFlags::from_bits_retain(0x8_0021);
        assert!(flags.contains(ClaimFlags::APPLE_DEFAULT));
        assert!(flags.contains(ClaimFlags::DOC_TYPE));
        assert_eq!(flags.bits(), 0x8_0021);
    }

    #[test]
    fn test_roles_preserve_unknown_bits() {
        let roles = ClaimRoles::from_bits_retain(0x402A);
        assert!(roles.contains(ClaimRoles::VIEWER));
        assert!(roles.contains(ClaimRoles::SHELL | ClaimRoles::QLGENERATOR));
        assert_eq!(roles.bits(), 0x402A);
    }
}
