//! Typed identifiers.
//!
//! A [`ResourceId`] keys every stored entity. A [`ClientId`] is the public
//! half of an API-key credential. Both wrap a v4 UUID and serialize as its
//! hyphenated string, but they cannot be mixed up at compile time.
//!
//! ```
//! use provisio_core::{ClientId, ResourceId};
//!
//! let id = ResourceId::new();
//! assert_eq!(id.to_string().parse::<ResourceId>(), Ok(id));
//! assert!("not-a-uuid".parse::<ClientId>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An identifier string that is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{input}': {source}")]
pub struct ParseIdError {
    pub kind: &'static str,
    pub input: String,
    #[source]
    pub source: uuid::Error,
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Big-endian UUID bytes; stable input for digests.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let trimmed = raw.trim();
                Uuid::try_parse(trimmed).map(Self).map_err(|source| ParseIdError {
                    kind: $kind,
                    input: trimmed.to_string(),
                    source,
                })
            }
        }
    };
}

typed_id!(
    /// Storage key of a user, group, credential or client.
    ResourceId,
    "resource id"
);

typed_id!(
    /// Public identifier of an API-key credential. Part of its digest, so
    /// never patchable.
    ClientId,
    "client id"
);
