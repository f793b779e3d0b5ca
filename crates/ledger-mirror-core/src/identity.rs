//! Deterministic document identifiers.
//!
//! Every mirrored document is keyed by an identifier derived purely from its
//! entity kind and natural key, so re-syncing unchanged data overwrites the
//! same documents instead of accumulating duplicates. No lookup table is
//! involved; the mapping is stable across processes and machines.
//!
//! # Construction
//!
//! 1. Build the seed `"{kind_prefix}_{natural_key}"` (e.g. `transaction_t1`).
//! 2. Take the MD5 digest (128 bits) of the seed.
//! 3. Lay the digest out as a UUID, forcing the version nibble to `4`.
//!
//! The forced nibble is a formatting artifact; the value carries none of the
//! randomness a real v4 UUID would.

use std::fmt;
use std::str::FromStr;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::EntityKind;

/// Store-side identifier of a mirrored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(DocumentId)
    }
}

/// Map `(kind, natural_key)` to its document identifier.
pub fn document_id(kind: EntityKind, natural_key: &str) -> DocumentId {
    let seed = format!("{}_{}", kind.key_prefix(), natural_key);
    let digest = Md5::digest(seed.as_bytes());

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;

    DocumentId(Uuid::from_bytes(bytes))
}
