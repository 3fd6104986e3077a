//! Identifier types for domain records.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Locally-generated, collision-free identifier for a domain record.
///
/// Local ids are assigned when a record is first created on this device and
/// are never reassigned, so offline-created graphs of records stay internally
/// consistent before any of them have been synced. All foreign keys between
/// records are expressed in local ids, never in [`RemoteId`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(Uuid);

impl LocalId {
    /// Creates a fresh, random local id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil id, used as an "unset" sentinel in draft records.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns true if this is the nil sentinel.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for LocalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::nil()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned numeric identifier.
///
/// Remote ids only exist after a record has been successfully created on the
/// server; a record with `remote_id == None` is local-only.
pub type RemoteId = i64;
