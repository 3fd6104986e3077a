//! # Tempo DB
//!
//! Table-store abstraction and schema migrator for the Tempo sync core.
//!
//! This crate provides:
//! - The [`TableStore`] trait: the interface the (out-of-scope) physical
//!   storage engine presents to the core — typed table scans, upserts, a
//!   schema-version marker, and an all-or-nothing transaction boundary
//! - [`MemoryStore`], an in-memory implementation for tests and ephemeral
//!   sessions
//! - The forward-only [`Migrator`] and the concrete [`MigrateV0ToV1`] step
//!
//! ## Key Invariants
//!
//! - At most one migration step per version increment
//! - Each step is all-or-nothing: the table rewrites and the version bump
//!   commit together or not at all
//! - A failed migration leaves the store at its last good version; callers
//!   must not construct application state on top of it

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod migrate_v0_v1;
mod migration;
mod store;
pub mod v0;

pub use error::{DbError, DbResult};
pub use migrate_v0_v1::MigrateV0ToV1;
pub use migration::{Migration, MigrationReport, Migrator};
pub use store::{MemoryStore, TableRecord, TableStore};

/// The schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

/// Builds the migrator covering every schema version up to
/// [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Fails only if the built-in step set is inconsistent, which would be a
/// bug in this crate.
pub fn migrator<S: TableStore>() -> DbResult<Migrator<S>> {
    let mut migrator = Migrator::new();
    migrator.register(Box::new(MigrateV0ToV1))?;
    migrator.validate()?;
    Ok(migrator)
}
