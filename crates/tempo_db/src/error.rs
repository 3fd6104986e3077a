//! Error types for the table store and migrator.

use thiserror::Error;

/// Result type for store and migration operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in the local store layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// A table exists but holds rows of a different type.
    ///
    /// This happens when a caller scans a table with a record type from the
    /// wrong schema version, e.g. reading v1 rows out of an unmigrated store.
    #[error("table {table} holds rows of a different schema version")]
    TableType {
        /// Name of the table.
        table: &'static str,
    },

    /// A migration step did not complete.
    ///
    /// The store is rolled back to its pre-step state; callers must not
    /// construct application state until migration succeeds.
    #[error("migration {name} (v{version} -> v{}) failed: {message}", .version + 1)]
    MigrationFailure {
        /// Schema version the step upgrades from.
        version: u32,
        /// Name of the failing step.
        name: String,
        /// What went wrong.
        message: String,
    },

    /// No registered step upgrades from the store's current version.
    #[error("no migration step registered from schema version {version}")]
    MissingStep {
        /// The version with no outgoing step.
        version: u32,
    },

    /// Two steps were registered for the same source version.
    #[error("migration step from version {version} already registered")]
    DuplicateStep {
        /// The duplicated source version.
        version: u32,
    },

    /// The store reports a schema version newer than this build understands.
    #[error("store schema version {found} is newer than supported version {supported}")]
    VersionTooNew {
        /// Version found in the store.
        found: u32,
        /// Newest version this build can open.
        supported: u32,
    },
}
