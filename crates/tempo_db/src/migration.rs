//! Forward-only schema migration.
//!
//! Migrations upgrade a versioned store one step at a time:
//! `version(db) = V -> migrate(V, V+1) -> ... -> V_target`. Each step is a
//! total function over the complete table set, runs inside one all-or-nothing
//! transaction, and either commits (advancing the version marker) or leaves
//! the store untouched. Migration runs once, synchronously, before the state
//! store is first constructed.

use crate::error::{DbError, DbResult};
use crate::store::TableStore;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A single schema upgrade step.
pub trait Migration<S: TableStore>: Send + Sync {
    /// Schema version this step upgrades from (to `from_version() + 1`).
    fn from_version(&self) -> u32;

    /// Human-readable step name for diagnostics.
    fn name(&self) -> &str;

    /// Transforms the complete v`N` table set into the v`N + 1` table set.
    ///
    /// Runs inside a transaction; partial work is rolled back on error.
    /// Implementations must preserve all non-structural fields exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the old table set cannot be transformed, e.g.
    /// on dangling references the new schema cannot represent.
    fn up(&self, store: &S) -> DbResult<()>;
}

/// Outcome of a migration run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// `(from_version, step name)` for every step that was applied.
    pub applied: Vec<(u32, String)>,
    /// Schema version after the run.
    pub final_version: u32,
}

/// Registry and runner for migration steps.
///
/// Steps are keyed by the version they upgrade from; at most one step per
/// version increment. The runner stops at the first failure and reports it
/// as [`DbError::MigrationFailure`]; callers must not construct application
/// state against a store whose migration did not complete.
pub struct Migrator<S: TableStore> {
    steps: BTreeMap<u32, Box<dyn Migration<S>>>,
}

impl<S: TableStore> Migrator<S> {
    /// Creates an empty migrator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Registers a step.
    ///
    /// # Errors
    ///
    /// Fails if a step from the same version is already registered.
    pub fn register(&mut self, step: Box<dyn Migration<S>>) -> DbResult<()> {
        let version = step.from_version();
        if self.steps.contains_key(&version) {
            return Err(DbError::DuplicateStep { version });
        }
        self.steps.insert(version, step);
        Ok(())
    }

    /// The newest schema version this migrator can produce.
    #[must_use]
    pub fn target_version(&self) -> u32 {
        self.steps
            .keys()
            .next_back()
            .map_or(0, |&version| version + 1)
    }

    /// Validates that registered steps form a contiguous chain.
    ///
    /// # Errors
    ///
    /// Fails if there is a gap between two registered steps.
    pub fn validate(&self) -> DbResult<()> {
        let mut expected = match self.steps.keys().next() {
            Some(&first) => first,
            None => return Ok(()),
        };
        for &version in self.steps.keys() {
            if version != expected {
                return Err(DbError::MissingStep { version: expected });
            }
            expected = version + 1;
        }
        Ok(())
    }

    /// Upgrades `store` to [`target_version`](Self::target_version).
    ///
    /// Already-current stores are a no-op. Each step runs in its own
    /// transaction; the version marker advances together with the step's
    /// table rewrites or not at all.
    ///
    /// # Errors
    ///
    /// - [`DbError::VersionTooNew`] if the store is ahead of this build
    /// - [`DbError::MissingStep`] if no step covers the current version
    /// - [`DbError::MigrationFailure`] wrapping the first failing step
    pub fn migrate(&self, store: &S) -> DbResult<MigrationReport> {
        let target = self.target_version();
        let found = store.version();
        if found > target {
            return Err(DbError::VersionTooNew {
                found,
                supported: target,
            });
        }

        let mut applied = Vec::new();
        while store.version() < target {
            let version = store.version();
            let step = self
                .steps
                .get(&version)
                .ok_or(DbError::MissingStep { version })?;

            info!(version, step = step.name(), "running migration step");
            let result = store.apply(|s| {
                step.up(s)?;
                s.set_version(version + 1);
                Ok(())
            });

            if let Err(err) = result {
                warn!(version, step = step.name(), %err, "migration step failed");
                return Err(DbError::MigrationFailure {
                    version,
                    name: step.name().to_string(),
                    message: err.to_string(),
                });
            }
            applied.push((version, step.name().to_string()));
        }

        Ok(MigrationReport {
            applied,
            final_version: store.version(),
        })
    }
}

impl<S: TableStore> Default for Migrator<S> {
    fn default() -> Self {
        Self::new()
    }
}
