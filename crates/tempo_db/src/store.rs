//! The key-indexed table store.
//!
//! The physical storage engine is out of scope for this crate; hosts bring
//! their own file-backed implementation of [`TableStore`]. The in-memory
//! implementation here backs tests and ephemeral sessions.

use crate::error::{DbError, DbResult};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use tempo_model::{
    Client, LocalId, Project, ProjectUser, SyncRecord, Tag, Task, TimeEntry, User, Workspace,
    WorkspaceUser,
};

/// A row type stored in a named table, keyed by its local id.
pub trait TableRecord: Clone + Send + Sync + 'static {
    /// Name of the table holding rows of this type.
    const TABLE: &'static str;

    /// The row key.
    fn key(&self) -> LocalId;
}

/// A key-indexed relational table store with typed scans and upserts.
///
/// One table per domain type, one `id -> record` row, plus a schema-version
/// marker. All writes from the sync pipeline go through the merge/update
/// path so the in-memory state and the persisted store never diverge by more
/// than the in-flight batch.
pub trait TableStore: Send + Sync {
    /// Current schema version of the store.
    fn version(&self) -> u32;

    /// Sets the schema-version marker.
    fn set_version(&self, version: u32);

    /// Returns every live row of the table for `R`.
    ///
    /// # Errors
    ///
    /// Fails if the table holds rows of a different schema version.
    fn scan<R: TableRecord>(&self) -> DbResult<Vec<R>>;

    /// Looks up a single row by key.
    ///
    /// # Errors
    ///
    /// Fails if the table holds rows of a different schema version.
    fn get<R: TableRecord>(&self, id: LocalId) -> DbResult<Option<R>>;

    /// Inserts or overwrites a row.
    ///
    /// # Errors
    ///
    /// Fails if the table holds rows of a different schema version.
    fn upsert<R: TableRecord>(&self, record: R) -> DbResult<()>;

    /// Removes a row; removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if the table holds rows of a different schema version.
    fn remove<R: TableRecord>(&self, id: LocalId) -> DbResult<()>;

    /// Replaces the whole table for `R` with `rows`.
    ///
    /// # Errors
    ///
    /// Fails if the replacement cannot be applied.
    fn replace_table<R: TableRecord>(&self, rows: Vec<R>) -> DbResult<()>;

    /// Drops a table entirely. Dropping an absent table is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if the drop cannot be applied.
    fn drop_table(&self, table: &'static str) -> DbResult<()>;

    /// Runs `f` as one all-or-nothing unit.
    ///
    /// If `f` returns an error, every change it made to the store
    /// (including the version marker) is rolled back.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    fn apply<F>(&self, f: F) -> DbResult<()>
    where
        F: FnOnce(&Self) -> DbResult<()>,
        Self: Sized;
}

/// Type-erased table contents, cloneable for snapshot/rollback.
trait AnyTable: Send + Sync {
    fn clone_box(&self) -> Box<dyn AnyTable>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedTable<R: TableRecord>(HashMap<LocalId, R>);

impl<R: TableRecord> AnyTable for TypedTable<R> {
    fn clone_box(&self) -> Box<dyn AnyTable> {
        Box::new(TypedTable(self.0.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Inner {
    version: u32,
    tables: HashMap<&'static str, Box<dyn AnyTable>>,
}

impl Inner {
    fn snapshot(&self) -> Inner {
        Inner {
            version: self.version,
            tables: self
                .tables
                .iter()
                .map(|(name, table)| (*name, table.clone_box()))
                .collect(),
        }
    }
}

/// An in-memory table store.
///
/// Thread-safe; suitable for tests and for sessions that do not need
/// persistence. Transactions are implemented by snapshotting the whole
/// table set, which is fine at the data volumes a single user produces.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store at schema version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::with_version(0)
    }

    /// Creates an empty store with a preset schema-version marker.
    #[must_use]
    pub fn with_version(version: u32) -> Self {
        Self {
            inner: RwLock::new(Inner {
                version,
                tables: HashMap::new(),
            }),
        }
    }

    /// Number of rows currently in the table for `R`.
    #[must_use]
    pub fn len<R: TableRecord>(&self) -> usize {
        let inner = self.inner.read();
        inner
            .tables
            .get(R::TABLE)
            .and_then(|t| t.as_any().downcast_ref::<TypedTable<R>>())
            .map_or(0, |t| t.0.len())
    }

    /// Whether the table for `R` has no rows.
    #[must_use]
    pub fn is_empty<R: TableRecord>(&self) -> bool {
        self.len::<R>() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStore for MemoryStore {
    fn version(&self) -> u32 {
        self.inner.read().version
    }

    fn set_version(&self, version: u32) {
        self.inner.write().version = version;
    }

    fn scan<R: TableRecord>(&self) -> DbResult<Vec<R>> {
        let inner = self.inner.read();
        match inner.tables.get(R::TABLE) {
            None => Ok(Vec::new()),
            Some(table) => {
                let table = table
                    .as_any()
                    .downcast_ref::<TypedTable<R>>()
                    .ok_or(DbError::TableType { table: R::TABLE })?;
                Ok(table.0.values().cloned().collect())
            }
        }
    }

    fn get<R: TableRecord>(&self, id: LocalId) -> DbResult<Option<R>> {
        let inner = self.inner.read();
        match inner.tables.get(R::TABLE) {
            None => Ok(None),
            Some(table) => {
                let table = table
                    .as_any()
                    .downcast_ref::<TypedTable<R>>()
                    .ok_or(DbError::TableType { table: R::TABLE })?;
                Ok(table.0.get(&id).cloned())
            }
        }
    }

    fn upsert<R: TableRecord>(&self, record: R) -> DbResult<()> {
        let mut inner = self.inner.write();
        let table = inner
            .tables
            .entry(R::TABLE)
            .or_insert_with(|| Box::new(TypedTable::<R>(HashMap::new())));
        let table = table
            .as_any_mut()
            .downcast_mut::<TypedTable<R>>()
            .ok_or(DbError::TableType { table: R::TABLE })?;
        table.0.insert(record.key(), record);
        Ok(())
    }

    fn remove<R: TableRecord>(&self, id: LocalId) -> DbResult<()> {
        let mut inner = self.inner.write();
        if let Some(table) = inner.tables.get_mut(R::TABLE) {
            let table = table
                .as_any_mut()
                .downcast_mut::<TypedTable<R>>()
                .ok_or(DbError::TableType { table: R::TABLE })?;
            table.0.remove(&id);
        }
        Ok(())
    }

    fn replace_table<R: TableRecord>(&self, rows: Vec<R>) -> DbResult<()> {
        let mut inner = self.inner.write();
        let map: HashMap<LocalId, R> = rows.into_iter().map(|r| (r.key(), r)).collect();
        inner.tables.insert(R::TABLE, Box::new(TypedTable(map)));
        Ok(())
    }

    fn drop_table(&self, table: &'static str) -> DbResult<()> {
        self.inner.write().tables.remove(table);
        Ok(())
    }

    fn apply<F>(&self, f: F) -> DbResult<()>
    where
        F: FnOnce(&Self) -> DbResult<()>,
    {
        let snapshot = self.inner.read().snapshot();
        match f(self) {
            Ok(()) => Ok(()),
            Err(err) => {
                *self.inner.write() = snapshot;
                Err(err)
            }
        }
    }
}

macro_rules! table_record {
    ($type:ty, $table:literal) => {
        impl TableRecord for $type {
            const TABLE: &'static str = $table;

            fn key(&self) -> LocalId {
                SyncRecord::id(self)
            }
        }
    };
}

table_record!(Workspace, "workspaces");
table_record!(Client, "clients");
table_record!(Project, "projects");
table_record!(Task, "tasks");
table_record!(Tag, "tags");
table_record!(TimeEntry, "time_entries");
table_record!(User, "users");
table_record!(WorkspaceUser, "workspace_users");
table_record!(ProjectUser, "project_users");

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempo_model::Common;

    fn workspace(name: &str) -> Workspace {
        Workspace {
            common: Common::new(Utc::now()),
            name: name.into(),
            is_admin: false,
            is_premium: false,
        }
    }

    #[test]
    fn upsert_and_scan() {
        let store = MemoryStore::new();
        let w = workspace("alpha");
        let id = w.key();
        store.upsert(w.clone()).unwrap();

        let all: Vec<Workspace> = store.scan().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(store.get::<Workspace>(id).unwrap().unwrap().name, "alpha");
    }

    #[test]
    fn upsert_overwrites_same_key() {
        let store = MemoryStore::new();
        let mut w = workspace("before");
        store.upsert(w.clone()).unwrap();
        w.name = "after".into();
        store.upsert(w.clone()).unwrap();

        assert_eq!(store.len::<Workspace>(), 1);
        assert_eq!(
            store.get::<Workspace>(w.key()).unwrap().unwrap().name,
            "after"
        );
    }

    #[test]
    fn remove_absent_key_is_noop() {
        let store = MemoryStore::new();
        store.remove::<Workspace>(LocalId::generate()).unwrap();
        assert!(store.is_empty::<Workspace>());
    }

    #[test]
    fn apply_rolls_back_on_error() {
        let store = MemoryStore::new();
        store.upsert(workspace("kept")).unwrap();

        let result = store.apply(|s| {
            s.upsert(workspace("discarded"))?;
            s.set_version(9);
            Err(DbError::MissingStep { version: 9 })
        });

        assert!(result.is_err());
        assert_eq!(store.len::<Workspace>(), 1);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn apply_commits_on_success() {
        let store = MemoryStore::new();
        store
            .apply(|s| {
                s.upsert(workspace("committed"))?;
                s.set_version(1);
                Ok(())
            })
            .unwrap();

        assert_eq!(store.len::<Workspace>(), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn version_marker_round_trips() {
        let store = MemoryStore::with_version(3);
        assert_eq!(store.version(), 3);
        store.set_version(4);
        assert_eq!(store.version(), 4);
    }
}
