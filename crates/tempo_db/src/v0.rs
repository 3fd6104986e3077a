//! Row types of the legacy v0 schema.
//!
//! V0 predates denormalized remote foreign keys: rows only reference each
//! other through local ids, and time entries are joined to tags through a
//! separate association table. [`crate::MigrateV0ToV1`] rewrites these rows
//! into the current schema.

use crate::store::TableRecord;
use chrono::{DateTime, Utc};
use tempo_model::{LocalId, RemoteId};

/// V0 workspace row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct WorkspaceRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub is_admin: bool,
    pub is_premium: bool,
}

/// V0 client row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct ClientRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub workspace_id: LocalId,
}

/// V0 project row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct ProjectRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub color: i32,
    pub is_active: bool,
    pub is_private: bool,
    pub workspace_id: LocalId,
    pub client_id: Option<LocalId>,
}

/// V0 task row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct TaskRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub is_active: bool,
    pub estimated_seconds: i64,
    pub workspace_id: LocalId,
    pub project_id: LocalId,
}

/// V0 tag row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct TagRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub workspace_id: LocalId,
}

/// V0 time entry row. Tags live in [`TimeEntryTagRow`].
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct TimeEntryRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    pub duration_only: bool,
    pub created_with: String,
    pub user_id: LocalId,
    pub workspace_id: LocalId,
    pub project_id: Option<LocalId>,
    pub task_id: Option<LocalId>,
}

/// V0 user row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct UserRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub email: String,
    pub start_of_week: u8,
    pub locale: String,
    pub default_workspace_id: LocalId,
}

/// V0 workspace membership row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct WorkspaceUserRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub workspace_id: LocalId,
    pub user_id: LocalId,
}

/// V0 project membership row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct ProjectUserRow {
    pub id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_manager: bool,
    pub project_id: LocalId,
    pub user_id: LocalId,
}

/// V0 time-entry-to-tag association row.
#[derive(Debug, Clone, PartialEq, Default)]
#[allow(missing_docs)]
pub struct TimeEntryTagRow {
    pub id: LocalId,
    pub time_entry_id: LocalId,
    pub tag_id: LocalId,
}

macro_rules! v0_table {
    ($type:ty, $table:literal) => {
        impl TableRecord for $type {
            const TABLE: &'static str = $table;

            fn key(&self) -> LocalId {
                self.id
            }
        }
    };
}

v0_table!(WorkspaceRow, "workspaces");
v0_table!(ClientRow, "clients");
v0_table!(ProjectRow, "projects");
v0_table!(TaskRow, "tasks");
v0_table!(TagRow, "tags");
v0_table!(TimeEntryRow, "time_entries");
v0_table!(UserRow, "users");
v0_table!(WorkspaceUserRow, "workspace_users");
v0_table!(ProjectUserRow, "project_users");
v0_table!(TimeEntryTagRow, "time_entry_tags");
