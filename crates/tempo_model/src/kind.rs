//! The closed set of domain record kinds.

use std::fmt;

/// Tag identifying one of the known domain record types.
///
/// The sync client dispatches on this closed set instead of comparing
/// runtime types; operations on kinds that a given endpoint does not
/// support fail with `NotSupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A workspace.
    Workspace,
    /// A client (in the billing sense, not the network sense).
    Client,
    /// A project inside a workspace, optionally attached to a client.
    Project,
    /// A task inside a project.
    Task,
    /// A tag, scoped to a workspace.
    Tag,
    /// A time entry.
    TimeEntry,
    /// The account owner.
    User,
    /// A workspace membership row.
    WorkspaceUser,
    /// A project membership row.
    ProjectUser,
}

/// Remote operations a record kind may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    /// POST to the collection endpoint.
    Create,
    /// GET a single record.
    Read,
    /// GET the whole collection.
    List,
    /// PUT a single record.
    Update,
    /// DELETE by remote id (single or comma-joined bulk).
    Delete,
}

impl RecordKind {
    /// The field name wrapping this record in request bodies,
    /// e.g. `{"time_entry": {...}}`.
    #[must_use]
    pub const fn wire_key(self) -> &'static str {
        match self {
            RecordKind::Workspace => "workspace",
            RecordKind::Client => "client",
            RecordKind::Project => "project",
            RecordKind::Task => "task",
            RecordKind::Tag => "tag",
            RecordKind::TimeEntry => "time_entry",
            RecordKind::User => "user",
            RecordKind::WorkspaceUser => "workspace_user",
            RecordKind::ProjectUser => "project_user",
        }
    }

    /// The resource collection path under the versioned API base.
    ///
    /// Users are special-cased by the client (`signups` for create,
    /// `me` for read/update); this is the path for every other verb.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            RecordKind::Workspace => "workspaces",
            RecordKind::Client => "clients",
            RecordKind::Project => "projects",
            RecordKind::Task => "tasks",
            RecordKind::Tag => "tags",
            RecordKind::TimeEntry => "time_entries",
            RecordKind::User => "me",
            RecordKind::WorkspaceUser => "workspace_users",
            RecordKind::ProjectUser => "project_users",
        }
    }

    /// Whether the remote API supports `op` for this kind.
    ///
    /// Mirrors the server surface: workspaces and users cannot be deleted,
    /// membership rows are maintained server-side, and only clients,
    /// workspaces and time entries have a plain list endpoint.
    #[must_use]
    pub const fn supports(self, op: RemoteOp) -> bool {
        match op {
            RemoteOp::Create => !matches!(
                self,
                RecordKind::Tag | RecordKind::WorkspaceUser | RecordKind::ProjectUser
            ),
            RemoteOp::Read | RemoteOp::Update => !matches!(
                self,
                RecordKind::Tag | RecordKind::WorkspaceUser | RecordKind::ProjectUser
            ),
            RemoteOp::List => matches!(
                self,
                RecordKind::Client | RecordKind::Workspace | RecordKind::TimeEntry
            ),
            RemoteOp::Delete => matches!(
                self,
                RecordKind::Client | RecordKind::Project | RecordKind::Task | RecordKind::TimeEntry
            ),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}
