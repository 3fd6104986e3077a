//! The domain record types.
//!
//! Every record carries the shared identity fields in [`Common`] plus its own
//! payload. Foreign keys come in pairs: the local id (authoritative, never on
//! the wire) and the denormalized server id (what the remote API understands).
//! The remote halves are refreshed by the sync client as referenced records
//! acquire their server ids.

use crate::ids::{LocalId, RemoteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// Identity and lifecycle fields shared by every domain record.
///
/// `deleted_at != None` marks a tombstone: the record is logically deleted
/// but kept around until the deletion has propagated to the server and the
/// storage layer compacts it away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Common {
    /// Stable, locally-generated identifier. Never sent to the server.
    #[serde(skip)]
    pub id: LocalId,
    /// Server-assigned identifier; `None` until the first successful create.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    /// Last modification time.
    #[serde(rename = "at", default = "epoch")]
    pub modified_at: DateTime<Utc>,
    /// Tombstone marker.
    #[serde(
        rename = "server_deleted_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Common {
    /// Creates identity fields for a freshly created local record.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: LocalId::generate(),
            remote_id: None,
            modified_at: now,
            deleted_at: None,
        }
    }
}

impl Default for Common {
    fn default() -> Self {
        Self {
            id: LocalId::nil(),
            remote_id: None,
            modified_at: epoch(),
            deleted_at: None,
        }
    }
}

/// A workspace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workspace {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Workspace name.
    #[serde(default)]
    pub name: String,
    /// Whether the current user administers this workspace.
    #[serde(rename = "admin", default)]
    pub is_admin: bool,
    /// Whether this is a paid workspace.
    #[serde(rename = "premium", default)]
    pub is_premium: bool,
}

impl Workspace {
    /// The first-run workspace created before the user ever signs in.
    #[must_use]
    pub fn draft(now: DateTime<Utc>) -> Self {
        Self {
            common: Common::new(now),
            name: "My first workspace".into(),
            is_admin: true,
            is_premium: false,
        }
    }
}

/// A client, in the billing sense.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Client {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Client name.
    #[serde(default)]
    pub name: String,
    /// Owning workspace (local id).
    #[serde(skip)]
    pub workspace_id: LocalId,
    /// Owning workspace as the server knows it.
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_remote_id: Option<RemoteId>,
}

/// A project inside a workspace, optionally attached to a client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Project name.
    #[serde(default)]
    pub name: String,
    /// Display color index; `-1` means unset.
    #[serde(default)]
    pub color: i32,
    /// Whether the project is still active.
    #[serde(rename = "active", default)]
    pub is_active: bool,
    /// Whether the project is visible to the whole workspace.
    #[serde(default)]
    pub is_private: bool,
    /// Owning workspace (local id).
    #[serde(skip)]
    pub workspace_id: LocalId,
    /// Owning workspace as the server knows it.
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_remote_id: Option<RemoteId>,
    /// Attached client, if any (local id).
    #[serde(skip)]
    pub client_id: Option<LocalId>,
    /// Attached client as the server knows it.
    #[serde(rename = "cid", default, skip_serializing_if = "Option::is_none")]
    pub client_remote_id: Option<RemoteId>,
}

/// A task inside a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Task name.
    #[serde(default)]
    pub name: String,
    /// Whether the task is still active.
    #[serde(rename = "active", default)]
    pub is_active: bool,
    /// Estimated duration in seconds; `0` means no estimate.
    #[serde(default)]
    pub estimated_seconds: i64,
    /// Owning workspace (local id).
    #[serde(skip)]
    pub workspace_id: LocalId,
    /// Owning workspace as the server knows it.
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_remote_id: Option<RemoteId>,
    /// Owning project (local id).
    #[serde(skip)]
    pub project_id: LocalId,
    /// Owning project as the server knows it.
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub project_remote_id: Option<RemoteId>,
}

/// A tag, scoped to a workspace. Tag names are unique per workspace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tag {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Tag name.
    #[serde(default)]
    pub name: String,
    /// Owning workspace (local id).
    #[serde(skip)]
    pub workspace_id: LocalId,
    /// Owning workspace as the server knows it.
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_remote_id: Option<RemoteId>,
}

/// Lifecycle state of a time entry on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeEntryState {
    /// Draft, never started.
    #[default]
    New,
    /// Currently running.
    Running,
    /// Stopped.
    Finished,
}

/// A tracked interval of time.
///
/// Time entries reference their tags by name; the names are resolved against
/// the workspace's tag table when display info is built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Local lifecycle state; derived from `stop_time` on the wire.
    #[serde(skip)]
    pub state: TimeEntryState,
    /// When tracking started.
    #[serde(rename = "start", default = "epoch")]
    pub start_time: DateTime<Utc>,
    /// When tracking stopped; `None` while running.
    #[serde(rename = "stop", default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<DateTime<Utc>>,
    /// Track only durations, not start/stop wall-clock times.
    #[serde(rename = "duronly", default)]
    pub duration_only: bool,
    /// Client identifier string stamped on entries created by this app.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_with: String,
    /// Names of the attached tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Owning user (local id).
    #[serde(skip)]
    pub user_id: LocalId,
    /// Owning user as the server knows it.
    #[serde(rename = "uid", default, skip_serializing_if = "Option::is_none")]
    pub user_remote_id: Option<RemoteId>,
    /// Owning workspace (local id).
    #[serde(skip)]
    pub workspace_id: LocalId,
    /// Owning workspace as the server knows it.
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_remote_id: Option<RemoteId>,
    /// Attached project, if any (local id).
    #[serde(skip)]
    pub project_id: Option<LocalId>,
    /// Attached project as the server knows it.
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub project_remote_id: Option<RemoteId>,
    /// Attached task, if any (local id).
    #[serde(skip)]
    pub task_id: Option<LocalId>,
    /// Attached task as the server knows it.
    #[serde(rename = "tid", default, skip_serializing_if = "Option::is_none")]
    pub task_remote_id: Option<RemoteId>,
}

impl TimeEntry {
    /// Creates a draft entry in the user's default workspace.
    #[must_use]
    pub fn draft(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            common: Common::new(now),
            start_time: now,
            duration_only: user.tracking_mode == TrackingMode::Continue,
            user_id: user.common.id,
            user_remote_id: user.common.remote_id,
            workspace_id: user.default_workspace_id,
            workspace_remote_id: user.default_workspace_remote_id,
            ..Self::default()
        }
    }
}

/// How new entries are started for this user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
    /// Start a fresh entry with wall-clock times.
    #[default]
    StartNew,
    /// Continue entries, tracking only durations.
    Continue,
}

/// The account owner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Full name.
    #[serde(rename = "fullname", default)]
    pub name: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// First day of the week, 0 = Sunday.
    #[serde(rename = "beginning_of_week", default)]
    pub start_of_week: u8,
    /// BCP-47 locale tag.
    #[serde(default)]
    pub locale: String,
    /// How new entries are started; local preference.
    #[serde(skip)]
    pub tracking_mode: TrackingMode,
    /// Default workspace for new entries (local id).
    #[serde(skip)]
    pub default_workspace_id: LocalId,
    /// Default workspace as the server knows it.
    #[serde(
        rename = "default_wid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_workspace_remote_id: Option<RemoteId>,
}

impl User {
    /// A placeholder user for first-run offline use, owning `workspace_id`.
    #[must_use]
    pub fn draft(workspace_id: LocalId, now: DateTime<Utc>) -> Self {
        Self {
            common: Common::new(now),
            name: "New user".into(),
            email: String::new(),
            start_of_week: 1,
            locale: "en_US".into(),
            tracking_mode: TrackingMode::StartNew,
            default_workspace_id: workspace_id,
            default_workspace_remote_id: None,
        }
    }
}

/// Membership of a user in a workspace.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkspaceUser {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Whether the member administers the workspace.
    #[serde(rename = "admin", default)]
    pub is_admin: bool,
    /// The workspace (local id).
    #[serde(skip)]
    pub workspace_id: LocalId,
    /// The workspace as the server knows it.
    #[serde(rename = "wid", default, skip_serializing_if = "Option::is_none")]
    pub workspace_remote_id: Option<RemoteId>,
    /// The member (local id).
    #[serde(skip)]
    pub user_id: LocalId,
    /// The member as the server knows it.
    #[serde(rename = "uid", default, skip_serializing_if = "Option::is_none")]
    pub user_remote_id: Option<RemoteId>,
}

/// Membership of a user in a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectUser {
    /// Identity fields.
    #[serde(flatten)]
    pub common: Common,
    /// Whether the member manages the project.
    #[serde(rename = "manager", default)]
    pub is_manager: bool,
    /// The project (local id).
    #[serde(skip)]
    pub project_id: LocalId,
    /// The project as the server knows it.
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub project_remote_id: Option<RemoteId>,
    /// The member (local id).
    #[serde(skip)]
    pub user_id: LocalId,
    /// The member as the server knows it.
    #[serde(rename = "uid", default, skip_serializing_if = "Option::is_none")]
    pub user_remote_id: Option<RemoteId>,
}
