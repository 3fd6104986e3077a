//! The record capability trait and the closed union over all record kinds.

use crate::ids::{LocalId, RemoteId};
use crate::kind::RecordKind;
use crate::records::{
    Client, Common, Project, ProjectUser, Tag, Task, TimeEntry, User, Workspace, WorkspaceUser,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Capabilities every syncable domain record implements.
///
/// The sync client is generic over this trait; there is no runtime type
/// inspection anywhere. Wire serialization drops all local-only fields
/// (`id` and the local halves of foreign keys), so [`merge_remote`] has to
/// restore them when adopting a server representation.
///
/// [`merge_remote`]: SyncRecord::merge_remote
pub trait SyncRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Which member of the closed kind set this type is.
    const KIND: RecordKind;

    /// Shared identity fields.
    fn common(&self) -> &Common;

    /// Shared identity fields, mutably.
    fn common_mut(&mut self) -> &mut Common;

    /// Copies the local-only fields (local foreign keys, device-local
    /// preferences) from `local` into `self`. The local id itself is
    /// handled by [`merge_remote`](SyncRecord::merge_remote).
    fn keep_local_fields(&mut self, local: &Self);

    /// Stable local identifier.
    fn id(&self) -> LocalId {
        self.common().id
    }

    /// Server-assigned identifier, if any.
    fn remote_id(&self) -> Option<RemoteId> {
        self.common().remote_id
    }

    /// Last modification time.
    fn modified_at(&self) -> DateTime<Utc> {
        self.common().modified_at
    }

    /// Tombstone marker.
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.common().deleted_at
    }

    /// Merges a server representation of this record into the local one.
    ///
    /// Local edits made after the request was issued win over the stale
    /// server echo: the server copy is adopted only when it is at least as
    /// new as the local record. The remote id is adopted unconditionally
    /// when the local record does not have one yet, so a create that races
    /// a local edit still links the record to its server identity.
    fn merge_remote(&mut self, mut server: Self) {
        if self.common().remote_id.is_none() {
            self.common_mut().remote_id = server.common().remote_id;
        }
        if server.common().modified_at < self.common().modified_at {
            // Stale echo of a pre-edit state; the local record moved on.
            return;
        }
        if server.common().remote_id.is_none() {
            server.common_mut().remote_id = self.common().remote_id;
        }
        server.common_mut().id = self.common().id;
        let local = self.clone();
        server.keep_local_fields(&local);
        *self = server;
    }
}

impl SyncRecord for Workspace {
    const KIND: RecordKind = RecordKind::Workspace;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, _local: &Self) {}
}

impl SyncRecord for Client {
    const KIND: RecordKind = RecordKind::Client;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.workspace_id = local.workspace_id;
    }
}

impl SyncRecord for Project {
    const KIND: RecordKind = RecordKind::Project;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.workspace_id = local.workspace_id;
        self.client_id = local.client_id;
    }
}

impl SyncRecord for Task {
    const KIND: RecordKind = RecordKind::Task;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.workspace_id = local.workspace_id;
        self.project_id = local.project_id;
    }
}

impl SyncRecord for Tag {
    const KIND: RecordKind = RecordKind::Tag;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.workspace_id = local.workspace_id;
    }
}

impl SyncRecord for TimeEntry {
    const KIND: RecordKind = RecordKind::TimeEntry;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.state = local.state;
        self.user_id = local.user_id;
        self.workspace_id = local.workspace_id;
        self.project_id = local.project_id;
        self.task_id = local.task_id;
    }
}

impl SyncRecord for User {
    const KIND: RecordKind = RecordKind::User;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.tracking_mode = local.tracking_mode;
        self.default_workspace_id = local.default_workspace_id;
    }
}

impl SyncRecord for WorkspaceUser {
    const KIND: RecordKind = RecordKind::WorkspaceUser;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.workspace_id = local.workspace_id;
        self.user_id = local.user_id;
    }
}

impl SyncRecord for ProjectUser {
    const KIND: RecordKind = RecordKind::ProjectUser;

    fn common(&self) -> &Common {
        &self.common
    }

    fn common_mut(&mut self) -> &mut Common {
        &mut self.common
    }

    fn keep_local_fields(&mut self, local: &Self) {
        self.project_id = local.project_id;
        self.user_id = local.user_id;
    }
}

/// A domain record of any kind.
///
/// Merge batches fed to the state store are heterogeneous (a single server
/// changes response touches several tables at once); this closed union lets
/// them travel through one channel without erased types.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DomainRecord {
    Workspace(Workspace),
    Client(Client),
    Project(Project),
    Task(Task),
    Tag(Tag),
    TimeEntry(TimeEntry),
    User(User),
    WorkspaceUser(WorkspaceUser),
    ProjectUser(ProjectUser),
}

impl DomainRecord {
    /// Which kind this record is.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            DomainRecord::Workspace(_) => RecordKind::Workspace,
            DomainRecord::Client(_) => RecordKind::Client,
            DomainRecord::Project(_) => RecordKind::Project,
            DomainRecord::Task(_) => RecordKind::Task,
            DomainRecord::Tag(_) => RecordKind::Tag,
            DomainRecord::TimeEntry(_) => RecordKind::TimeEntry,
            DomainRecord::User(_) => RecordKind::User,
            DomainRecord::WorkspaceUser(_) => RecordKind::WorkspaceUser,
            DomainRecord::ProjectUser(_) => RecordKind::ProjectUser,
        }
    }

    /// Stable local identifier of the wrapped record.
    #[must_use]
    pub fn id(&self) -> LocalId {
        match self {
            DomainRecord::Workspace(r) => r.id(),
            DomainRecord::Client(r) => r.id(),
            DomainRecord::Project(r) => r.id(),
            DomainRecord::Task(r) => r.id(),
            DomainRecord::Tag(r) => r.id(),
            DomainRecord::TimeEntry(r) => r.id(),
            DomainRecord::User(r) => r.id(),
            DomainRecord::WorkspaceUser(r) => r.id(),
            DomainRecord::ProjectUser(r) => r.id(),
        }
    }

    /// Tombstone marker of the wrapped record.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            DomainRecord::Workspace(r) => r.deleted_at(),
            DomainRecord::Client(r) => r.deleted_at(),
            DomainRecord::Project(r) => r.deleted_at(),
            DomainRecord::Task(r) => r.deleted_at(),
            DomainRecord::Tag(r) => r.deleted_at(),
            DomainRecord::TimeEntry(r) => r.deleted_at(),
            DomainRecord::User(r) => r.deleted_at(),
            DomainRecord::WorkspaceUser(r) => r.deleted_at(),
            DomainRecord::ProjectUser(r) => r.deleted_at(),
        }
    }
}

impl From<Workspace> for DomainRecord {
    fn from(r: Workspace) -> Self {
        DomainRecord::Workspace(r)
    }
}

impl From<Client> for DomainRecord {
    fn from(r: Client) -> Self {
        DomainRecord::Client(r)
    }
}

impl From<Project> for DomainRecord {
    fn from(r: Project) -> Self {
        DomainRecord::Project(r)
    }
}

impl From<Task> for DomainRecord {
    fn from(r: Task) -> Self {
        DomainRecord::Task(r)
    }
}

impl From<Tag> for DomainRecord {
    fn from(r: Tag) -> Self {
        DomainRecord::Tag(r)
    }
}

impl From<TimeEntry> for DomainRecord {
    fn from(r: TimeEntry) -> Self {
        DomainRecord::TimeEntry(r)
    }
}

impl From<User> for DomainRecord {
    fn from(r: User) -> Self {
        DomainRecord::User(r)
    }
}

impl From<WorkspaceUser> for DomainRecord {
    fn from(r: WorkspaceUser) -> Self {
        DomainRecord::WorkspaceUser(r)
    }
}

impl From<ProjectUser> for DomainRecord {
    fn from(r: ProjectUser) -> Self {
        DomainRecord::ProjectUser(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn client_at(modified_at: DateTime<Utc>) -> Client {
        Client {
            common: Common {
                id: LocalId::generate(),
                remote_id: None,
                modified_at,
                deleted_at: None,
            },
            name: "acme".into(),
            workspace_id: LocalId::generate(),
            workspace_remote_id: Some(42),
        }
    }

    #[test]
    fn merge_adopts_newer_server_copy() {
        let t0 = Utc::now();
        let mut local = client_at(t0);
        let local_id = local.id();
        let workspace_id = local.workspace_id;

        let mut server: Client = serde_json::from_str(
            r#"{"id": 999, "name": "acme worldwide", "wid": 42}"#,
        )
        .unwrap();
        server.common.modified_at = t0 + Duration::seconds(5);

        local.merge_remote(server);
        assert_eq!(local.remote_id(), Some(999));
        assert_eq!(local.name, "acme worldwide");
        // Local linkage survives the overwrite.
        assert_eq!(local.id(), local_id);
        assert_eq!(local.workspace_id, workspace_id);
    }

    #[test]
    fn merge_keeps_pending_local_edits() {
        let t0 = Utc::now();
        let mut local = client_at(t0 + Duration::seconds(10));
        local.name = "edited while request was in flight".into();

        let mut server = client_at(t0);
        server.common.remote_id = Some(999);
        server.name = "stale echo".into();

        local.merge_remote(server);
        // The edit wins but the server identity is still linked.
        assert_eq!(local.name, "edited while request was in flight");
        assert_eq!(local.remote_id(), Some(999));
    }

    #[test]
    fn domain_record_reports_kind_and_id() {
        let entry = TimeEntry {
            common: Common::new(Utc::now()),
            ..TimeEntry::default()
        };
        let id = entry.id();
        let record: DomainRecord = entry.into();
        assert_eq!(record.kind(), RecordKind::TimeEntry);
        assert_eq!(record.id(), id);
        assert!(record.deleted_at().is_none());
    }
}
