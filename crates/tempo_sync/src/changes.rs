//! The incremental changes payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tempo_model::{Client, DomainRecord, Project, Tag, Task, TimeEntry, User, Workspace};

/// Everything a changes pull returns: the user plus all related records
/// the server considers changed, and the server's own clock reading for
/// advancing the cursor without trusting the device clock.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRelatedRecords {
    /// The server's "now", echoed back on the next pull as `since`.
    pub server_time: DateTime<Utc>,
    /// The account owner.
    pub user: User,
    /// Changed workspaces.
    pub workspaces: Vec<Workspace>,
    /// Changed clients.
    pub clients: Vec<Client>,
    /// Changed projects.
    pub projects: Vec<Project>,
    /// Changed tasks.
    pub tasks: Vec<Task>,
    /// Changed tags.
    pub tags: Vec<Tag>,
    /// Changed time entries, stamped with the returned user.
    pub time_entries: Vec<TimeEntry>,
}

impl UserRelatedRecords {
    /// Flattens the payload into one heterogeneous merge batch, user
    /// first so reference data lands before the entries pointing at it.
    #[must_use]
    pub fn into_records(self) -> Vec<DomainRecord> {
        let mut records: Vec<DomainRecord> = Vec::new();
        records.push(self.user.into());
        records.extend(self.workspaces.into_iter().map(DomainRecord::from));
        records.extend(self.clients.into_iter().map(DomainRecord::from));
        records.extend(self.projects.into_iter().map(DomainRecord::from));
        records.extend(self.tasks.into_iter().map(DomainRecord::from));
        records.extend(self.tags.into_iter().map(DomainRecord::from));
        records.extend(self.time_entries.into_iter().map(DomainRecord::from));
        records
    }
}

/// Wire shape of the changes response: `{"since": <unix>, "data": {...}}`
/// with the user's own fields inlined next to the related collections.
#[derive(Deserialize)]
pub(crate) struct ChangesEnvelope {
    pub since: i64,
    pub data: ChangesData,
}

#[derive(Deserialize)]
pub(crate) struct ChangesData {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
}
