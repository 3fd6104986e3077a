//! The immutable application state aggregate.
//!
//! `AppState` is a value: reducers take the current snapshot and return a
//! new one, and every collection inside is an [`im::HashMap`] so snapshots
//! share structure instead of deep-copying. Nothing in this module performs
//! I/O; loading from storage happens once in [`AppState::init`] and
//! everything afterwards flows through merge batches.

use chrono::{DateTime, Utc};
use im::HashMap;
use std::hash::{Hash, Hasher};
use tempo_db::{DbResult, TableStore};
use tempo_model::{
    Client, DomainRecord, LocalId, Project, ProjectUser, SyncRecord, Tag, Task, TimeEntry, User,
    Workspace, WorkspaceUser,
};

use crate::request_info::RequestInfo;
use crate::settings::Settings;

/// Denormalized display data for one time entry.
///
/// Rebuilt from the reference tables whenever the entry or anything it
/// points at is merged, so it never goes stale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryInfo {
    /// The entry's workspace, or a default value when unresolved.
    pub workspace: Workspace,
    /// The entry's project, if it has one that resolves.
    pub project: Option<Project>,
    /// The project's client, if any.
    pub client: Option<Client>,
    /// The entry's task, if it has one that resolves.
    pub task: Option<Task>,
    /// Tag records resolved by name within the entry's workspace. Names
    /// that do not resolve are simply absent here.
    pub tags: Vec<Tag>,
    /// The project's display color, or `-1` without a project.
    pub color: i32,
}

/// A time entry together with its denormalized display info.
///
/// Equality and hashing consider only `(id, modified_at, deleted_at)` so
/// view diffing can tell "same revision" apart from "changed" without
/// comparing payloads.
#[derive(Debug, Clone)]
pub struct RichTimeEntry {
    /// The entry itself.
    pub data: TimeEntry,
    /// Display info derived from the reference tables.
    pub info: EntryInfo,
}

impl PartialEq for RichTimeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.data.common.id == other.data.common.id
            && self.data.common.modified_at == other.data.common.modified_at
            && self.data.common.deleted_at == other.data.common.deleted_at
    }
}

impl Eq for RichTimeEntry {}

impl Hash for RichTimeEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.common.id.hash(state);
        self.data.common.modified_at.hash(state);
        self.data.common.deleted_at.hash(state);
    }
}

/// One immutable snapshot of everything the app knows.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// The account owner.
    pub user: User,
    /// All live workspaces by local id.
    pub workspaces: HashMap<LocalId, Workspace>,
    /// All live clients by local id.
    pub clients: HashMap<LocalId, Client>,
    /// All live projects by local id.
    pub projects: HashMap<LocalId, Project>,
    /// All live tasks by local id.
    pub tasks: HashMap<LocalId, Task>,
    /// All live tags by local id.
    pub tags: HashMap<LocalId, Tag>,
    /// All live workspace memberships by local id.
    pub workspace_users: HashMap<LocalId, WorkspaceUser>,
    /// All live project memberships by local id.
    pub project_users: HashMap<LocalId, ProjectUser>,
    /// All live time entries, enriched for display, by local id.
    pub time_entries: HashMap<LocalId, RichTimeEntry>,
    /// Transient request bookkeeping.
    pub request_info: RequestInfo,
    /// Durable preferences.
    pub settings: Settings,
}

impl AppState {
    /// A state with no data at all, as after a fresh install.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            user: User::default(),
            workspaces: HashMap::new(),
            clients: HashMap::new(),
            projects: HashMap::new(),
            tasks: HashMap::new(),
            tags: HashMap::new(),
            workspace_users: HashMap::new(),
            project_users: HashMap::new(),
            time_entries: HashMap::new(),
            request_info: RequestInfo::empty(now),
            settings: Settings::default(),
        }
    }

    /// Loads the initial state from storage.
    ///
    /// With no logged-in user a draft workspace and user are created so the
    /// app is usable offline from the first launch. When `settings` names a
    /// user whose row is gone the mismatch is logged and the state falls
    /// back to logged-out, keeping the rest of the settings intact.
    ///
    /// # Errors
    ///
    /// Propagates storage read failures.
    pub fn init<S: TableStore>(store: &S, settings: Settings, now: DateTime<Utc>) -> DbResult<Self> {
        let mut state = Self::empty(now);

        let Some(user_id) = settings.user_id else {
            let workspace = Workspace::draft(now);
            state.user = User::draft(workspace.common.id, now);
            state.workspaces.insert(workspace.common.id, workspace);
            state.settings = settings;
            return Ok(state);
        };

        let Some(user) = store.get::<User>(user_id)? else {
            tracing::error!(%user_id, "settings reference a user that is not in storage");
            let mut settings = settings;
            settings.user_id = None;
            state.settings = settings;
            return Ok(state);
        };

        state.user = user;
        state.settings = settings;
        state.workspaces = load_table::<Workspace, S>(store)?;
        state.clients = load_table::<Client, S>(store)?;
        state.projects = load_table::<Project, S>(store)?;
        state.tasks = load_table::<Task, S>(store)?;
        state.tags = load_table::<Tag, S>(store)?;
        state.workspace_users = load_table::<WorkspaceUser, S>(store)?;
        state.project_users = load_table::<ProjectUser, S>(store)?;

        let entries: Vec<TimeEntry> = store.scan::<TimeEntry>()?;
        state.merge_time_entries(entries);
        Ok(state)
    }

    /// Merges a heterogeneous batch of records into a new snapshot.
    ///
    /// Per record: a tombstone removes it (removing an absent record is a
    /// no-op), anything else is inserted or overwritten as-is. No
    /// `modified_at` comparison happens here; ordering conflicts are
    /// resolved upstream by [`SyncRecord::merge_remote`]. Merging the same
    /// batch twice yields the same snapshot.
    ///
    /// Time entry display info is rebuilt against the post-merge reference
    /// tables, including entries the batch did not touch, since a renamed
    /// project or tag changes how existing entries render.
    #[must_use]
    pub fn update_entities(&self, batch: Vec<DomainRecord>) -> Self {
        let mut next = self.clone();
        let mut entries = Vec::new();
        let mut references_changed = false;

        for record in batch {
            match record {
                DomainRecord::Workspace(r) => {
                    merge_record(&mut next.workspaces, r);
                    references_changed = true;
                }
                DomainRecord::Client(r) => {
                    merge_record(&mut next.clients, r);
                    references_changed = true;
                }
                DomainRecord::Project(r) => {
                    merge_record(&mut next.projects, r);
                    references_changed = true;
                }
                DomainRecord::Task(r) => {
                    merge_record(&mut next.tasks, r);
                    references_changed = true;
                }
                DomainRecord::Tag(r) => {
                    merge_record(&mut next.tags, r);
                    references_changed = true;
                }
                DomainRecord::WorkspaceUser(r) => merge_record(&mut next.workspace_users, r),
                DomainRecord::ProjectUser(r) => merge_record(&mut next.project_users, r),
                DomainRecord::User(r) => {
                    if r.common.deleted_at.is_none() {
                        next.user = r;
                    }
                }
                DomainRecord::TimeEntry(r) => entries.push(r),
            }
        }

        if references_changed {
            next.refresh_entry_infos();
        }
        next.merge_time_entries(entries);
        next
    }

    /// Merges time entries into a new snapshot, same rules as
    /// [`AppState::update_entities`].
    #[must_use]
    pub fn update_time_entries(&self, batch: Vec<TimeEntry>) -> Self {
        let mut next = self.clone();
        next.merge_time_entries(batch);
        next
    }

    /// Replaces the whole time entry collection with `entries`.
    #[must_use]
    pub fn replace_time_entries(&self, entries: Vec<TimeEntry>) -> Self {
        let mut next = self.clone();
        next.time_entries = HashMap::new();
        next.merge_time_entries(entries);
        next
    }

    /// Resolves the denormalized display info for one entry against this
    /// snapshot's reference tables. Dangling references resolve to `None`
    /// (or a default workspace) rather than failing.
    #[must_use]
    pub fn load_entry_info(&self, entry: &TimeEntry) -> EntryInfo {
        let workspace = self
            .workspaces
            .get(&entry.workspace_id)
            .cloned()
            .unwrap_or_default();
        let project = entry
            .project_id
            .and_then(|id| self.projects.get(&id).cloned());
        let client = project
            .as_ref()
            .and_then(|p| p.client_id)
            .and_then(|id| self.clients.get(&id).cloned());
        let task = entry.task_id.and_then(|id| self.tasks.get(&id).cloned());
        let color = project.as_ref().map_or(-1, |p| p.color);
        let tags = entry
            .tags
            .iter()
            .filter_map(|name| {
                self.tags
                    .values()
                    .find(|t| t.workspace_id == entry.workspace_id && &t.name == name)
                    .cloned()
            })
            .collect();
        EntryInfo {
            workspace,
            project,
            client,
            task,
            tags,
            color,
        }
    }

    /// A draft entry in the current user's default workspace.
    #[must_use]
    pub fn time_entry_draft(&self, now: DateTime<Utc>) -> TimeEntry {
        TimeEntry::draft(&self.user, now)
    }

    fn merge_time_entries(&mut self, batch: Vec<TimeEntry>) {
        for entry in batch {
            if entry.common.deleted_at.is_none() {
                let info = self.load_entry_info(&entry);
                self.time_entries
                    .insert(entry.common.id, RichTimeEntry { data: entry, info });
            } else {
                self.time_entries.remove(&entry.common.id);
            }
        }
    }

    fn refresh_entry_infos(&mut self) {
        let ids: Vec<LocalId> = self.time_entries.keys().copied().collect();
        for id in ids {
            if let Some(rich) = self.time_entries.get(&id).cloned() {
                let info = self.load_entry_info(&rich.data);
                self.time_entries.insert(id, RichTimeEntry { info, ..rich });
            }
        }
    }
}

fn merge_record<R: SyncRecord>(map: &mut HashMap<LocalId, R>, record: R) {
    if record.deleted_at().is_none() {
        map.insert(record.id(), record);
    } else {
        map.remove(&record.id());
    }
}

fn load_table<R, S>(store: &S) -> DbResult<HashMap<LocalId, R>>
where
    R: SyncRecord + tempo_db::TableRecord,
    S: TableStore,
{
    Ok(store
        .scan::<R>()?
        .into_iter()
        .filter(|r| r.deleted_at().is_none())
        .map(|r| (r.id(), r))
        .collect())
}
