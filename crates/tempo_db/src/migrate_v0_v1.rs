//! The v0 -> v1 schema upgrade.
//!
//! V1 denormalizes remote foreign keys next to every local reference (the
//! remote API only understands server ids, so they must be resolvable
//! without a second lookup) and folds the time-entry/tag association table
//! into a per-entry list of tag names. All non-structural fields carry over
//! unchanged.

use crate::error::DbResult;
use crate::migration::Migration;
use crate::store::{TableRecord, TableStore};
use crate::v0;
use std::collections::HashMap;
use tempo_model::{
    Client, Common, LocalId, Project, ProjectUser, RemoteId, Tag, Task, TimeEntry,
    TimeEntryState, TrackingMode, User, Workspace, WorkspaceUser,
};
use tracing::warn;

/// Migration step upgrading schema version 0 to version 1.
pub struct MigrateV0ToV1;

fn common(
    id: LocalId,
    remote_id: Option<RemoteId>,
    modified_at: chrono::DateTime<chrono::Utc>,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Common {
    Common {
        id,
        remote_id,
        modified_at,
        deleted_at,
    }
}

impl<S: TableStore> Migration<S> for MigrateV0ToV1 {
    fn from_version(&self) -> u32 {
        0
    }

    fn name(&self) -> &str {
        "denormalize_remote_keys"
    }

    fn up(&self, store: &S) -> DbResult<()> {
        // Read the complete v0 table set before writing anything.
        let workspaces: Vec<v0::WorkspaceRow> = store.scan()?;
        let clients: Vec<v0::ClientRow> = store.scan()?;
        let projects: Vec<v0::ProjectRow> = store.scan()?;
        let tasks: Vec<v0::TaskRow> = store.scan()?;
        let tags: Vec<v0::TagRow> = store.scan()?;
        let entries: Vec<v0::TimeEntryRow> = store.scan()?;
        let users: Vec<v0::UserRow> = store.scan()?;
        let workspace_users: Vec<v0::WorkspaceUserRow> = store.scan()?;
        let project_users: Vec<v0::ProjectUserRow> = store.scan()?;
        let entry_tags: Vec<v0::TimeEntryTagRow> = store.scan()?;

        let workspace_remote: HashMap<LocalId, Option<RemoteId>> =
            workspaces.iter().map(|w| (w.id, w.remote_id)).collect();
        let client_remote: HashMap<LocalId, Option<RemoteId>> =
            clients.iter().map(|c| (c.id, c.remote_id)).collect();
        let project_remote: HashMap<LocalId, Option<RemoteId>> =
            projects.iter().map(|p| (p.id, p.remote_id)).collect();
        let task_remote: HashMap<LocalId, Option<RemoteId>> =
            tasks.iter().map(|t| (t.id, t.remote_id)).collect();
        let user_remote: HashMap<LocalId, Option<RemoteId>> =
            users.iter().map(|u| (u.id, u.remote_id)).collect();
        let tag_names: HashMap<LocalId, String> =
            tags.iter().map(|t| (t.id, t.name.clone())).collect();

        let resolve = |map: &HashMap<LocalId, Option<RemoteId>>, id: LocalId| -> Option<RemoteId> {
            map.get(&id).copied().flatten()
        };

        // Tag names per time entry, from the association table.
        let mut names_by_entry: HashMap<LocalId, Vec<String>> = HashMap::new();
        for join in &entry_tags {
            match tag_names.get(&join.tag_id) {
                Some(name) => names_by_entry
                    .entry(join.time_entry_id)
                    .or_default()
                    .push(name.clone()),
                None => {
                    warn!(tag_id = %join.tag_id, entry_id = %join.time_entry_id,
                          "dropping association to unknown tag");
                }
            }
        }

        store.replace_table(
            workspaces
                .into_iter()
                .map(|w| Workspace {
                    common: common(w.id, w.remote_id, w.modified_at, w.deleted_at),
                    name: w.name,
                    is_admin: w.is_admin,
                    is_premium: w.is_premium,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            clients
                .into_iter()
                .map(|c| Client {
                    common: common(c.id, c.remote_id, c.modified_at, c.deleted_at),
                    name: c.name,
                    workspace_remote_id: resolve(&workspace_remote, c.workspace_id),
                    workspace_id: c.workspace_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            projects
                .into_iter()
                .map(|p| Project {
                    common: common(p.id, p.remote_id, p.modified_at, p.deleted_at),
                    name: p.name,
                    color: p.color,
                    is_active: p.is_active,
                    is_private: p.is_private,
                    workspace_remote_id: resolve(&workspace_remote, p.workspace_id),
                    workspace_id: p.workspace_id,
                    client_remote_id: p.client_id.and_then(|id| resolve(&client_remote, id)),
                    client_id: p.client_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            tasks
                .into_iter()
                .map(|t| Task {
                    common: common(t.id, t.remote_id, t.modified_at, t.deleted_at),
                    name: t.name,
                    is_active: t.is_active,
                    estimated_seconds: t.estimated_seconds,
                    workspace_remote_id: resolve(&workspace_remote, t.workspace_id),
                    workspace_id: t.workspace_id,
                    project_remote_id: resolve(&project_remote, t.project_id),
                    project_id: t.project_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            tags.into_iter()
                .map(|t| Tag {
                    common: common(t.id, t.remote_id, t.modified_at, t.deleted_at),
                    name: t.name,
                    workspace_remote_id: resolve(&workspace_remote, t.workspace_id),
                    workspace_id: t.workspace_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            entries
                .into_iter()
                .map(|e| TimeEntry {
                    common: common(e.id, e.remote_id, e.modified_at, e.deleted_at),
                    description: e.description,
                    state: if e.stop_time.is_some() {
                        TimeEntryState::Finished
                    } else {
                        TimeEntryState::Running
                    },
                    start_time: e.start_time,
                    stop_time: e.stop_time,
                    duration_only: e.duration_only,
                    created_with: e.created_with,
                    tags: names_by_entry.get(&e.id).cloned().unwrap_or_default(),
                    user_remote_id: resolve(&user_remote, e.user_id),
                    user_id: e.user_id,
                    workspace_remote_id: resolve(&workspace_remote, e.workspace_id),
                    workspace_id: e.workspace_id,
                    project_remote_id: e.project_id.and_then(|id| resolve(&project_remote, id)),
                    project_id: e.project_id,
                    task_remote_id: e.task_id.and_then(|id| resolve(&task_remote, id)),
                    task_id: e.task_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            users
                .into_iter()
                .map(|u| User {
                    common: common(u.id, u.remote_id, u.modified_at, u.deleted_at),
                    name: u.name,
                    email: u.email,
                    start_of_week: u.start_of_week,
                    locale: u.locale,
                    tracking_mode: TrackingMode::StartNew,
                    default_workspace_remote_id: resolve(
                        &workspace_remote,
                        u.default_workspace_id,
                    ),
                    default_workspace_id: u.default_workspace_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            workspace_users
                .into_iter()
                .map(|m| WorkspaceUser {
                    common: common(m.id, m.remote_id, m.modified_at, m.deleted_at),
                    is_admin: m.is_admin,
                    workspace_remote_id: resolve(&workspace_remote, m.workspace_id),
                    workspace_id: m.workspace_id,
                    user_remote_id: resolve(&user_remote, m.user_id),
                    user_id: m.user_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.replace_table(
            project_users
                .into_iter()
                .map(|m| ProjectUser {
                    common: common(m.id, m.remote_id, m.modified_at, m.deleted_at),
                    is_manager: m.is_manager,
                    project_remote_id: resolve(&project_remote, m.project_id),
                    project_id: m.project_id,
                    user_remote_id: resolve(&user_remote, m.user_id),
                    user_id: m.user_id,
                })
                .collect::<Vec<_>>(),
        )?;

        store.drop_table(v0::TimeEntryTagRow::TABLE)
    }
}
