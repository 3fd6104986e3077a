//! End-to-end migration scenarios against a v0 store.

use chrono::{TimeZone, Utc};
use tempo_db::{migrator, v0, MemoryStore, TableStore, SCHEMA_VERSION};
use tempo_model::{
    Client, LocalId, Project, ProjectUser, SyncRecord, Tag, Task, TimeEntry, User, Workspace,
    WorkspaceUser,
};

fn v0_store() -> MemoryStore {
    MemoryStore::with_version(0)
}

fn migrate(store: &MemoryStore) {
    let report = migrator().unwrap().migrate(store).unwrap();
    assert_eq!(report.final_version, SCHEMA_VERSION);
}

fn modified() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 2, 29, 8, 0, 0).unwrap()
}

#[test]
fn migrate_empty_store() {
    let store = v0_store();
    migrate(&store);
    assert_eq!(store.version(), SCHEMA_VERSION);
}

#[test]
fn migrate_workspace() {
    let store = v0_store();
    let workspace_id = LocalId::generate();
    store
        .upsert(v0::WorkspaceRow {
            id: workspace_id,
            remote_id: Some(42),
            modified_at: modified(),
            name: "the matrix".into(),
            ..v0::WorkspaceRow::default()
        })
        .unwrap();

    migrate(&store);

    let workspaces: Vec<Workspace> = store.scan().unwrap();
    assert_eq!(workspaces.len(), 1);
    let workspace = &workspaces[0];
    assert_eq!(workspace.id(), workspace_id);
    assert_eq!(workspace.name, "the matrix");
    assert_eq!(workspace.remote_id(), Some(42));
    assert_eq!(workspace.modified_at(), modified());
}

#[test]
fn migrate_user_links_default_workspace() {
    let store = v0_store();
    let workspace_id = LocalId::generate();
    store
        .upsert(v0::WorkspaceRow {
            id: workspace_id,
            remote_id: Some(42),
            ..v0::WorkspaceRow::default()
        })
        .unwrap();
    store
        .upsert(v0::UserRow {
            id: LocalId::generate(),
            remote_id: Some(1337),
            name: "neo".into(),
            default_workspace_id: workspace_id,
            ..v0::UserRow::default()
        })
        .unwrap();

    migrate(&store);

    let users: Vec<User> = store.scan().unwrap();
    let user = &users[0];
    assert_eq!(user.remote_id(), Some(1337));
    assert_eq!(user.name, "neo");
    assert_eq!(user.default_workspace_id, workspace_id);
    assert_eq!(user.default_workspace_remote_id, Some(42));
}

#[test]
fn migrate_client_and_project_chain() {
    let store = v0_store();
    let workspace_id = LocalId::generate();
    let client_id = LocalId::generate();
    store
        .upsert(v0::WorkspaceRow {
            id: workspace_id,
            remote_id: Some(42),
            ..v0::WorkspaceRow::default()
        })
        .unwrap();
    store
        .upsert(v0::ClientRow {
            id: client_id,
            remote_id: Some(1337),
            name: "the oracle".into(),
            workspace_id,
            ..v0::ClientRow::default()
        })
        .unwrap();
    store
        .upsert(v0::ProjectRow {
            id: LocalId::generate(),
            remote_id: Some(500),
            name: "save the world".into(),
            workspace_id,
            client_id: Some(client_id),
            ..v0::ProjectRow::default()
        })
        .unwrap();

    migrate(&store);

    let clients: Vec<Client> = store.scan().unwrap();
    assert_eq!(clients[0].name, "the oracle");
    assert_eq!(clients[0].workspace_id, workspace_id);
    assert_eq!(clients[0].workspace_remote_id, Some(42));

    let projects: Vec<Project> = store.scan().unwrap();
    let project = &projects[0];
    assert_eq!(project.name, "save the world");
    assert_eq!(project.remote_id(), Some(500));
    assert_eq!(project.client_id, Some(client_id));
    assert_eq!(project.client_remote_id, Some(1337));
    assert_eq!(project.workspace_remote_id, Some(42));
}

#[test]
fn migrate_task() {
    let store = v0_store();
    let workspace_id = LocalId::generate();
    let project_id = LocalId::generate();
    store
        .upsert(v0::WorkspaceRow {
            id: workspace_id,
            remote_id: Some(42),
            ..v0::WorkspaceRow::default()
        })
        .unwrap();
    store
        .upsert(v0::ProjectRow {
            id: project_id,
            remote_id: Some(500),
            workspace_id,
            ..v0::ProjectRow::default()
        })
        .unwrap();
    store
        .upsert(v0::TaskRow {
            id: LocalId::generate(),
            remote_id: Some(1337),
            name: "become the one".into(),
            workspace_id,
            project_id,
            ..v0::TaskRow::default()
        })
        .unwrap();

    migrate(&store);

    let tasks: Vec<Task> = store.scan().unwrap();
    let task = &tasks[0];
    assert_eq!(task.name, "become the one");
    assert_eq!(task.project_id, project_id);
    assert_eq!(task.project_remote_id, Some(500));
    assert_eq!(task.workspace_remote_id, Some(42));
}

#[test]
fn migrate_time_entry_resolves_tag_names() {
    let store = v0_store();
    let workspace_id = LocalId::generate();
    let tag_id = LocalId::generate();
    let entry_id = LocalId::generate();
    store
        .upsert(v0::WorkspaceRow {
            id: workspace_id,
            remote_id: Some(42),
            ..v0::WorkspaceRow::default()
        })
        .unwrap();
    store
        .upsert(v0::TagRow {
            id: tag_id,
            name: "epic".into(),
            workspace_id,
            ..v0::TagRow::default()
        })
        .unwrap();
    store
        .upsert(v0::TimeEntryRow {
            id: entry_id,
            description: "learning kung fu".into(),
            workspace_id,
            stop_time: Some(modified()),
            ..v0::TimeEntryRow::default()
        })
        .unwrap();
    store
        .upsert(v0::TimeEntryTagRow {
            id: LocalId::generate(),
            time_entry_id: entry_id,
            tag_id,
        })
        .unwrap();

    migrate(&store);

    let entries: Vec<TimeEntry> = store.scan().unwrap();
    let entry = &entries[0];
    assert_eq!(entry.id(), entry_id);
    assert_eq!(entry.description, "learning kung fu");
    assert_eq!(entry.tags, vec!["epic".to_string()]);
    assert_eq!(entry.workspace_remote_id, Some(42));

    // The tag kept its stable identifier.
    let tags: Vec<Tag> = store.scan().unwrap();
    assert_eq!(tags[0].id(), tag_id);
    assert_eq!(tags[0].name, "epic");

    // The association table is gone.
    let joins: Result<Vec<v0::TimeEntryTagRow>, _> = store.scan();
    assert!(joins.unwrap().is_empty());
}

#[test]
fn migrate_membership_rows() {
    let store = v0_store();
    let workspace_id = LocalId::generate();
    let project_id = LocalId::generate();
    let user_id = LocalId::generate();
    store
        .upsert(v0::WorkspaceRow {
            id: workspace_id,
            remote_id: Some(42),
            ..v0::WorkspaceRow::default()
        })
        .unwrap();
    store
        .upsert(v0::ProjectRow {
            id: project_id,
            remote_id: Some(500),
            ..v0::ProjectRow::default()
        })
        .unwrap();
    store
        .upsert(v0::UserRow {
            id: user_id,
            remote_id: Some(1337),
            ..v0::UserRow::default()
        })
        .unwrap();
    store
        .upsert(v0::WorkspaceUserRow {
            id: LocalId::generate(),
            workspace_id,
            user_id,
            ..v0::WorkspaceUserRow::default()
        })
        .unwrap();
    store
        .upsert(v0::ProjectUserRow {
            id: LocalId::generate(),
            project_id,
            user_id,
            ..v0::ProjectUserRow::default()
        })
        .unwrap();

    migrate(&store);

    let memberships: Vec<WorkspaceUser> = store.scan().unwrap();
    assert_eq!(memberships[0].workspace_remote_id, Some(42));
    assert_eq!(memberships[0].user_remote_id, Some(1337));

    let memberships: Vec<ProjectUser> = store.scan().unwrap();
    assert_eq!(memberships[0].project_remote_id, Some(500));
    assert_eq!(memberships[0].user_remote_id, Some(1337));
}

#[test]
fn migrating_twice_is_a_noop() {
    let store = v0_store();
    store
        .upsert(v0::WorkspaceRow {
            id: LocalId::generate(),
            name: "once".into(),
            ..v0::WorkspaceRow::default()
        })
        .unwrap();

    migrate(&store);
    migrate(&store);

    let workspaces: Vec<Workspace> = store.scan().unwrap();
    assert_eq!(workspaces.len(), 1);
    assert_eq!(store.version(), SCHEMA_VERSION);
}
