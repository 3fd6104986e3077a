//! Wire-format round-trip tests.

use chrono::{TimeZone, Utc};
use tempo_model::{Common, LocalId, Project, SyncRecord, TimeEntry, Workspace};

fn common() -> Common {
    Common {
        id: LocalId::generate(),
        remote_id: Some(1337),
        modified_at: Utc.with_ymd_and_hms(2016, 3, 1, 12, 30, 0).unwrap(),
        deleted_at: None,
    }
}

#[test]
fn workspace_round_trip_preserves_wire_fields() {
    let workspace = Workspace {
        common: common(),
        name: "the matrix".into(),
        is_admin: true,
        is_premium: false,
    };

    let json = serde_json::to_string(&workspace).unwrap();
    let back: Workspace = serde_json::from_str(&json).unwrap();

    assert_eq!(back.remote_id(), workspace.remote_id());
    assert_eq!(back.modified_at(), workspace.modified_at());
    assert_eq!(back.name, workspace.name);
    assert_eq!(back.is_admin, workspace.is_admin);
    // The local id is transient on the wire and comes back unset.
    assert!(back.id().is_nil());
}

#[test]
fn remote_id_serializes_as_id() {
    let workspace = Workspace {
        common: common(),
        name: "w".into(),
        is_admin: false,
        is_premium: false,
    };
    let value: serde_json::Value = serde_json::to_value(&workspace).unwrap();
    assert_eq!(value["id"], 1337);
    assert!(value.get("remote_id").is_none());
}

#[test]
fn local_foreign_keys_stay_off_the_wire() {
    let project = Project {
        common: common(),
        name: "save the world".into(),
        color: 3,
        is_active: true,
        is_private: false,
        workspace_id: LocalId::generate(),
        workspace_remote_id: Some(42),
        client_id: Some(LocalId::generate()),
        client_remote_id: Some(7),
    };

    let value: serde_json::Value = serde_json::to_value(&project).unwrap();
    assert_eq!(value["wid"], 42);
    assert_eq!(value["cid"], 7);
    assert!(value.get("workspace_id").is_none());
    assert!(value.get("client_id").is_none());

    let back: Project = serde_json::from_value(value).unwrap();
    assert_eq!(back.workspace_remote_id, Some(42));
    assert_eq!(back.client_remote_id, Some(7));
    assert!(back.client_id.is_none());
}

#[test]
fn unset_remote_id_is_omitted() {
    let entry = TimeEntry {
        common: Common {
            remote_id: None,
            ..common()
        },
        description: "learning kung fu".into(),
        tags: vec!["epic".into()],
        ..TimeEntry::default()
    };

    let value: serde_json::Value = serde_json::to_value(&entry).unwrap();
    assert!(value.get("id").is_none());
    assert_eq!(value["description"], "learning kung fu");
    assert_eq!(value["tags"][0], "epic");

    let back: TimeEntry = serde_json::from_value(value).unwrap();
    assert!(back.remote_id().is_none());
    assert_eq!(back.tags, vec!["epic".to_string()]);
}

#[test]
fn server_deleted_at_round_trips() {
    let deleted = Utc.with_ymd_and_hms(2016, 3, 2, 0, 0, 0).unwrap();
    let entry = TimeEntry {
        common: Common {
            deleted_at: Some(deleted),
            ..common()
        },
        ..TimeEntry::default()
    };

    let value: serde_json::Value = serde_json::to_value(&entry).unwrap();
    assert!(value.get("server_deleted_at").is_some());

    let back: TimeEntry = serde_json::from_value(value).unwrap();
    assert_eq!(back.deleted_at(), Some(deleted));
}
