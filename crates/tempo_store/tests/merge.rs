//! Merge semantics of the state store, including property checks.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tempo_model::{Common, DomainRecord, LocalId, Project, User, Workspace};
use tempo_store::{Action, AppState, Dispatcher, SourceType, Store};

fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn seeded_state() -> AppState {
    let now = base_time();
    let mut state = AppState::empty(now);
    let workspace = Workspace::draft(now);
    state.user = User::draft(workspace.common.id, now);
    state.workspaces.insert(workspace.common.id, workspace);
    state
}

fn workspace_of(state: &AppState) -> Workspace {
    state
        .workspaces
        .values()
        .next()
        .cloned()
        .expect("seeded state has a workspace")
}

#[test]
fn later_arrival_wins_regardless_of_modified_at() {
    let state = seeded_state();
    let workspace = workspace_of(&state);

    let newer = Project {
        common: Common::new(base_time() + Duration::minutes(10)),
        name: "from a fast device".into(),
        workspace_id: workspace.common.id,
        ..Project::default()
    };
    let mut older = newer.clone();
    older.common.modified_at = base_time();
    older.name = "from a slow device".into();

    // The older revision arrives second and still wins: ordering conflicts
    // are resolved before records reach the store, not inside it.
    let state = state.update_entities(vec![newer.into()]);
    let state = state.update_entities(vec![older.clone().into()]);
    assert_eq!(
        state.projects.get(&older.common.id).unwrap().name,
        "from a slow device"
    );
}

#[test]
fn full_flow_through_dispatcher_and_store() {
    let store = std::sync::Arc::new(Store::with_default_reducer(seeded_state()));
    let dispatcher = Dispatcher::new(std::sync::Arc::clone(&store));

    let mut entry = store.state().time_entry_draft(base_time());
    entry.description = "pairing session".into();
    let id = entry.common.id;

    dispatcher
        .send(SourceType::Ui, Action::TimeEntryPut(entry))
        .unwrap();
    assert_eq!(store.state().time_entries.len(), 1);

    let server_time = base_time() + Duration::seconds(30);
    dispatcher
        .send(
            SourceType::SyncManager,
            Action::ReceivedFromServer {
                records: Vec::new(),
                server_time: Some(server_time),
            },
        )
        .unwrap();
    assert_eq!(
        store.state().request_info.get_changes_last_run,
        server_time
    );

    dispatcher
        .send(
            SourceType::Ui,
            Action::TimeEntryDelete {
                id,
                at: base_time() + Duration::minutes(1),
            },
        )
        .unwrap();
    assert!(store.state().time_entries.is_empty());
}

fn arbitrary_project(workspace_id: LocalId) -> impl Strategy<Value = Project> {
    ("[a-z]{1,12}", 0i32..16, proptest::bool::ANY).prop_map(move |(name, color, deleted)| {
        let mut common = Common::new(base_time());
        if deleted {
            common.deleted_at = Some(base_time());
        }
        Project {
            common,
            name,
            color,
            is_active: true,
            workspace_id,
            ..Project::default()
        }
    })
}

proptest! {
    #[test]
    fn merging_a_batch_twice_equals_merging_once(
        batch_seed in proptest::collection::vec((0usize..8, any::<bool>()), 0..24)
    ) {
        let state = seeded_state();
        let workspace = workspace_of(&state);

        // A small id pool so batches contain duplicate ids, overwrites
        // and tombstones of records merged earlier in the same batch.
        let pool: Vec<LocalId> = (0..8).map(|_| LocalId::generate()).collect();
        let batch: Vec<DomainRecord> = batch_seed
            .into_iter()
            .map(|(slot, deleted)| {
                let mut project = Project {
                    common: Common::new(base_time()),
                    name: format!("p{slot}"),
                    workspace_id: workspace.common.id,
                    ..Project::default()
                };
                project.common.id = pool[slot];
                if deleted {
                    project.common.deleted_at = Some(base_time());
                }
                project.into()
            })
            .collect();

        let once = state.update_entities(batch.clone());
        let twice = once.update_entities(batch);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merged_maps_never_contain_tombstones(
        projects in proptest::collection::vec(
            arbitrary_project(LocalId::nil()), 0..24
        )
    ) {
        let state = seeded_state();
        let batch: Vec<DomainRecord> = projects.into_iter().map(Into::into).collect();
        let merged = state.update_entities(batch);
        prop_assert!(merged
            .projects
            .values()
            .all(|p| p.common.deleted_at.is_none()));
    }
}
