//! The state store: reduce, swap, notify.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::action::Action;
use crate::app_state::AppState;
use crate::request_info::{AuthResult, RequestInfoUpdate, ServerRequest};
use crate::settings::SettingsUpdate;
use tempo_model::LocalId;

/// A pure state transition. Reducers must not perform side effects; those
/// belong in subscribers.
pub type Reducer = dyn Fn(&AppState, &Action) -> AppState + Send + Sync;

/// Called with each new snapshot after it is installed. Subscribers must
/// not dispatch from inside the callback; they schedule follow-up work
/// that dispatches later from its own task.
pub type Subscriber = dyn Fn(&Arc<AppState>) + Send + Sync;

/// Owns the current snapshot and serializes transitions.
///
/// There is no global instance; construct one and pass the handle around.
/// `dispatch` holds an internal mutex across reduce, swap, and notify, so
/// transitions are linearizable: every subscriber sees every snapshot in
/// the order it was produced.
pub struct Store {
    dispatch_lock: Mutex<()>,
    current: RwLock<Arc<AppState>>,
    reducer: Box<Reducer>,
    subscribers: RwLock<Vec<Box<Subscriber>>>,
}

impl Store {
    /// Creates a store with the given initial snapshot and reducer.
    #[must_use]
    pub fn new(initial: AppState, reducer: Box<Reducer>) -> Self {
        Self {
            dispatch_lock: Mutex::new(()),
            current: RwLock::new(Arc::new(initial)),
            reducer,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Creates a store using [`reduce`], the standard reducer.
    #[must_use]
    pub fn with_default_reducer(initial: AppState) -> Self {
        Self::new(initial, Box::new(|state, action| reduce(state, action)))
    }

    /// The current snapshot. Cheap; never blocks on a running dispatch
    /// longer than the swap itself.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        self.current.read().clone()
    }

    /// Registers a subscriber for future snapshots.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&Arc<AppState>) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Box::new(subscriber));
    }

    /// Applies `action` to the current snapshot and notifies subscribers
    /// with the result. Concurrent dispatches queue up on the internal
    /// mutex and run one at a time.
    pub fn dispatch(&self, action: Action) {
        let _serialized = self.dispatch_lock.lock();
        let previous = self.current.read().clone();
        let next = Arc::new((self.reducer)(&previous, &action));
        *self.current.write() = Arc::clone(&next);
        tracing::debug!(kind = ?action.kind(), "state transition applied");
        for subscriber in self.subscribers.read().iter() {
            subscriber(&next);
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("subscribers", &self.subscribers.read().len())
            .finish_non_exhaustive()
    }
}

/// The standard reducer: merge semantics for data actions, request and
/// settings bookkeeping for the rest.
#[must_use]
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    match action {
        Action::ReceivedFromServer {
            records,
            server_time,
        } => {
            let mut next = state.update_entities(records.clone());
            if let Some(server_time) = *server_time {
                next.request_info = next.request_info.with(RequestInfoUpdate {
                    get_changes_last_run: Some(server_time),
                    had_errors: Some(false),
                    error_info: Some(None),
                    ..RequestInfoUpdate::default()
                });
                next.settings = next.settings.with(SettingsUpdate {
                    get_changes_last_run: Some(Some(server_time)),
                    ..SettingsUpdate::default()
                });
            }
            next
        }

        Action::ReceivedFromDownload { entries, has_more } => {
            let mut next = state.update_time_entries(entries.clone());
            // The page that just arrived covered everything newer than
            // next_download_from; the page after it starts there and
            // reaches back to the oldest entry just seen.
            let oldest = entries.iter().map(|e| e.start_time).min();
            next.request_info = next.request_info.with(RequestInfoUpdate {
                download_from: Some(state.request_info.next_download_from),
                next_download_from: oldest,
                has_more_entries: Some(*has_more),
                had_errors: Some(false),
                error_info: Some(None),
                ..RequestInfoUpdate::default()
            });
            next
        }

        Action::TimeEntryPut(entry) => state.update_time_entries(vec![entry.clone()]),

        Action::TimeEntryDelete { id, at } => {
            match state.time_entries.get(id) {
                Some(rich) => {
                    let mut tombstone = rich.data.clone();
                    tombstone.common.deleted_at = Some(*at);
                    tombstone.common.modified_at = *at;
                    state.update_time_entries(vec![tombstone])
                }
                None => state.clone(),
            }
        }

        Action::TimeEntriesReplace(entries) => state.replace_time_entries(entries.clone()),

        Action::RequestStarted(request) => {
            let mut next = state.clone();
            let mut update = RequestInfoUpdate::starting(&state.request_info, *request);
            if matches!(request, ServerRequest::Authenticate(_)) {
                update.auth_result = Some(AuthResult::Authenticating);
            }
            next.request_info = state.request_info.with(update);
            next
        }

        Action::RequestFinished(request) => {
            let mut next = state.clone();
            next.request_info = state
                .request_info
                .with(RequestInfoUpdate::finishing(&state.request_info, *request));
            next
        }

        Action::AuthResultChanged(result) => {
            let mut next = state.clone();
            next.request_info = state.request_info.with(RequestInfoUpdate {
                auth_result: Some(*result),
                ..RequestInfoUpdate::default()
            });
            next
        }

        Action::SettingsChanged(update) => {
            let mut next = state.clone();
            next.settings = state.settings.with(update.clone());
            next
        }

        Action::Error { message, id, .. } => {
            let mut next = state.clone();
            next.request_info = state.request_info.with(RequestInfoUpdate {
                had_errors: Some(true),
                error_info: Some(Some((
                    message.clone(),
                    id.unwrap_or_else(LocalId::nil),
                ))),
                ..RequestInfoUpdate::default()
            });
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::request_info::AuthKind;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempo_model::{TimeEntry, User, Workspace};

    fn initial() -> AppState {
        let now = Utc::now();
        let mut state = AppState::empty(now);
        let workspace = Workspace::draft(now);
        state.user = User::draft(workspace.common.id, now);
        state.workspaces.insert(workspace.common.id, workspace);
        state
    }

    #[test]
    fn dispatch_swaps_state_and_notifies() {
        let store = Arc::new(Store::with_default_reducer(initial()));
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in = Arc::clone(&seen);
        store.subscribe(move |state| {
            seen_in.store(state.time_entries.len(), Ordering::SeqCst);
        });

        let entry = store.state().time_entry_draft(Utc::now());
        store.dispatch(Action::TimeEntryPut(entry));
        assert_eq!(store.state().time_entries.len(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delete_tombstones_and_removes() {
        let store = Store::with_default_reducer(initial());
        let entry = store.state().time_entry_draft(Utc::now());
        let id = entry.common.id;
        store.dispatch(Action::TimeEntryPut(entry));
        store.dispatch(Action::TimeEntryDelete {
            id,
            at: Utc::now(),
        });
        assert!(store.state().time_entries.is_empty());

        // Deleting an absent entry is a no-op.
        store.dispatch(Action::TimeEntryDelete {
            id,
            at: Utc::now(),
        });
        assert!(store.state().time_entries.is_empty());
    }

    #[test]
    fn replace_discards_entries_not_in_the_new_set() {
        let store = Store::with_default_reducer(initial());
        let kept = store.state().time_entry_draft(Utc::now());
        let dropped = store.state().time_entry_draft(Utc::now());
        store.dispatch(Action::TimeEntryPut(kept.clone()));
        store.dispatch(Action::TimeEntryPut(dropped));
        store.dispatch(Action::TimeEntriesReplace(vec![kept.clone()]));

        let state = store.state();
        assert_eq!(state.time_entries.len(), 1);
        assert!(state.time_entries.contains_key(&kept.common.id));
    }

    #[test]
    fn received_from_server_advances_the_watermark() {
        let store = Store::with_default_reducer(initial());
        let server_time = Utc::now() + Duration::seconds(3);
        store.dispatch(Action::ReceivedFromServer {
            records: Vec::new(),
            server_time: Some(server_time),
        });
        let state = store.state();
        assert_eq!(state.request_info.get_changes_last_run, server_time);
        assert_eq!(state.settings.get_changes_last_run, Some(server_time));
    }

    #[test]
    fn download_page_moves_the_cursor_back() {
        let store = Store::with_default_reducer(initial());
        let before = store.state().request_info.clone();

        let mut old_entry = store.state().time_entry_draft(Utc::now());
        old_entry.start_time = before.next_download_from - Duration::days(3);
        let oldest = old_entry.start_time;

        store.dispatch(Action::ReceivedFromDownload {
            entries: vec![old_entry],
            has_more: true,
        });
        let info = store.state().request_info.clone();
        assert_eq!(info.download_from, before.next_download_from);
        assert_eq!(info.next_download_from, oldest);
        assert!(info.has_more_entries);
    }

    #[test]
    fn request_lifecycle_and_auth_result() {
        let store = Store::with_default_reducer(initial());
        let request = ServerRequest::Authenticate(AuthKind::Password);

        store.dispatch(Action::RequestStarted(request));
        let state = store.state();
        assert!(state.request_info.is_running(request));
        assert_eq!(state.request_info.auth_result, AuthResult::Authenticating);

        store.dispatch(Action::AuthResultChanged(AuthResult::Success));
        store.dispatch(Action::RequestFinished(request));
        let state = store.state();
        assert!(!state.request_info.is_running(request));
        assert_eq!(state.request_info.auth_result, AuthResult::Success);
    }

    #[test]
    fn error_actions_record_failure_details() {
        let store = Store::with_default_reducer(initial());
        let id = tempo_model::LocalId::generate();
        store.dispatch(Action::Error {
            kind: ActionKind::SyncError,
            message: "connection reset".into(),
            id: Some(id),
        });
        let info = store.state().request_info.clone();
        assert!(info.had_errors);
        assert_eq!(info.error_info, Some(("connection reset".into(), id)));
    }

    #[test]
    fn server_batch_clears_a_previous_error() {
        let store = Store::with_default_reducer(initial());
        store.dispatch(Action::Error {
            kind: ActionKind::SyncError,
            message: "flaky".into(),
            id: None,
        });
        store.dispatch(Action::ReceivedFromServer {
            records: Vec::new(),
            server_time: Some(Utc::now()),
        });
        let info = store.state().request_info.clone();
        assert!(!info.had_errors);
        assert_eq!(info.error_info, None);
    }

    #[test]
    fn put_then_server_merge_keeps_local_linkage() {
        let store = Store::with_default_reducer(initial());
        let mut entry = store.state().time_entry_draft(Utc::now());
        entry.description = "writing docs".into();
        let id = entry.common.id;
        store.dispatch(Action::TimeEntryPut(entry.clone()));

        let mut from_server: TimeEntry = entry;
        from_server.common.remote_id = Some(4711);
        from_server.common.modified_at = Utc::now() + Duration::seconds(5);
        store.dispatch(Action::ReceivedFromServer {
            records: vec![from_server.into()],
            server_time: None,
        });

        let rich = store.state().time_entries.get(&id).cloned().unwrap();
        assert_eq!(rich.data.common.remote_id, Some(4711));
        assert_eq!(rich.data.description, "writing docs");
    }
}
