//! The entry point actions go through, with source authorization.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::action::{Action, ActionKind, SourceType};
use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use tempo_model::LocalId;

/// Routes actions into a [`Store`], enforcing that registered action
/// kinds are only sent by their designated orchestrator.
///
/// Unregistered kinds are unrestricted. Authorization is checked before
/// any state change, so a rejected send leaves the store untouched, and
/// error sends go through the same check as the success path.
pub struct Dispatcher {
    store: Arc<Store>,
    registry: RwLock<HashMap<ActionKind, SourceType>>,
}

impl Dispatcher {
    /// Creates a dispatcher for `store` with the standard restrictions:
    /// wholesale entry replacement is reserved for the download
    /// orchestrator.
    #[must_use]
    pub fn new(store: Arc<Store>) -> Self {
        let dispatcher = Self {
            store,
            registry: RwLock::new(HashMap::new()),
        };
        dispatcher.restrict(ActionKind::TimeEntriesReplace, SourceType::DownloadManager);
        dispatcher
    }

    /// Reserves `kind` for `source`. Re-registering a kind replaces the
    /// previous reservation.
    pub fn restrict(&self, kind: ActionKind, source: SourceType) {
        self.registry.write().insert(kind, source);
    }

    /// Dispatches `action` on behalf of `source`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SourceNotAuthorized`] when the action's kind
    /// is reserved for a different source; the store is not touched.
    pub fn send(&self, source: SourceType, action: Action) -> StoreResult<()> {
        self.authorize(source, action.kind())?;
        self.store.dispatch(action);
        Ok(())
    }

    /// Dispatches a failure for the operation tagged `kind`.
    ///
    /// # Errors
    ///
    /// Same authorization rule as [`Dispatcher::send`].
    pub fn send_error(
        &self,
        source: SourceType,
        kind: ActionKind,
        message: impl Into<String>,
        id: Option<LocalId>,
    ) -> StoreResult<()> {
        self.send(
            source,
            Action::Error {
                kind,
                message: message.into(),
                id,
            },
        )
    }

    fn authorize(&self, source: SourceType, kind: ActionKind) -> StoreResult<()> {
        match self.registry.read().get(&kind) {
            Some(registered) if *registered != source => {
                tracing::warn!(?kind, ?source, ?registered, "rejected unauthorized dispatch");
                Err(StoreError::SourceNotAuthorized {
                    kind,
                    source,
                    registered: *registered,
                })
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &*self.registry.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use chrono::Utc;

    fn dispatcher() -> Dispatcher {
        let store = Arc::new(Store::with_default_reducer(AppState::empty(Utc::now())));
        Dispatcher::new(store)
    }

    #[test]
    fn unregistered_kinds_are_open_to_everyone() {
        let dispatcher = dispatcher();
        for source in [SourceType::Ui, SourceType::SyncManager, SourceType::Test] {
            dispatcher
                .send(source, Action::SettingsChanged(Default::default()))
                .unwrap();
        }
    }

    #[test]
    fn registered_kind_rejects_other_sources() {
        let dispatcher = dispatcher();
        let before = dispatcher.store.state();

        let err = dispatcher
            .send(SourceType::Ui, Action::TimeEntriesReplace(Vec::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::SourceNotAuthorized {
                kind: ActionKind::TimeEntriesReplace,
                source: SourceType::Ui,
                registered: SourceType::DownloadManager,
            }
        ));
        // Rejection happened before any state change.
        assert!(Arc::ptr_eq(&before, &dispatcher.store.state()));

        dispatcher
            .send(
                SourceType::DownloadManager,
                Action::TimeEntriesReplace(Vec::new()),
            )
            .unwrap();
    }

    #[test]
    fn error_sends_obey_the_same_registry() {
        let dispatcher = dispatcher();
        let err = dispatcher
            .send_error(
                SourceType::Ui,
                ActionKind::TimeEntriesReplace,
                "download blew up",
                None,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::SourceNotAuthorized { .. }));

        dispatcher
            .send_error(
                SourceType::DownloadManager,
                ActionKind::TimeEntriesReplace,
                "download blew up",
                None,
            )
            .unwrap();
        assert!(dispatcher.store.state().request_info.had_errors);
    }

    #[test]
    fn restrictions_can_be_added_at_runtime() {
        let dispatcher = dispatcher();
        dispatcher.restrict(ActionKind::AuthResultChanged, SourceType::AuthManager);

        let err = dispatcher
            .send(
                SourceType::Ui,
                Action::AuthResultChanged(crate::request_info::AuthResult::Success),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::SourceNotAuthorized { .. }));
    }
}
