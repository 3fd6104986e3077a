//! Error types for the state store and dispatcher.

use std::fmt;

use crate::action::{ActionKind, SourceType};

/// Errors produced by the store and the action dispatcher.
// Display and Error are implemented by hand because `thiserror` would
// treat the spec-mandated `source` field as the error's cause, and
// `SourceType` is not an error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An action was sent from a source that is not allowed to emit it.
    SourceNotAuthorized {
        /// The action kind that was rejected.
        kind: ActionKind,
        /// The source that attempted the dispatch.
        source: SourceType,
        /// The source the kind is reserved for.
        registered: SourceType,
    },

    /// Persisted settings could not be decoded.
    SettingsCorrupted(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotAuthorized {
                kind,
                source,
                registered,
            } => write!(
                f,
                "source {source:?} is not authorized to send {kind:?} (reserved for {registered:?})"
            ),
            Self::SettingsCorrupted(msg) => {
                write!(f, "settings could not be decoded: {msg}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;
