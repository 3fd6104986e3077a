//! Actions, their kind tags, and the sources allowed to send them.

use chrono::{DateTime, Utc};
use tempo_model::{DomainRecord, LocalId, TimeEntry};

use crate::request_info::{AuthResult, ServerRequest};
use crate::settings::SettingsUpdate;

/// Who is sending an action into the dispatcher.
///
/// Closed set of orchestrator roles; the dispatcher's authorization
/// registry maps action kinds to the single source allowed to emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// User-facing code reacting to direct input.
    Ui,
    /// The incremental sync orchestrator.
    SyncManager,
    /// The entry history download orchestrator.
    DownloadManager,
    /// The login/signup orchestrator.
    AuthManager,
    /// Test harnesses.
    Test,
}

/// Discriminant of [`Action`], used as the authorization registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Merge batch from an incremental pull.
    ReceivedFromServer,
    /// Page of older entries from the history download.
    ReceivedFromDownload,
    /// A single entry created or edited locally.
    TimeEntryPut,
    /// A local entry deletion.
    TimeEntryDelete,
    /// Wholesale replacement of the entry collection.
    TimeEntriesReplace,
    /// A server round-trip began.
    RequestStarted,
    /// A server round-trip ended.
    RequestFinished,
    /// The outcome of an authentication attempt changed.
    AuthResultChanged,
    /// Durable preferences changed.
    SettingsChanged,
    /// A sync failure not tied to any other kind.
    SyncError,
}

/// Everything that can change the state, as a value.
///
/// Failures travel through the same queue as successes: an operation that
/// could not complete dispatches [`Action::Error`] tagged with the kind it
/// would otherwise have sent, so authorization and ordering apply equally
/// to both paths.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Records pulled from the server, with the server's own timestamp
    /// for advancing the changes watermark.
    ReceivedFromServer {
        /// The heterogeneous merge batch.
        records: Vec<DomainRecord>,
        /// Server-side "now", if the response carried one.
        server_time: Option<DateTime<Utc>>,
    },
    /// One page of older entries from the history download.
    ReceivedFromDownload {
        /// The downloaded entries.
        entries: Vec<TimeEntry>,
        /// Whether the server has yet older entries.
        has_more: bool,
    },
    /// Insert or overwrite one entry.
    TimeEntryPut(TimeEntry),
    /// Delete one entry.
    TimeEntryDelete {
        /// The entry to delete.
        id: LocalId,
        /// When the deletion happened; carried in the action so the
        /// reducer stays deterministic.
        at: DateTime<Utc>,
    },
    /// Replace the whole entry collection.
    TimeEntriesReplace(Vec<TimeEntry>),
    /// A server round-trip began.
    RequestStarted(ServerRequest),
    /// A server round-trip ended.
    RequestFinished(ServerRequest),
    /// The outcome of an authentication attempt changed.
    AuthResultChanged(AuthResult),
    /// Apply a preferences patch.
    SettingsChanged(SettingsUpdate),
    /// An operation failed.
    Error {
        /// The kind of the operation that failed.
        kind: ActionKind,
        /// Human-readable failure description.
        message: String,
        /// The record the failure relates to, if any.
        id: Option<LocalId>,
    },
}

impl Action {
    /// The kind tag used for authorization. Error actions report the kind
    /// of the operation that failed, not a separate error kind.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ReceivedFromServer { .. } => ActionKind::ReceivedFromServer,
            Action::ReceivedFromDownload { .. } => ActionKind::ReceivedFromDownload,
            Action::TimeEntryPut(_) => ActionKind::TimeEntryPut,
            Action::TimeEntryDelete { .. } => ActionKind::TimeEntryDelete,
            Action::TimeEntriesReplace(_) => ActionKind::TimeEntriesReplace,
            Action::RequestStarted(_) => ActionKind::RequestStarted,
            Action::RequestFinished(_) => ActionKind::RequestFinished,
            Action::AuthResultChanged(_) => ActionKind::AuthResultChanged,
            Action::SettingsChanged(_) => ActionKind::SettingsChanged,
            Action::Error { kind, .. } => *kind,
        }
    }
}
