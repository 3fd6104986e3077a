//! Bookkeeping for in-flight server requests and sync cursors.

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use tempo_model::LocalId;

/// How a session was (or is being) established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    /// Username and password login.
    Password,
    /// API-token login.
    Token,
    /// Account creation.
    Signup,
}

/// A server round-trip the app can have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRequest {
    /// Paged download of older time entries.
    DownloadEntries,
    /// Incremental pull of everything changed since the last run.
    GetChanges,
    /// Initial full pull after login.
    GetCurrentState,
    /// Session establishment.
    Authenticate(AuthKind),
}

/// Outcome of the most recent authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthResult {
    /// No attempt has been made yet.
    #[default]
    None,
    /// An attempt is currently running.
    Authenticating,
    /// The last attempt succeeded.
    Success,
    /// The server rejected the credentials.
    InvalidCredentials,
    /// The attempt failed before reaching the server.
    NetworkError,
    /// The attempt failed for an unexpected reason.
    SystemError,
}

/// How far back the first incremental pull reaches when the app has
/// never synced before.
const FIRST_GET_CHANGES_REACH_DAYS: i64 = 5;

/// Transient request state, kept out of [`crate::Settings`] so it is
/// never persisted across launches.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestInfo {
    /// Requests currently in flight.
    pub running: Vec<ServerRequest>,
    /// Whether the server still has older entries to download.
    pub has_more_entries: bool,
    /// Whether the most recent request failed.
    pub had_errors: bool,
    /// Message and related record for the most recent failure.
    pub error_info: Option<(String, LocalId)>,
    /// Exclusive upper bound of the next entry download page.
    pub download_from: DateTime<Utc>,
    /// Upper bound the page after that will use. Never later than
    /// [`RequestInfo::download_from`].
    pub next_download_from: DateTime<Utc>,
    /// Timestamp of the last successful incremental pull.
    pub get_changes_last_run: DateTime<Utc>,
    /// Outcome of the most recent authentication attempt.
    pub auth_result: AuthResult,
}

impl RequestInfo {
    /// The state before any request has run. The download cursor starts
    /// at the beginning of the next day so that today's entries are
    /// covered by the first page.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        let tomorrow = (now.date_naive() + Days::new(1))
            .and_time(NaiveTime::MIN)
            .and_utc();
        Self {
            running: Vec::new(),
            has_more_entries: true,
            had_errors: false,
            error_info: None,
            download_from: tomorrow,
            next_download_from: tomorrow,
            get_changes_last_run: now - Duration::days(FIRST_GET_CHANGES_REACH_DAYS),
            auth_result: AuthResult::None,
        }
    }

    /// Returns a copy with the given fields replaced. Fields the update
    /// leaves unset keep their current value, so an empty update is a
    /// no-op. The cursor invariant `next_download_from <= download_from`
    /// is restored by clamping after the update is applied.
    #[must_use]
    pub fn with(&self, update: RequestInfoUpdate) -> Self {
        let mut next = self.clone();
        if let Some(running) = update.running {
            next.running = running;
        }
        if let Some(has_more) = update.has_more_entries {
            next.has_more_entries = has_more;
        }
        if let Some(had_errors) = update.had_errors {
            next.had_errors = had_errors;
        }
        if let Some(error_info) = update.error_info {
            next.error_info = error_info;
        }
        if let Some(download_from) = update.download_from {
            next.download_from = download_from;
        }
        if let Some(next_download_from) = update.next_download_from {
            next.next_download_from = next_download_from;
        }
        if let Some(last_run) = update.get_changes_last_run {
            next.get_changes_last_run = last_run;
        }
        if let Some(auth_result) = update.auth_result {
            next.auth_result = auth_result;
        }
        if next.next_download_from > next.download_from {
            next.next_download_from = next.download_from;
        }
        next
    }

    /// Whether the given request is currently in flight.
    #[must_use]
    pub fn is_running(&self, request: ServerRequest) -> bool {
        self.running.contains(&request)
    }
}

/// Partial update for [`RequestInfo`]. `None` means "keep the current
/// value"; for [`RequestInfoUpdate::error_info`] the inner `Option`
/// distinguishes clearing the error from keeping it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInfoUpdate {
    /// New set of in-flight requests.
    pub running: Option<Vec<ServerRequest>>,
    /// New value for the more-entries flag.
    pub has_more_entries: Option<bool>,
    /// New value for the error flag.
    pub had_errors: Option<bool>,
    /// New error details, or `Some(None)` to clear them.
    pub error_info: Option<Option<(String, LocalId)>>,
    /// New download cursor.
    pub download_from: Option<DateTime<Utc>>,
    /// New follow-up download cursor.
    pub next_download_from: Option<DateTime<Utc>>,
    /// New incremental-pull watermark.
    pub get_changes_last_run: Option<DateTime<Utc>>,
    /// New authentication outcome.
    pub auth_result: Option<AuthResult>,
}

impl RequestInfoUpdate {
    /// Marks `request` as started on top of the current running set.
    #[must_use]
    pub fn starting(info: &RequestInfo, request: ServerRequest) -> Self {
        let mut running = info.running.clone();
        if !running.contains(&request) {
            running.push(request);
        }
        Self {
            running: Some(running),
            ..Self::default()
        }
    }

    /// Marks `request` as finished on top of the current running set.
    #[must_use]
    pub fn finishing(info: &RequestInfo, request: ServerRequest) -> Self {
        let running = info
            .running
            .iter()
            .copied()
            .filter(|r| *r != request)
            .collect();
        Self {
            running: Some(running),
            ..Self::default()
        }
    }
}
