//! Durable user preferences, persisted as JSON across launches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempo_model::LocalId;

use crate::error::{StoreError, StoreResult};

/// Preferences that survive app restarts. Everything transient lives
/// in [`crate::RequestInfo`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Local id of the logged-in user, if any.
    pub user_id: Option<LocalId>,
    /// Watermark of the last completed incremental pull, carried across
    /// launches so the first pull after a restart stays cheap.
    pub get_changes_last_run: Option<DateTime<Utc>>,
    /// Whether new entries get the default tag applied.
    pub use_default_tag: bool,
    /// App version last seen by this install, for upgrade hooks.
    pub last_app_version: String,
    /// Whether the entry list groups similar entries.
    pub grouped_entries: bool,
    /// Whether starting a new entry prompts for a project first.
    pub choose_project_for_new: bool,
    /// Sort order of the project picker.
    pub project_sort: String,
    /// Whether the welcome screen is still pending.
    pub show_welcome: bool,
    /// Push notification token registered with the server.
    pub push_token: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_id: None,
            get_changes_last_run: None,
            use_default_tag: true,
            last_app_version: String::new(),
            grouped_entries: true,
            choose_project_for_new: false,
            project_sort: "clients".to_owned(),
            show_welcome: true,
            push_token: String::new(),
        }
    }
}

impl Settings {
    /// Decodes settings from their persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SettingsCorrupted`] when the payload is not
    /// valid settings JSON.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::SettingsCorrupted(e.to_string()))
    }

    /// Decodes persisted settings, falling back to defaults when the
    /// payload is absent or unreadable.
    #[must_use]
    pub fn load_or_default(json: Option<&str>) -> Self {
        match json {
            None => Self::default(),
            Some(raw) => Self::from_json(raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding unreadable settings");
                Self::default()
            }),
        }
    }

    /// Encodes settings for persistence.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Serialization of a plain struct with string keys cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Returns a copy with the given fields replaced. Fields the update
    /// leaves unset keep their current value.
    #[must_use]
    pub fn with(&self, update: SettingsUpdate) -> Self {
        let mut next = self.clone();
        if let Some(user_id) = update.user_id {
            next.user_id = user_id;
        }
        if let Some(last_run) = update.get_changes_last_run {
            next.get_changes_last_run = last_run;
        }
        if let Some(use_default_tag) = update.use_default_tag {
            next.use_default_tag = use_default_tag;
        }
        if let Some(version) = update.last_app_version {
            next.last_app_version = version;
        }
        if let Some(grouped) = update.grouped_entries {
            next.grouped_entries = grouped;
        }
        if let Some(choose) = update.choose_project_for_new {
            next.choose_project_for_new = choose;
        }
        if let Some(sort) = update.project_sort {
            next.project_sort = sort;
        }
        if let Some(welcome) = update.show_welcome {
            next.show_welcome = welcome;
        }
        if let Some(token) = update.push_token {
            next.push_token = token;
        }
        next
    }
}

/// Partial update for [`Settings`]. `None` means "keep the current
/// value"; nullable fields use a nested `Option` so that clearing and
/// keeping stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    /// New logged-in user, or `Some(None)` on logout.
    pub user_id: Option<Option<LocalId>>,
    /// New pull watermark, or `Some(None)` to forget it.
    pub get_changes_last_run: Option<Option<DateTime<Utc>>>,
    /// New default-tag preference.
    pub use_default_tag: Option<bool>,
    /// New last-seen app version.
    pub last_app_version: Option<String>,
    /// New grouping preference.
    pub grouped_entries: Option<bool>,
    /// New project-prompt preference.
    pub choose_project_for_new: Option<bool>,
    /// New project sort order.
    pub project_sort: Option<String>,
    /// New welcome-screen flag.
    pub show_welcome: Option<bool>,
    /// New push token.
    pub push_token: Option<String>,
}
