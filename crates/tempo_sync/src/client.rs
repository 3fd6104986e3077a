//! The REST client for the remote time-tracking API.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::json;
use tempo_model::{RecordKind, RemoteId, RemoteOp, SyncRecord, TimeEntry, User};

use crate::changes::{ChangesEnvelope, UserRelatedRecords};
use crate::error::{SyncError, SyncResult};
use crate::transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, NoopObserver, ResponseObserver,
};

/// Value stamped into `created_with` on entries created by this client.
const CLIENT_NAME: &str = "tempo";

const USER_AGENT: &str = concat!("tempo/", env!("CARGO_PKG_VERSION"));

/// How a request authenticates.
enum Auth {
    /// No credentials; only valid for signups.
    None,
    /// The stored session token, as `Basic <token>:api_token`.
    Session,
    /// Explicit credentials, used once during login.
    Credentials(String, String),
}

/// Client for the versioned REST API.
///
/// The transport is pluggable so the embedding application decides how
/// bytes actually move; all request shaping, authentication and response
/// merging lives here. Mutating calls take `&mut record` and fold the
/// server echo back into it via [`SyncRecord::merge_remote`], so edits
/// made while a request was in flight survive.
pub struct SyncClient<T: HttpTransport> {
    transport: T,
    base_url: String,
    token: Option<String>,
    observer: Box<dyn ResponseObserver>,
}

impl<T: HttpTransport> SyncClient<T> {
    /// Creates a client rooted at `base_url` (the `/v8/` segment is
    /// appended here; pass the bare host).
    #[must_use]
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: format!("{}/v8/", base_url.trim_end_matches('/')),
            token: None,
            observer: Box::new(NoopObserver),
        }
    }

    /// Installs a session token for subsequent requests.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Installs a response observer, replacing the default no-op one.
    pub fn set_observer(&mut self, observer: Box<dyn ResponseObserver>) {
        self.observer = observer;
    }

    /// Creates `record` on the server and folds the echo back into it.
    ///
    /// Users are created through the signup endpoint; time entries are
    /// stamped with this client's `created_with` marker.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotSupported`] when the kind has no create endpoint,
    /// otherwise transport, HTTP and decoding failures.
    pub fn create<R: SyncRecord>(&self, record: &mut R) -> SyncResult<()> {
        require(R::KIND, RemoteOp::Create)?;
        let (path, auth) = if R::KIND == RecordKind::User {
            ("signups".to_owned(), Auth::None)
        } else {
            (R::KIND.endpoint().to_owned(), Auth::Session)
        };

        let mut payload = serde_json::to_value(&*record)?;
        if R::KIND == RecordKind::TimeEntry {
            if let Some(fields) = payload.as_object_mut() {
                fields.insert("created_with".into(), CLIENT_NAME.into());
            }
        }
        let body = json!({ (R::KIND.wire_key()): payload }).to_string();

        let response = self.execute(self.request(Method::Post, &path, Some(body), &auth))?;
        let server: R = unwrap_data(&response.body)?;
        record.merge_remote(server);
        Ok(())
    }

    /// Fetches one record by its server id.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotSupported`] when the kind has no read endpoint,
    /// otherwise transport, HTTP and decoding failures.
    pub fn get<R: SyncRecord>(&self, remote_id: RemoteId) -> SyncResult<R> {
        require(R::KIND, RemoteOp::Read)?;
        let path = single_record_path(R::KIND, remote_id);
        let response = self.execute(self.request(Method::Get, &path, None, &Auth::Session))?;
        unwrap_data(&response.body)
    }

    /// Fetches one record and applies `selector` to it before returning.
    /// Used to attach local linkage the wire form cannot carry.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SyncClient::get`].
    pub fn get_with<R, F>(&self, remote_id: RemoteId, selector: F) -> SyncResult<R>
    where
        R: SyncRecord,
        F: FnOnce(R) -> R,
    {
        self.get(remote_id).map(selector)
    }

    /// Lists the whole collection for `R`.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotSupported`] when the kind has no list endpoint,
    /// otherwise transport, HTTP and decoding failures.
    pub fn list<R: SyncRecord>(&self) -> SyncResult<Vec<R>> {
        require(R::KIND, RemoteOp::List)?;
        let response =
            self.execute(self.request(Method::Get, R::KIND.endpoint(), None, &Auth::Session))?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Lists the collection and applies `selector` to every element.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SyncClient::list`].
    pub fn list_with<R, F>(&self, selector: F) -> SyncResult<Vec<R>>
    where
        R: SyncRecord,
        F: Fn(R) -> R,
    {
        Ok(self.list()?.into_iter().map(selector).collect())
    }

    /// Lists time entries whose start falls inside `[start, end]`.
    ///
    /// # Errors
    ///
    /// Transport, HTTP and decoding failures.
    pub fn list_time_entries_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SyncResult<Vec<TimeEntry>> {
        let path = format!(
            "time_entries?start_date={}&end_date={}",
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        let response = self.execute(self.request(Method::Get, &path, None, &Auth::Session))?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Pushes the full record to the server and folds the echo back.
    ///
    /// # Errors
    ///
    /// [`SyncError::NoRemoteId`] when the record was never created,
    /// [`SyncError::NotSupported`] when the kind has no update endpoint,
    /// otherwise transport, HTTP and decoding failures.
    pub fn update<R: SyncRecord>(&self, record: &mut R) -> SyncResult<()> {
        require(R::KIND, RemoteOp::Update)?;
        let remote_id = record.remote_id().ok_or(SyncError::NoRemoteId {
            kind: R::KIND,
            id: record.id(),
        })?;
        let path = single_record_path(R::KIND, remote_id);
        let body = json!({ (R::KIND.wire_key()): &*record }).to_string();
        let response = self.execute(self.request(Method::Put, &path, Some(body), &Auth::Session))?;
        let server: R = unwrap_data(&response.body)?;
        record.merge_remote(server);
        Ok(())
    }

    /// Deletes one record on the server.
    ///
    /// # Errors
    ///
    /// [`SyncError::NoRemoteId`] when the record was never created,
    /// [`SyncError::NotSupported`] when the kind has no delete endpoint,
    /// otherwise transport and HTTP failures.
    pub fn delete<R: SyncRecord>(&self, record: &R) -> SyncResult<()> {
        self.delete_many(std::slice::from_ref(record))
    }

    /// Deletes a batch of records of one kind in a single round-trip,
    /// addressing them by comma-joined server ids. An empty batch is a
    /// no-op that never touches the network.
    ///
    /// # Errors
    ///
    /// [`SyncError::NoRemoteId`] when any record in the batch was never
    /// created (nothing is deleted in that case), [`SyncError::NotSupported`]
    /// when the kind has no delete endpoint, otherwise transport and HTTP
    /// failures.
    pub fn delete_many<R: SyncRecord>(&self, records: &[R]) -> SyncResult<()> {
        require(R::KIND, RemoteOp::Delete)?;
        if records.is_empty() {
            return Ok(());
        }
        let ids = records
            .iter()
            .map(|r| {
                r.remote_id()
                    .map(|id| id.to_string())
                    .ok_or(SyncError::NoRemoteId {
                        kind: R::KIND,
                        id: r.id(),
                    })
            })
            .collect::<SyncResult<Vec<String>>>()?
            .join(",");
        let path = format!("{}/{ids}", R::KIND.endpoint());
        self.execute(self.request(Method::Delete, &path, None, &Auth::Session))?;
        Ok(())
    }

    /// Logs in with explicit credentials. On success the returned user's
    /// API token (when the server includes one) becomes the session token
    /// for all subsequent requests.
    ///
    /// # Errors
    ///
    /// Transport, HTTP and decoding failures; invalid credentials surface
    /// as [`SyncError::HttpFailure`] with a 403 status.
    pub fn authenticate(&mut self, username: &str, password: &str) -> SyncResult<User> {
        let auth = Auth::Credentials(username.to_owned(), password.to_owned());
        let response = self.execute(self.request(Method::Get, "me", None, &auth))?;

        let envelope: serde_json::Value = serde_json::from_str(&response.body)?;
        let data = envelope.get("data").cloned().unwrap_or(envelope);
        if let Some(token) = data.get("api_token").and_then(|t| t.as_str()) {
            self.token = Some(token.to_owned());
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Pulls the user and everything related that changed since `since`
    /// (everything the server retains, when `None`).
    ///
    /// The returned [`UserRelatedRecords::server_time`] is the value to
    /// feed back as `since` on the next pull; using the server's clock
    /// keeps the cursor immune to device clock skew.
    ///
    /// # Errors
    ///
    /// Transport, HTTP and decoding failures.
    pub fn get_changes(&self, since: Option<DateTime<Utc>>) -> SyncResult<UserRelatedRecords> {
        let path = match since {
            Some(since) => format!("me?with_related_data=true&since={}", since.timestamp()),
            None => "me?with_related_data=true".to_owned(),
        };
        let response = self.execute(self.request(Method::Get, &path, None, &Auth::Session))?;
        let envelope: ChangesEnvelope = serde_json::from_str(&response.body)?;

        let data = envelope.data;
        let user = data.user;
        let time_entries = data
            .time_entries
            .into_iter()
            .map(|mut entry| {
                entry.user_id = user.common.id;
                entry
            })
            .collect();

        Ok(UserRelatedRecords {
            server_time: DateTime::from_timestamp(envelope.since, 0)
                .unwrap_or_else(|| DateTime::UNIX_EPOCH),
            user,
            workspaces: data.workspaces,
            clients: data.clients,
            projects: data.projects,
            tasks: data.tasks,
            tags: data.tags,
            time_entries,
        })
    }

    fn request(&self, method: Method, path: &str, body: Option<String>, auth: &Auth) -> HttpRequest {
        let mut headers = vec![
            ("Accept".to_owned(), "application/json".to_owned()),
            ("User-Agent".to_owned(), USER_AGENT.to_owned()),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_owned(), "application/json".to_owned()));
        }
        match auth {
            Auth::None => {}
            Auth::Session => {
                if let Some(token) = &self.token {
                    headers.push(("Authorization".to_owned(), basic(token, "api_token")));
                }
            }
            Auth::Credentials(user, pass) => {
                headers.push(("Authorization".to_owned(), basic(user, pass)));
            }
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }

    fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "issuing request");
        let response = self.transport.execute(request)?;
        // Observers run on every response, including failures.
        self.observer.on_response(&response);
        if !response.is_success() {
            tracing::warn!(status = response.status, "request failed");
            return Err(SyncError::HttpFailure {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{user}:{pass}")))
}

fn single_record_path(kind: RecordKind, remote_id: RemoteId) -> String {
    // The user endpoint is singular; the session identifies the record.
    if kind == RecordKind::User {
        "me".to_owned()
    } else {
        format!("{}/{remote_id}", kind.endpoint())
    }
}

fn require(kind: RecordKind, op: RemoteOp) -> SyncResult<()> {
    if kind.supports(op) {
        Ok(())
    } else {
        Err(SyncError::NotSupported { kind, op })
    }
}

/// Single-record responses arrive wrapped as `{"data": {...}}`.
fn unwrap_data<R: DeserializeOwned>(body: &str) -> SyncResult<R> {
    let envelope: serde_json::Value = serde_json::from_str(body)?;
    let data = envelope.get("data").cloned().unwrap_or(envelope);
    Ok(serde_json::from_value(data)?)
}
