//! The transport seam between the sync client and the actual network.

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::error::{SyncError, SyncResult};

/// HTTP verbs the remote API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl Method {
    /// The verb as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A fully prepared request, ready for a transport to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The verb.
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: String,
    /// Header name/value pairs, already in final form.
    pub headers: Vec<(String, String)>,
    /// JSON body, if the request carries one.
    pub body: Option<String>,
}

impl HttpRequest {
    /// The first value of the named header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A raw response as the transport saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Executes prepared requests. Implementations wrap whatever HTTP stack
/// the embedding application ships; tests use [`MockTransport`].
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] when no response was produced at
    /// all (connection refused, timeout). Non-2xx statuses are NOT errors
    /// at this level; the client checks them after observers have run.
    fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse>;
}

impl<T: HttpTransport> HttpTransport for std::sync::Arc<T> {
    fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        (**self).execute(request)
    }
}

/// Sees every response before status checking, success or failure.
/// Useful for rate-limit header tracking and request logging.
pub trait ResponseObserver: Send + Sync {
    /// Called once per response, in arrival order.
    fn on_response(&self, _response: &HttpResponse) {}
}

/// The default observer; does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ResponseObserver for NoopObserver {}

/// Records requests and replays canned responses, in order.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<SyncResult<HttpResponse>>>,
}

impl MockTransport {
    /// An empty mock; every request fails until responses are enqueued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with the given status and body.
    pub fn enqueue(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
    }

    /// Queues a transport-level failure.
    pub fn enqueue_error(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .push_back(Err(SyncError::Transport(message.into())));
    }

    /// Every request executed so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

impl HttpTransport for MockTransport {
    fn execute(&self, request: HttpRequest) -> SyncResult<HttpResponse> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::Transport("no canned response left".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_replays_in_order_and_records_requests() {
        let mock = MockTransport::new();
        mock.enqueue(200, "first");
        mock.enqueue(404, "second");

        let request = HttpRequest {
            method: Method::Get,
            url: "https://example.test/v8/me".into(),
            headers: vec![("Accept".into(), "application/json".into())],
            body: None,
        };

        let first = mock.execute(request.clone()).unwrap();
        assert_eq!((first.status, first.body.as_str()), (200, "first"));
        let second = mock.execute(request.clone()).unwrap();
        assert_eq!(second.status, 404);
        assert!(!second.is_success());

        assert!(mock.execute(request).is_err());
        assert_eq!(mock.requests().len(), 3);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            method: Method::Post,
            url: "https://example.test".into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Some("{}".into()),
        };
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("authorization"), None);
    }
}
