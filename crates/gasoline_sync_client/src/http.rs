//! HTTP transport abstraction.
//!
//! The actual HTTP client is abstracted via a trait so the embedder can
//! bring its own stack (reqwest, hyper, a WebView fetch bridge, …).
//! This crate ships a scriptable mock and a loopback client that routes
//! requests to an in-process handler, both used by the test suite.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A plain HTTP response, body already read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Creates a response with an explicit status.
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// `Err` means the request never produced a response (DNS, connect,
/// reset); a non-2xx status is returned as `Ok` and classified by the
/// caller. Implementations need no timeout handling of their own — the
/// sync client aborts slow requests externally.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response.
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: String,
    ) -> Result<HttpResponse, String>;
}

/// A captured request, for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL.
    pub url: String,
    /// Request headers, in send order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: String,
}

/// A scriptable mock HTTP client.
///
/// Responses are served in FIFO order; an exhausted script yields a
/// transport error, so a runaway loop fails loudly instead of hanging.
#[derive(Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queues a transport-level failure.
    pub fn push_transport_error(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// Returns all captured requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: String,
    ) -> Result<HttpResponse, String> {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.to_vec(),
            body,
        });
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("mock response script exhausted".into()))
    }
}

/// Handler side of the loopback transport.
pub trait LoopbackServer: Send + Sync {
    /// Handles a POST and returns the response.
    fn handle_post(&self, path: &str, body: &str) -> Result<HttpResponse, String>;
}

impl<S: LoopbackServer> LoopbackServer for std::sync::Arc<S> {
    fn handle_post(&self, path: &str, body: &str) -> Result<HttpResponse, String> {
        self.as_ref().handle_post(path, body)
    }
}

/// An HTTP client that routes requests directly to an in-process
/// [`LoopbackServer`], with no network in between.
pub struct LoopbackClient<S> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a loopback client around the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

#[async_trait]
impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    async fn post(
        &self,
        url: &str,
        _headers: &[(String, String)],
        body: String,
    ) -> Result<HttpResponse, String> {
        let path = url.find("/sync").map(|i| &url[i..]).unwrap_or(url);
        self.server.handle_post(path, &body)
    }
}
