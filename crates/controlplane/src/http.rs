//! Blocking HTTP implementation of [`RemoteClient`].

use std::time::Duration;

use declarative::{Method, RemoteClient, RemoteError};
use serde_json::Value as Json;

use crate::endpoint::{self, UnknownEndpoint};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const USER_AGENT: &str = concat!("hashistack/", env!("CARGO_PKG_VERSION"));

/// JSON client for the control-plane REST API.
///
/// Every request carries its own timeout, independent of any readiness
/// polling bound. Non-2xx responses are mapped to [`RemoteError`] instead of
/// transport failures so 404 can be recognized as absence.
///
/// # Example
///
/// ```no_run
/// use controlplane::HttpClient;
/// use declarative::RemoteClient;
///
/// let client = HttpClient::new("ovh-eu").unwrap();
/// let clusters = client.get("/cloud/project/nomad/cluster").unwrap();
/// println!("{clusters}");
/// ```
pub struct HttpClient {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, without trailing slash.
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client for a named endpoint or URL with the default timeout.
    pub fn new(endpoint: &str) -> Result<Self, UnknownEndpoint> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, UnknownEndpoint> {
        let base_url = endpoint::resolve(endpoint)?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        log::debug!("Control plane at {base_url} (timeout {}s)", timeout.as_secs());
        Ok(Self {
            agent,
            base_url,
            timeout,
        })
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the full URL for an API path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn finish(
        method: Method,
        path: &str,
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<Json, RemoteError> {
        let mut response = match result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) => {
                return map_response(path, code, "");
            }
            Err(e) => {
                log::debug!("{method} {path}: {e}");
                return Err(RemoteError::Transport(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        log::trace!("{method} {path} -> {status}");
        map_response(path, status, &body)
    }
}

impl RemoteClient for HttpClient {
    fn get(&self, path: &str) -> Result<Json, RemoteError> {
        let result = self
            .agent
            .get(&self.url(path))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .call();
        Self::finish(Method::Get, path, result)
    }

    fn post(&self, path: &str, body: &Json) -> Result<Json, RemoteError> {
        let result = self
            .agent
            .post(&self.url(path))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_json(body);
        Self::finish(Method::Post, path, result)
    }

    fn put(&self, path: &str, body: &Json) -> Result<Json, RemoteError> {
        let result = self
            .agent
            .put(&self.url(path))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send_json(body);
        Self::finish(Method::Put, path, result)
    }

    fn delete(&self, path: &str) -> Result<(), RemoteError> {
        let result = self
            .agent
            .delete(&self.url(path))
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .call();
        Self::finish(Method::Delete, path, result).map(|_| ())
    }
}

/// Map a status code and body text to a JSON result.
///
/// 404 is "not found", other non-2xx codes carry the API's `message` field
/// (or the raw text). An empty 2xx body decodes as `null`.
fn map_response(path: &str, status: u16, body: &str) -> Result<Json, RemoteError> {
    if status == 404 {
        return Err(RemoteError::NotFound {
            path: path.to_string(),
        });
    }
    if !(200..300).contains(&status) {
        return Err(RemoteError::Status {
            code: status,
            message: error_message(body),
        });
    }
    if body.trim().is_empty() {
        return Ok(Json::Null);
    }
    serde_json::from_str(body).map_err(|e| RemoteError::Malformed(e.to_string()))
}

fn error_message(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "no response body".to_string();
    }
    serde_json::from_str::<Json>(body)
        .ok()
        .and_then(|json| json.get("message").and_then(Json::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
