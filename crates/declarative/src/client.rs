//! Remote control-plane client abstraction
//!
//! The reconciler talks to the control plane only through [`RemoteClient`].
//! The HTTP implementation lives in the `controlplane` crate.
//!
//! # Testing
//!
//! With the `mock` feature (always on in this crate's tests), [`MockClient`]
//! serves scripted responses per method and path and records every request:
//!
//! ```
//! # #[cfg(feature = "mock")] {
//! use declarative::client::{Method, MockClient, RemoteClient};
//! use serde_json::json;
//!
//! let mock = MockClient::new();
//! mock.on(Method::Get, "/cloud/project/nomad/cluster/abc", json!({"status": "READY"}));
//!
//! let body = mock.get("/cloud/project/nomad/cluster/abc").unwrap();
//! assert_eq!(body["status"], "READY");
//! assert_eq!(mock.count(Method::Get, "/cloud/project/nomad/cluster/abc"), 1);
//! # }
//! ```

use std::fmt;

use serde_json::Value as Json;

use crate::error::RemoteError;

/// Blocking client for the remote control plane.
///
/// Implementations must be shareable across the executor's worker threads.
pub trait RemoteClient: Send + Sync {
    /// Fetch a resource or collection.
    fn get(&self, path: &str) -> Result<Json, RemoteError>;

    /// Create a resource in a collection.
    fn post(&self, path: &str, body: &Json) -> Result<Json, RemoteError>;

    /// Update a resource with a partial body.
    fn put(&self, path: &str, body: &Json) -> Result<Json, RemoteError>;

    /// Remove a resource.
    fn delete(&self, path: &str) -> Result<(), RemoteError>;
}

/// HTTP verb of a control-plane request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockClient, Request};

#[cfg(any(test, feature = "mock"))]
mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    use serde_json::Value as Json;

    use super::{Method, RemoteClient};
    use crate::error::RemoteError;

    type Response = Result<Json, RemoteError>;

    /// A request recorded by [`MockClient`]
    #[derive(Debug, Clone, PartialEq)]
    pub struct Request {
        pub method: Method,
        pub path: String,
        pub body: Option<Json>,
    }

    /// In-memory client serving scripted responses.
    ///
    /// Each method/path pair holds a queue of responses. Responses are
    /// served in order and the last one repeats. Unscripted requests fail
    /// with [`RemoteError::NotFound`]. Clones share scripts and the log.
    #[derive(Debug, Clone, Default)]
    pub struct MockClient {
        responses: Arc<Mutex<HashMap<(Method, String), VecDeque<Response>>>>,
        requests: Arc<Mutex<Vec<Request>>>,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    impl MockClient {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Script a successful response.
        pub fn on(&self, method: Method, path: &str, body: Json) -> &Self {
            self.push(method, path, Ok(body))
        }

        /// Script a failure.
        pub fn fail(&self, method: Method, path: &str, error: RemoteError) -> &Self {
            self.push(method, path, Err(error))
        }

        /// Script a sequence of responses served in order.
        pub fn sequence(&self, method: Method, path: &str, responses: Vec<Response>) -> &Self {
            for response in responses {
                self.push(method, path, response);
            }
            self
        }

        fn push(&self, method: Method, path: &str, response: Response) -> &Self {
            lock(&self.responses)
                .entry((method, path.to_string()))
                .or_default()
                .push_back(response);
            self
        }

        /// All requests made so far, in order.
        pub fn requests(&self) -> Vec<Request> {
            lock(&self.requests).clone()
        }

        /// Number of requests made for a method and path.
        pub fn count(&self, method: Method, path: &str) -> usize {
            lock(&self.requests)
                .iter()
                .filter(|r| r.method == method && r.path == path)
                .count()
        }

        /// Number of requests made with a method, any path.
        pub fn count_method(&self, method: Method) -> usize {
            lock(&self.requests)
                .iter()
                .filter(|r| r.method == method)
                .count()
        }

        fn respond(&self, method: Method, path: &str, body: Option<&Json>) -> Response {
            lock(&self.requests).push(Request {
                method,
                path: path.to_string(),
                body: body.cloned(),
            });

            let mut responses = lock(&self.responses);
            let Some(queue) = responses.get_mut(&(method, path.to_string())) else {
                return Err(RemoteError::NotFound {
                    path: path.to_string(),
                });
            };
            if queue.len() > 1 {
                queue.pop_front().unwrap_or(Ok(Json::Null))
            } else {
                queue.front().cloned().unwrap_or(Ok(Json::Null))
            }
        }
    }

    impl RemoteClient for MockClient {
        fn get(&self, path: &str) -> Result<Json, RemoteError> {
            self.respond(Method::Get, path, None)
        }

        fn post(&self, path: &str, body: &Json) -> Result<Json, RemoteError> {
            self.respond(Method::Post, path, Some(body))
        }

        fn put(&self, path: &str, body: &Json) -> Result<Json, RemoteError> {
            self.respond(Method::Put, path, Some(body))
        }

        fn delete(&self, path: &str) -> Result<(), RemoteError> {
            self.respond(Method::Delete, path, None).map(|_| ())
        }
    }
}
