//! Error types for reconciliation.
//!
//! Errors are categorized so callers can decide retry policy and give
//! appropriate feedback. The reconciler itself never retries.

use std::fmt;
use std::time::Duration;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a remote control-plane client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The addressed resource does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// Path that was requested.
        path: String,
    },

    /// Non-2xx response other than 404.
    #[error("HTTP {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response text or reason.
        message: String,
    },

    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body was not the expected JSON.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Whether this is the "not found" class.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether a caller could reasonably try again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { code, .. } => *code >= 500 || *code == 429,
            Self::NotFound { .. } | Self::Malformed(_) => false,
        }
    }
}

/// Categories of reconciler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller bug: invalid spec or registry misuse (never retried).
    Local,
    /// Remote control-plane or transport failure.
    Remote,
    /// Change needs destroy-and-recreate.
    Replace,
    /// Readiness polling timed out or observed failure.
    Poll,
    /// Interrupted by the caller.
    Cancelled,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Local => "Invalid resource definition",
            Self::Remote => "Control-plane request failed",
            Self::Replace => "Immutable attribute changed",
            Self::Poll => "Resource did not become ready",
            Self::Cancelled => "Operation cancelled",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Local => "Fix the manifest and run plan again",
            Self::Remote => "Check the endpoint and the control-plane status, then retry",
            Self::Replace => "Destroy and recreate the resource to apply this change",
            Self::Poll => {
                "The resource exists remotely; the next apply replaces a partially created one, so check it with `show --refresh` or remove it with `destroy`"
            }
            Self::Cancelled => {
                "Resources may still be provisioning remotely; the next apply replaces a partially created one, so check it with `show --refresh` or remove it with `destroy`"
            }
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Desired state violates the schema.
    #[error("{kind}: attribute `{attribute}` {problem}")]
    Schema {
        /// Resource kind.
        kind: String,
        /// Offending attribute.
        attribute: String,
        /// What is wrong with it.
        problem: String,
    },

    /// Remote call failed or returned an unusable body.
    #[error("{operation} {path} failed: {source}")]
    RemoteApi {
        /// HTTP verb.
        operation: &'static str,
        /// Request path.
        path: String,
        /// Underlying client error.
        #[source]
        source: RemoteError,
    },

    /// A force-replace attribute differs from the last-known state.
    #[error("{kind}: changing `{attribute}` requires replacing the resource")]
    ImmutableFieldChanged {
        /// Resource kind.
        kind: String,
        /// Offending attribute.
        attribute: String,
    },

    /// Polling exhausted its bound.
    #[error(
        "timed out after {}s waiting for {id} to become ready{}",
        .elapsed.as_secs(),
        last_error_suffix(.last_error)
    )]
    PollTimeout {
        /// Remote ID.
        id: String,
        /// Time spent polling.
        elapsed: Duration,
        /// Last read failure seen while polling.
        last_error: Option<String>,
    },

    /// Polling observed a terminal-failure status.
    #[error("{id} reached failure status {status}")]
    PollFailed {
        /// Remote ID.
        id: String,
        /// Raw status as reported.
        status: String,
    },

    /// Polling was interrupted by the caller.
    #[error("cancelled while waiting for {id}")]
    Cancelled {
        /// Remote ID.
        id: String,
    },

    /// Kind not present in the registry.
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    /// Kind registered more than once.
    #[error("resource kind registered twice: {0}")]
    DuplicateKind(String),

    /// Import of a resource that does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Resource kind.
        kind: String,
        /// Remote ID.
        id: String,
    },
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_deref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

impl Error {
    /// Create a schema error.
    pub fn schema(
        kind: impl Into<String>,
        attribute: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::Schema {
            kind: kind.into(),
            attribute: attribute.into(),
            problem: problem.into(),
        }
    }

    /// Create a remote API error.
    pub fn remote(operation: &'static str, path: impl Into<String>, source: RemoteError) -> Self {
        Self::RemoteApi {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Schema { .. }
            | Error::UnknownKind(_)
            | Error::DuplicateKind(_)
            | Error::NotFound { .. } => ErrorCategory::Local,
            Error::RemoteApi { .. } => ErrorCategory::Remote,
            Error::ImmutableFieldChanged { .. } => ErrorCategory::Replace,
            Error::PollTimeout { .. } | Error::PollFailed { .. } => ErrorCategory::Poll,
            Error::Cancelled { .. } => ErrorCategory::Cancelled,
        }
    }

    /// Whether a caller could reasonably try the same call again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RemoteApi { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Remote ID of a resource that exists despite this error.
    ///
    /// Set for poll outcomes after a successful create or update, so the
    /// caller can keep tracking the resource.
    #[must_use]
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            Error::PollTimeout { id, .. }
            | Error::PollFailed { id, .. }
            | Error::Cancelled { id } => Some(id),
            _ => None,
        }
    }
}
