use std::fmt;

/// Which way an external capability failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// The capability answered 429.
    RateLimited,
    /// Credentials were missing or rejected (401/403).
    Unauthorized,
    /// The capability answered with a 5xx or another non-success status.
    ServerError,
    /// The request never completed (DNS, TLS, connection reset, ...).
    Unreachable,
    /// The capability answered 2xx but the body was not what we expected.
    InvalidResponse,
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpstreamKind::RateLimited => "rate limited",
            UpstreamKind::Unauthorized => "authentication rejected",
            UpstreamKind::ServerError => "server error",
            UpstreamKind::Unreachable => "unreachable",
            UpstreamKind::InvalidResponse => "invalid response",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{service} {kind}: {message}")]
    Upstream {
        service: &'static str,
        kind: UpstreamKind,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for building an [`CoreError::Upstream`] value.
    pub fn upstream(service: &'static str, kind: UpstreamKind, message: impl Into<String>) -> Self {
        CoreError::Upstream {
            service,
            kind,
            message: message.into(),
        }
    }
}
