use thiserror::Error;

/// Top-level error type for the `wapi-api` crate.
///
/// Only the session state machine raises errors on its own
/// (`NotAuthenticated`, `Uninitialized`). HTTP status codes are data:
/// the dispatcher hands every response back unmodified and the pager
/// records a halted page instead of failing. `Api` is reserved for the
/// domain helpers that interpret a response on the caller's behalf.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session state ───────────────────────────────────────────────
    /// A guarded operation was called before a successful login.
    #[error("Log in before calling the API method")]
    NotAuthenticated,

    /// The session has no base URL configured.
    #[error("Session has no base URL -- initialize it first")]
    Uninitialized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration error (unreadable or invalid certificate bundle).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A helper was given input the appliance would reject.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A helper received a non-success status it cannot interpret.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Local filesystem error (backup downloads).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `Deserialization` error carrying a short body preview.
    pub(crate) fn deserialization(err: &serde_json::Error, body: String) -> Self {
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }

    /// Returns `true` if logging in (again) might resolve this error.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::NotAuthenticated => true,
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_errors_are_not_transient() {
        assert!(!Error::NotAuthenticated.is_transient());
        assert!(!Error::Uninitialized.is_transient());
        assert!(Error::NotAuthenticated.is_auth_error());
        assert!(!Error::Uninitialized.is_auth_error());
    }

    #[test]
    fn api_status_classification() {
        let unavailable = Error::Api {
            status: 503,
            message: "busy".into(),
        };
        assert!(unavailable.is_transient());
        assert_eq!(unavailable.status(), Some(503));

        let unauthorized = Error::Api {
            status: 401,
            message: "Authorization Required".into(),
        };
        assert!(unauthorized.is_auth_error());
        assert!(!unauthorized.is_transient());
    }

    #[test]
    fn deserialization_preview_is_bounded() {
        let body = "x".repeat(1000);
        let Err(json_err) = serde_json::from_str::<serde_json::Value>(&body) else {
            panic!("expected a parse failure");
        };
        let Error::Deserialization { message, body: raw } = Error::deserialization(&json_err, body)
        else {
            panic!("expected Deserialization");
        };
        assert_eq!(raw.len(), 1000);
        assert!(message.len() < 400);
    }
}
