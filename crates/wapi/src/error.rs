//! CLI error types with miette diagnostics.
//!
//! Maps library and config errors into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use wapi_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(wapi::connection_failed),
        help(
            "Check that the grid manager is reachable.\n\
             If it uses a self-signed certificate, pass --ca-bundle or --insecure (-k)."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {reason}")]
    #[diagnostic(
        code(wapi::tls_error),
        help("Point --ca-bundle (or ca_bundle in your profile) at a readable PEM file.")
    )]
    TlsError { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(wapi::timeout),
        help("Increase the timeout with --timeout or check grid manager load.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login rejected for profile '{profile}'")]
    #[diagnostic(
        code(wapi::auth_failed),
        help(
            "Verify the username and password.\n\
             Run: wapi config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(wapi::no_credentials),
        help(
            "Set username in the profile or WAPI_USERNAME, and the password \
             via WAPI_PASSWORD or: wapi config set-password"
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(wapi::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(wapi::unexpected_response),
        help("Check that the URL points at a WAPI endpoint, including the version (…/wapi/v2.12).")
    )]
    UnexpectedResponse { message: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(wapi::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    // ── Validation / Configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wapi::validation))]
    Validation { field: String, reason: String },

    #[error("No WAPI URL configured for profile '{profile}'")]
    #[diagnostic(
        code(wapi::no_config),
        help(
            "Pass --url or add a [profiles.{profile}] section to\n\
             {path}"
        )
    )]
    NoConfig { profile: String, path: String },

    #[error(transparent)]
    #[diagnostic(code(wapi::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::ApiError { status, .. } => match status {
                401 => exit_code::AUTH,
                403 => exit_code::PERMISSION,
                404 => exit_code::NOT_FOUND,
                _ => exit_code::GENERAL,
            },
            Self::Validation { .. } | Self::NoConfig { .. } | Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── wapi_api::Error → CliError ───────────────────────────────────────

impl From<wapi_api::Error> for CliError {
    fn from(err: wapi_api::Error) -> Self {
        use wapi_api::Error;

        match err {
            Error::NotAuthenticated => CliError::AuthFailed {
                profile: "current".into(),
            },
            Error::Uninitialized => CliError::NoConfig {
                profile: "current".into(),
                path: wapi_config::config_path().display().to_string(),
            },
            Error::Transport(e) if e.is_timeout() => CliError::Timeout,
            Error::Transport(e) => CliError::ConnectionFailed {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                source: Box::new(e),
            },
            Error::InvalidUrl(e) => CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },
            Error::Tls(reason) => CliError::TlsError { reason },
            Error::Deserialization { message, .. } => CliError::UnexpectedResponse { message },
            Error::Validation { field, reason } => CliError::Validation { field, reason },
            Error::Api { status, message } => CliError::ApiError { status, message },
            Error::Io(e) => CliError::Io(e),
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}
