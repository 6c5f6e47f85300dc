use std::path::PathBuf;

use thiserror::Error;

/// One entry of a GraphQL `errors` array, tagged with the position of the
/// operation it belongs to inside the dispatched batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub index: usize,
    pub message: String,
    pub code: Option<String>,
}

/// Top-level error type for the `vsure-api` crate.
///
/// Every failure leaving a [`Session`](crate::Session) is exactly one of
/// these variants. Callers never need to look at HTTP status codes or HTML
/// bodies: the response classifier in [`validate`](crate::validate) maps
/// them here first.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Network-level failure (timeout, DNS, connection refused or reset).
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The endpoint list is empty.
    #[error("No backend endpoints configured")]
    NoEndpoints,

    // ── Authentication ──────────────────────────────────────────────
    /// Credential exchange rejected, or post-login bookkeeping failed.
    #[error("Login failed: {message}")]
    Login { message: String },

    /// The backend asked for a multi-factor step-up before issuing a token.
    #[error("Multi-factor authentication required")]
    MfaRequired,

    /// A previously valid session is no longer accepted.
    #[error("Logged out: {message}")]
    LoggedOut { message: String },

    // ── Backend outage states ───────────────────────────────────────
    /// "My Pages is temporarily unavailable".
    #[error("Backend is temporarily unavailable")]
    TemporarilyUnavailable,

    /// "My Pages - Maintenance".
    #[error("Backend is down for maintenance")]
    Maintenance,

    // ── Responses ───────────────────────────────────────────────────
    /// Non-success response that could not be mapped to a specific kind.
    #[error("Unexpected response (HTTP {status}): {}", preview(.body))]
    Response { status: u16, body: String },

    /// The body did not parse in the expected format.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String, body: String },

    /// The body parsed but carries an application-level error list.
    #[error("Backend rejected the request: {}", summarize(.errors))]
    Application { errors: Vec<BackendError> },

    // ── Session usage ───────────────────────────────────────────────
    /// The operation needs an authenticated session.
    #[error("Not authenticated -- call login() first")]
    NotAuthenticated,

    /// The operation needs an active installation but none is selected.
    #[error("No active installation selected")]
    NoInstallation,

    /// `set_active_installation` was given a giid this login does not own.
    #[error("Unknown installation: {giid}")]
    UnknownInstallation { giid: String },

    /// No catalog entry with this key.
    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    /// A caller-supplied variable slot was left empty.
    #[error("Operation {operation} is missing a value for '{slot}'")]
    MissingVariable { operation: String, slot: String },

    /// A caller-supplied value does not fit the slot's type.
    #[error("Invalid value for '{slot}' in {operation}: {reason}")]
    InvalidVariable {
        operation: String,
        slot: String,
        reason: String,
    },

    /// More caller values were supplied than the operation declares.
    #[error("Operation {operation} takes {expected} value(s), got {got}")]
    UnexpectedVariables {
        operation: String,
        expected: usize,
        got: usize,
    },

    // ── Local state ─────────────────────────────────────────────────
    /// Reading or writing the token cache file failed.
    #[error("Token cache {}: {source}", .path.display())]
    TokenStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if retrying the whole operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } | Self::TemporarilyUnavailable | Self::Maintenance => true,
            Self::Response { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the next mirror should be tried within the same call.
    ///
    /// Maintenance is backend-wide, so it is surfaced immediately.
    pub fn can_fail_over(&self) -> bool {
        match self {
            Self::Request { .. } | Self::TemporarilyUnavailable => true,
            Self::Response { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the request never reached the server.
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_connect())
    }

    /// Returns `true` if the session must be re-established from credentials.
    pub fn is_logged_out(&self) -> bool {
        matches!(self, Self::LoggedOut { .. })
    }

    /// Returns `true` for failed credential exchanges, including MFA step-up.
    pub fn is_login_error(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::MfaRequired)
    }

    /// Fold a failure of the credential exchange into [`Error::Login`].
    ///
    /// Errors that already describe the login outcome, maintenance, and
    /// local cache failures pass through unchanged.
    pub(crate) fn into_login_error(self) -> Self {
        match self {
            Self::Login { .. } | Self::MfaRequired | Self::Maintenance | Self::TokenStore { .. } => {
                self
            }
            other => Self::Login {
                message: other.to_string(),
            },
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Request { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw body retained for diagnostics.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Response { body, .. } | Self::MalformedResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

fn summarize(errors: &[BackendError]) -> String {
    match errors {
        [] => "no error details".into(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (+{} more)", first.message, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outage_states_are_retryable_but_maintenance_does_not_fail_over() {
        assert!(Error::TemporarilyUnavailable.can_fail_over());
        assert!(Error::Maintenance.is_retryable());
        assert!(!Error::Maintenance.can_fail_over());
    }

    #[test]
    fn server_errors_fail_over_client_errors_do_not() {
        let server = Error::Response {
            status: 502,
            body: String::new(),
        };
        let client = Error::Response {
            status: 404,
            body: String::new(),
        };
        assert!(server.can_fail_over());
        assert!(!client.can_fail_over());
        assert_eq!(client.status(), Some(404));
    }

    #[test]
    fn application_error_summary_counts_extra_entries() {
        let err = Error::Application {
            errors: vec![
                BackendError {
                    index: 0,
                    message: "first".into(),
                    code: None,
                },
                BackendError {
                    index: 1,
                    message: "second".into(),
                    code: None,
                },
            ],
        };
        assert_eq!(err.to_string(), "Backend rejected the request: first (+1 more)");
    }

    #[test]
    fn response_display_truncates_long_bodies() {
        let err = Error::Response {
            status: 500,
            body: "x".repeat(500),
        };
        assert!(err.to_string().len() < 260);
    }
}
