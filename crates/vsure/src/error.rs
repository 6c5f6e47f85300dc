//! CLI error types with miette diagnostics.
//!
//! Maps `vsure_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vsure_api::Error as ApiError;
use vsure_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const UNAVAILABLE: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Verisure backend")]
    #[diagnostic(
        code(vsure::connection_failed),
        help(
            "Every configured mirror failed.\n\
             Check your network connection, or the `endpoints` list of your profile."
        )
    )]
    ConnectionFailed {
        #[source]
        source: ApiError,
    },

    #[error("The Verisure backend is unavailable: {reason}")]
    #[diagnostic(
        code(vsure::unavailable),
        help("This is a backend-side outage. Try again later.")
    )]
    Unavailable { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vsure::auth_failed),
        help(
            "Verify your username and password.\n\
             Run: vsure config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("This account requires multi-factor authentication")]
    #[diagnostic(
        code(vsure::mfa_required),
        help(
            "Run `vsure login` in an interactive terminal to enter the code.\n\
             Use `vsure login --trust` to skip this step on later logins."
        )
    )]
    MfaRequired,

    #[error("The session has expired")]
    #[diagnostic(code(vsure::session_expired), help("Run: vsure login"))]
    SessionExpired,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(vsure::no_credentials),
        help(
            "Configure credentials with: vsure config init\n\
             Or set VSURE_USERNAME and VSURE_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(vsure::not_found),
        help("Run: vsure {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(vsure::api_error))]
    Api(ApiError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vsure::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vsure::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vsure config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(vsure::config))]
    Config(Box<figment::Error>),

    #[error("Keyring access failed: {0}")]
    #[diagnostic(
        code(vsure::keyring),
        help("Store the password in the profile's password_env variable instead.")
    )]
    Keyring(#[from] keyring::Error),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(vsure::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Unavailable { .. } => exit_code::UNAVAILABLE,
            Self::AuthFailed { .. }
            | Self::MfaRequired
            | Self::SessionExpired
            | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ApiError → CliError mapping ─────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Request { .. } | ApiError::NoEndpoints => {
                CliError::ConnectionFailed { source: err }
            }

            ApiError::TemporarilyUnavailable | ApiError::Maintenance => CliError::Unavailable {
                reason: err.to_string(),
            },

            ApiError::Login { message } => CliError::AuthFailed { message },
            ApiError::MfaRequired => CliError::MfaRequired,
            ApiError::LoggedOut { .. } | ApiError::NotAuthenticated => CliError::SessionExpired,

            ApiError::UnknownOperation { name } => CliError::NotFound {
                resource_type: "operation".into(),
                identifier: name,
                list_command: "operations".into(),
            },

            ApiError::UnknownInstallation { giid } => CliError::NotFound {
                resource_type: "installation".into(),
                identifier: giid,
                list_command: "installations".into(),
            },

            ApiError::MissingVariable { .. }
            | ApiError::InvalidVariable { .. }
            | ApiError::UnexpectedVariables { .. }
            | ApiError::NoInstallation => CliError::Validation {
                field: "operation".into(),
                reason: err.to_string(),
            },

            other => CliError::Api(other),
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Figment(inner) => CliError::Config(inner),
            ConfigError::Keyring(inner) => CliError::Keyring(inner),
            ConfigError::Io(inner) => CliError::Io(inner),
            ConfigError::Serialization(inner) => CliError::Validation {
                field: "config".into(),
                reason: inner.to_string(),
            },
        }
    }
}
