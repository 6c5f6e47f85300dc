use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Prefix the backend expects in front of the username inside the Basic
/// auth pair.
const BASIC_AUTH_USER_PREFIX: &str = "CPE/";

/// Username and password for one account. Immutable after construction.
///
/// The password may be absent when the caller only means to resume or end
/// a cached session; a credential exchange then fails with
/// [`Error::Login`].
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: Option<SecretString>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password: Some(password),
        }
    }

    /// Credentials that can resume a cached token but never log in.
    pub fn username_only(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub(crate) fn password(&self) -> Result<&SecretString, Error> {
        self.password.as_ref().ok_or_else(|| Error::Login {
            message: format!("no password available for {}", self.username),
        })
    }

    /// `Authorization` header value for the credential exchange:
    /// `Basic base64("CPE/<username>:<password>")`.
    pub(crate) fn basic_authorization(&self) -> Result<SecretString, Error> {
        let pair = format!(
            "{BASIC_AUTH_USER_PREFIX}{}:{}",
            self.username,
            self.password()?.expose_secret()
        );
        Ok(SecretString::from(format!("Basic {}", STANDARD.encode(pair))))
    }
}

/// Where the session currently is in its authentication lifecycle.
///
/// ```text
/// Unauthenticated -> Authenticating -> [AwaitingMfaChallenge] -> Authenticated
///                                                                  |
///                          LoggedOut (server revoked) <------------+
///                          Unauthenticated (logout)   <------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    /// Credentials were accepted but a second factor is required.
    AwaitingMfaChallenge,
    Authenticated,
    /// The backend reported the session as invalid mid-use.
    LoggedOut,
}

impl AuthState {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Delivery channel for the multi-factor challenge code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MfaChannel {
    #[default]
    Phone,
    Email,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_authorization_prefixes_username() {
        let creds = Credentials::new("user@example.com", SecretString::from("hunter2"));
        let decoded = creds
            .basic_authorization()
            .ok()
            .and_then(|h| h.expose_secret().strip_prefix("Basic ").map(str::to_owned))
            .and_then(|e| STANDARD.decode(e).ok())
            .and_then(|d| String::from_utf8(d).ok());
        assert_eq!(decoded.as_deref(), Some("CPE/user@example.com:hunter2"));
    }

    #[test]
    fn username_only_cannot_build_authorization() {
        let creds = Credentials::username_only("user@example.com");
        assert!(!creds.has_password());
        assert!(matches!(
            creds.basic_authorization(),
            Err(Error::Login { message }) if message.contains("user@example.com")
        ));
    }

    #[test]
    fn mfa_channel_parses_from_lowercase() {
        assert_eq!("email".parse::<MfaChannel>().ok(), Some(MfaChannel::Email));
        assert_eq!(MfaChannel::Phone.to_string(), "phone");
    }
}
