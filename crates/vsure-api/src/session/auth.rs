// Authentication lifecycle
//
// Credential exchange, cached-token resumption, multi-factor step-up,
// refresh and logout. A login only ends in `Authenticated` once both the
// token and the installation list are in hand; every partial failure rolls
// back to `Unauthenticated`.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{Installation, Session};
use crate::auth::AuthState;
use crate::error::Error;
use crate::failover::Failover;
use crate::transport::TransportRequest;
use crate::validate::{BodyFormat, Envelope};

const LOGIN_PATH: &str = "/auth/login";
const MFA_PATH: &str = "/auth/mfa";
const MFA_VALIDATE_PATH: &str = "/auth/mfa/validate";
const TRUST_PATH: &str = "/auth/trust";
const TOKEN_PATH: &str = "/auth/token";
const LOGOUT_PATH: &str = "/auth/logout";

/// Marker in a login response that asks for a second factor.
const STEP_UP_MARKER: &str = "stepUpToken";

impl Session {
    /// Log in with credentials, then fetch installations.
    ///
    /// Each mirror is tried in order. Returns the installation list on
    /// success. Fails with [`Error::MfaRequired`] when the account needs a
    /// second factor; follow up with [`request_mfa`](Self::request_mfa) and
    /// [`validate_mfa`](Self::validate_mfa).
    pub async fn login(&mut self) -> Result<Vec<Installation>, Error> {
        debug!(username = self.username(), "logging in with credentials");
        self.state = AuthState::Authenticating;
        self.token = Default::default();

        match self.exchange_credentials().await {
            Ok(()) => {}
            Err(Error::MfaRequired) => {
                info!("multi-factor authentication required");
                self.state = AuthState::AwaitingMfaChallenge;
                return Err(Error::MfaRequired);
            }
            Err(e) => {
                self.reset();
                return Err(e.into_login_error());
            }
        }

        self.finish_login().await.map_err(Error::into_login_error)
    }

    /// Resume from the cached token without sending credentials.
    ///
    /// A missing cache fails with [`Error::LoggedOut`]. If the backend
    /// rejects the cached token (logged out or any login error) the cache
    /// file is deleted; other failures leave it in place.
    pub async fn login_with_cached_token(&mut self) -> Result<Vec<Installation>, Error> {
        let Some(token) = self.store.load()? else {
            return Err(Error::LoggedOut {
                message: "no cached session token".into(),
            });
        };
        debug!("resuming session from cached token");
        self.state = AuthState::Authenticating;
        self.token = token;

        match self.finish_login().await {
            Ok(installations) => Ok(installations),
            Err(err) => {
                if err.is_logged_out() || err.is_login_error() {
                    info!(error = %err, "cached session rejected; discarding cache");
                    self.discard_token();
                }
                Err(err)
            }
        }
    }

    /// Resume from cache when possible, otherwise log in with credentials.
    pub async fn authenticate(&mut self) -> Result<Vec<Installation>, Error> {
        match self.login_with_cached_token().await {
            Ok(installations) => Ok(installations),
            Err(err) if err.is_logged_out() || err.is_login_error() => self.login().await,
            Err(err) => Err(err),
        }
    }

    /// Ask the backend to send a one-time code over the configured channel.
    pub async fn request_mfa(&mut self) -> Result<(), Error> {
        self.ensure_awaiting_mfa()?;
        debug!(channel = %self.mfa_channel, "requesting multi-factor code");
        let channel = self.mfa_channel.to_string();
        let request = TransportRequest::post(MFA_PATH).query(&[("type", channel.as_str())]);
        self.execute(request, BodyFormat::Json, Envelope::None, Failover::ConnectOnly)
            .await
            .map(drop)
            .map_err(Error::into_login_error)
    }

    /// Exchange the one-time code for a session token, then fetch
    /// installations. Any failure rolls back to `Unauthenticated`.
    pub async fn validate_mfa(&mut self, code: &str) -> Result<Vec<Installation>, Error> {
        self.ensure_awaiting_mfa()?;
        debug!("validating multi-factor code");
        let request = TransportRequest::post(MFA_VALIDATE_PATH).json(json!({ "token": code }));
        let exchanged = self
            .execute(request, BodyFormat::Json, Envelope::None, Failover::ConnectOnly)
            .await;
        if let Err(e) = exchanged {
            self.reset();
            return Err(e.into_login_error());
        }
        self.state = AuthState::Authenticating;
        self.finish_login().await.map_err(Error::into_login_error)
    }

    /// Ask the backend to skip multi-factor for this client from now on.
    pub async fn trust_device(&mut self) -> Result<(), Error> {
        self.ensure_authenticated()?;
        let request = TransportRequest::post(TRUST_PATH);
        let result = self
            .execute(request, BodyFormat::Json, Envelope::None, Failover::ConnectOnly)
            .await;
        self.guard(result)?;
        self.persist_token()
    }

    /// Extend the session. New cookies are merged into the token and the
    /// token is persisted again.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.ensure_authenticated()?;
        debug!("refreshing session token");
        let request = TransportRequest::get(TOKEN_PATH);
        let result = self
            .execute(request, BodyFormat::Json, Envelope::None, Failover::Any)
            .await;
        self.guard(result)?;
        self.persist_token()
    }

    /// End the session.
    ///
    /// The server call is best effort and its failure is only logged.
    /// Local state is always cleared and the cache file removed. Calling
    /// this more than once is harmless. A session that never logged in
    /// ends the cached token instead, if there is one.
    pub async fn logout(&mut self) {
        if self.token.is_empty() {
            if let Ok(Some(cached)) = self.store.load() {
                self.token = cached;
            }
        }
        if !self.token.is_empty() {
            let request = TransportRequest::new(Method::DELETE, LOGOUT_PATH);
            if let Err(e) = self
                .execute(request, BodyFormat::Text, Envelope::None, Failover::Any)
                .await
            {
                warn!(error = %e, "server-side logout failed; clearing local session anyway");
            }
        }
        self.discard_token();
        self.installations.clear();
        self.active = None;
        self.state = AuthState::Unauthenticated;
        info!("logged out");
    }

    // ── Helpers ──────────────────────────────────────────────────────

    async fn exchange_credentials(&mut self) -> Result<(), Error> {
        let basic = self.credentials.basic_authorization()?;
        let mut authorization =
            HeaderValue::from_str(basic.expose_secret()).map_err(|_| Error::Login {
                message: "credentials cannot be encoded as a header".into(),
            })?;
        authorization.set_sensitive(true);

        let request = TransportRequest::post(LOGIN_PATH).header(AUTHORIZATION, authorization);
        let body = self
            .execute(request, BodyFormat::Json, Envelope::None, Failover::Any)
            .await?;

        if body.get(STEP_UP_MARKER).is_some() {
            return Err(Error::MfaRequired);
        }
        Ok(())
    }

    /// Fetch installations, select one, persist the token. Rolls back to
    /// `Unauthenticated` on any failure.
    async fn finish_login(&mut self) -> Result<Vec<Installation>, Error> {
        let result = self.load_installations().await;
        let result = match result {
            Ok(()) => self.persist_token(),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.reset();
            return Err(e);
        }

        self.state = AuthState::Authenticated;
        info!(
            installations = self.installations.len(),
            mirror = %self.preferred_endpoint(),
            "logged in"
        );
        Ok(self.installations.clone())
    }

    fn ensure_awaiting_mfa(&self) -> Result<(), Error> {
        if self.state == AuthState::AwaitingMfaChallenge {
            Ok(())
        } else {
            Err(Error::Login {
                message: "no multi-factor challenge is pending; call login() first".into(),
            })
        }
    }

    /// Back to a clean `Unauthenticated` state. The cache file is kept.
    fn reset(&mut self) {
        self.token = Default::default();
        self.installations.clear();
        self.active = None;
        self.state = AuthState::Unauthenticated;
    }
}

