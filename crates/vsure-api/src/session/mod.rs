// Session: one authenticated conversation with the backend.
//
// Owns the credentials, the mirror order, the session token and the
// installation selection. Every method takes `&mut self`, so one session
// serves one call at a time. Callers that need concurrency use one session
// per task.
//
// The lifecycle methods (login, MFA, refresh, logout) live in `auth.rs`,
// installation handling in `installations.rs`, GraphQL dispatch in
// `dispatch.rs`. This module holds construction, the headers every request
// carries, and token bookkeeping.

mod auth;
mod dispatch;
mod installations;

use std::path::PathBuf;

use reqwest::header::{ACCEPT, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::warn;
use url::Url;

pub use installations::{Address, Installation};

use crate::auth::{AuthState, Credentials, MfaChannel};
use crate::endpoint::EndpointSelector;
use crate::error::Error;
use crate::failover::{self, Failover};
use crate::token::{SessionToken, TokenStore};
use crate::transport::{Transport, TransportConfig, TransportRequest};
use crate::validate::{BodyFormat, Envelope};

const APPLICATION_ID: HeaderName = HeaderName::from_static("application_id");
const APPLICATION_ID_VALUE: &str = "PS_PYTHON";

/// Everything a [`Session`] needs besides credentials.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Interchangeable mirrors, preferred first. Empty means the
    /// production mirrors.
    pub endpoints: Vec<Url>,
    /// Which installation becomes active after login.
    pub installation_index: usize,
    /// Token cache file. `None` disables persistence.
    pub token_path: Option<PathBuf>,
    pub transport: TransportConfig,
    pub mfa_channel: MfaChannel,
}

/// A client session against the backend.
///
/// ```no_run
/// # async fn run() -> Result<(), vsure_api::Error> {
/// use secrecy::SecretString;
/// use vsure_api::{Credentials, Session, SessionConfig};
///
/// let creds = Credentials::new("me@example.com", SecretString::from("pw"));
/// let mut session = Session::new(creds, SessionConfig::default())?;
/// let installations = session.authenticate().await?;
/// println!("{} installation(s)", installations.len());
/// let plugs = session.query("smart_plugs", &[]).await?;
/// # let _ = plugs;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    selector: EndpointSelector,
    transport: Transport,
    store: TokenStore,
    token: SessionToken,
    state: AuthState,
    installations: Vec<Installation>,
    active: Option<usize>,
    installation_index: usize,
    mfa_channel: MfaChannel,
}

impl Session {
    /// Create a session. Performs no network I/O.
    pub fn new(credentials: Credentials, config: SessionConfig) -> Result<Self, Error> {
        let selector = if config.endpoints.is_empty() {
            EndpointSelector::production()?
        } else {
            EndpointSelector::new(config.endpoints)?
        };
        Ok(Self {
            credentials,
            selector,
            transport: Transport::new(&config.transport)?,
            store: TokenStore::new(config.token_path),
            token: SessionToken::default(),
            state: AuthState::Unauthenticated,
            installations: Vec::new(),
            active: None,
            installation_index: config.installation_index,
            mfa_channel: config.mfa_channel,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Installations fetched by the last successful login.
    pub fn installations(&self) -> &[Installation] {
        &self.installations
    }

    pub fn active_installation(&self) -> Option<&Installation> {
        self.active.and_then(|idx| self.installations.get(idx))
    }

    /// The mirror the next call tries first.
    pub fn preferred_endpoint(&self) -> &Url {
        self.selector.preferred()
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Where [`request_mfa`](Self::request_mfa) sends the code.
    pub fn mfa_channel(&self) -> MfaChannel {
        self.mfa_channel
    }

    // ── Generic requests ─────────────────────────────────────────────

    /// Send an arbitrary REST-style request through the failover and
    /// validation pipeline.
    ///
    /// Reads fail over on any outage; writes only when the request never
    /// reached a mirror.
    pub async fn request(
        &mut self,
        request: TransportRequest,
        format: BodyFormat,
    ) -> Result<Value, Error> {
        self.ensure_authenticated()?;
        let failover = Failover::for_method(&request.method);
        let result = self
            .execute(request, format, Envelope::None, failover)
            .await;
        self.guard(result)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_authenticated(&self) -> Result<(), Error> {
        if self.state.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    /// Add the headers every request carries.
    fn decorate(&self, mut request: TransportRequest) -> TransportRequest {
        request
            .headers
            .insert(APPLICATION_ID, HeaderValue::from_static(APPLICATION_ID_VALUE));
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        failover::attach_cookies(&self.token, &mut request);
        request
    }

    /// Send `request` with the session headers through the failover loop.
    pub(crate) async fn execute(
        &mut self,
        request: TransportRequest,
        format: BodyFormat,
        envelope: Envelope,
        failover: Failover,
    ) -> Result<Value, Error> {
        let request = self.decorate(request);
        failover::execute(
            &self.transport,
            &mut self.selector,
            &mut self.token,
            &request,
            format,
            envelope,
            failover,
        )
        .await
    }

    /// Drop the session if the backend says it is gone.
    fn guard<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            if err.is_logged_out() {
                warn!("backend reports the session as logged out; dropping token");
                self.discard_token();
                self.installations.clear();
                self.active = None;
                self.state = AuthState::LoggedOut;
            }
        }
        result
    }

    /// Forget the token in memory and on disk. Never fails.
    fn discard_token(&mut self) {
        self.token = SessionToken::default();
        if let Err(e) = self.store.remove() {
            warn!(error = %e, "could not remove token cache");
        }
    }

    /// Persist the current token, if a cache is configured.
    fn persist_token(&self) -> Result<(), Error> {
        self.store.save(&self.token)
    }
}
