// MyPages web client
//
// The cookie-based web generation of the backend. Reads return JSON whose
// strings arrive HTML-entity encoded; writes carry the CSRF token scraped
// at login. Login and logout live in `auth.rs`.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::endpoint::EndpointSelector;
use crate::error::Error;
use crate::failover::{self, Failover};
use crate::token::SessionToken;
use crate::transport::{Transport, TransportConfig, TransportRequest};
use crate::validate::{BodyFormat, Envelope};

/// Base URL of the MyPages web application.
pub const MYPAGES_DOMAIN: &str = "https://mypages.verisure.com";

const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Client for the legacy MyPages web backend.
///
/// Holds its own cookie set and CSRF token. Nothing is persisted: a new
/// client always starts logged out.
#[derive(Debug)]
pub struct MyPagesClient {
    pub(super) credentials: Credentials,
    pub(super) installation: String,
    pub(super) selector: EndpointSelector,
    pub(super) transport: Transport,
    pub(super) token: SessionToken,
    pub(super) csrf: Option<String>,
    pub(super) logged_in: bool,
}

impl MyPagesClient {
    /// Client against the given base URLs (normally just [`MYPAGES_DOMAIN`]).
    pub fn new(
        credentials: Credentials,
        installation: impl Into<String>,
        endpoints: Vec<Url>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            credentials,
            installation: installation.into(),
            selector: EndpointSelector::new(endpoints)?,
            transport: Transport::new(transport)?,
            token: SessionToken::default(),
            csrf: None,
            logged_in: false,
        })
    }

    /// Client against the production MyPages domain.
    pub fn production(
        credentials: Credentials,
        installation: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::new(
            credentials,
            installation,
            vec![Url::parse(MYPAGES_DOMAIN)?],
            &TransportConfig::default(),
        )
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn installation(&self) -> &str {
        &self.installation
    }

    /// CSRF token scraped at login, if any.
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf.as_deref()
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// GET `path` and decode the HTML-escaped JSON body. An empty body
    /// decodes to `null`.
    pub async fn get(&mut self, path: &str, params: &[(&str, &str)]) -> Result<Value, Error> {
        self.ensure_logged_in()?;
        let request = TransportRequest::get(path).query(params);
        self.send(request, BodyFormat::EscapedJson).await
    }

    /// GET `path` and return the raw body text.
    pub async fn get_text(&mut self, path: &str, params: &[(&str, &str)]) -> Result<String, Error> {
        self.ensure_logged_in()?;
        let request = TransportRequest::get(path).query(params);
        let value = self.send(request, BodyFormat::Text).await?;
        Ok(into_text(value))
    }

    /// POST a form to `path` with the CSRF header.
    pub async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> Result<Value, Error> {
        self.ensure_logged_in()?;
        let fields = form
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let request = self.with_csrf(TransportRequest::post(path).form(fields));
        self.send(request, BodyFormat::EscapedJson).await
    }

    /// PUT a JSON document to `path` with the CSRF header. Returns the raw
    /// body text.
    pub async fn put(&mut self, path: &str, body: Value) -> Result<String, Error> {
        self.ensure_logged_in()?;
        let request = self.with_csrf(
            TransportRequest::new(Method::PUT, path)
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(body),
        );
        let value = self.send(request, BodyFormat::Text).await?;
        Ok(into_text(value))
    }

    // ── Internals ────────────────────────────────────────────────────

    fn ensure_logged_in(&self) -> Result<(), Error> {
        if self.logged_in {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    fn with_csrf(&self, request: TransportRequest) -> TransportRequest {
        match self.csrf.as_deref().map(HeaderValue::from_str) {
            Some(Ok(value)) => request.header(CSRF_HEADER, value),
            Some(Err(_)) => {
                warn!("CSRF token is not a valid header value; sending without it");
                request
            }
            None => request,
        }
    }

    /// Send through the failover loop. A logged-out answer clears the
    /// local session.
    pub(super) async fn send(
        &mut self,
        request: TransportRequest,
        format: BodyFormat,
    ) -> Result<Value, Error> {
        let result = self.exchange(request, format, Envelope::None).await;
        if let Err(err) = &result {
            if err.is_logged_out() {
                debug!("MyPages session expired");
                self.clear();
            }
        }
        result
    }

    pub(super) async fn exchange(
        &mut self,
        mut request: TransportRequest,
        format: BodyFormat,
        envelope: Envelope,
    ) -> Result<Value, Error> {
        failover::attach_cookies(&self.token, &mut request);
        let policy = Failover::for_method(&request.method);
        failover::execute(
            &self.transport,
            &mut self.selector,
            &mut self.token,
            &request,
            format,
            envelope,
            policy,
        )
        .await
    }

    pub(super) fn clear(&mut self) {
        self.token = SessionToken::default();
        self.csrf = None;
        self.logged_in = false;
    }
}

fn into_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
