// Single-request HTTP transport.
//
// Issues exactly one HTTP exchange against one mirror and hands back the
// status, headers and body untouched. Network failures are wrapped in
// `Error::Request`; nothing here retries. Failover lives in the session.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use reqwest::{Method, StatusCode};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;

const USER_AGENT: &str = concat!("vsure/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the built-in web PKI roots.
    #[default]
    System,
    /// Trust an additional CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate. Only useful against local test doubles.
    DangerAcceptInvalid,
}

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Fixed per-request timeout. Applies to every call; not overridable per call.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// reqwest keeps no cookies; the session owns its token and renders
    /// the `Cookie` header itself.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Request body shapes the backend generations accept.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// Everything needed to send one request, minus the mirror's base URL.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Body,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn query(mut self, params: &[(&str, &str)]) -> Self {
        self.query.extend(
            params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned())),
        );
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    #[must_use]
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Body::Form(fields);
        self
    }
}

/// A completed HTTP exchange, before any classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    /// All `Set-Cookie` header values, in order.
    pub fn set_cookies(&self) -> impl Iterator<Item = &str> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }
}

/// Thin wrapper over `reqwest::Client` issuing one request per call.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
        })
    }

    /// Wrap a pre-built client (tests, custom proxies).
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send `request` to `base_url` and return the raw response.
    ///
    /// Any status code is a successful send; only network-level failures
    /// become errors.
    pub async fn send(
        &self,
        base_url: &Url,
        request: &TransportRequest,
    ) -> Result<RawResponse, Error> {
        let url = join(base_url, &request.path)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Form(fields) => builder.form(fields),
        };

        let wrap = |source| Error::Request {
            url: url.to_string(),
            source,
        };
        let resp = builder.send().await.map_err(wrap)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(wrap)?;

        trace!(%status, bytes = body.len(), "response received");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Append `path` to the mirror's base, keeping any base path prefix.
fn join(base_url: &Url, path: &str) -> Result<Url, Error> {
    let base = base_url.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}
