// Mirror failover loop.
//
// One logical call walks the mirrors in preference order. The first
// validated response wins: its cookies are merged into the token and its
// mirror becomes preferred. Failures the policy allows move on to the next
// mirror; anything else is returned at once. If every mirror fails, the
// last failure is returned.

use reqwest::Method;
use reqwest::header::{COOKIE, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoint::{EndpointSelector, Outcome};
use crate::error::Error;
use crate::token::SessionToken;
use crate::transport::{Transport, TransportRequest};
use crate::validate::{BodyFormat, Envelope, validate};

/// Which failures may move a call on to the next mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failover {
    /// Transport failures and outage classifications.
    Any,
    /// Only failures where the request never reached a server. Used for
    /// calls with side effects.
    ConnectOnly,
}

impl Failover {
    fn allows(self, err: &Error) -> bool {
        match self {
            Self::Any => err.can_fail_over(),
            Self::ConnectOnly => err.is_connect_failure(),
        }
    }

    pub(crate) fn for_method(method: &Method) -> Self {
        if method == Method::GET || method == Method::HEAD {
            Self::Any
        } else {
            Self::ConnectOnly
        }
    }
}

/// Render `token` into the request's `Cookie` header.
pub(crate) fn attach_cookies(token: &SessionToken, request: &mut TransportRequest) {
    let Some(cookies) = token.cookie_header() else {
        return;
    };
    match HeaderValue::from_str(&cookies) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers.insert(COOKIE, value);
        }
        Err(_) => warn!("session token cannot be sent as a Cookie header"),
    }
}

pub(crate) async fn execute(
    transport: &Transport,
    selector: &mut EndpointSelector,
    token: &mut SessionToken,
    request: &TransportRequest,
    format: BodyFormat,
    envelope: Envelope,
    failover: Failover,
) -> Result<Value, Error> {
    let mut last = None;

    for base in selector.pick_sequence() {
        let attempt = match transport.send(&base, request).await {
            Ok(response) => validate(&response, format, envelope).map(|value| {
                token.merge_all(response.set_cookies());
                value
            }),
            Err(e) => Err(e),
        };

        match attempt {
            Ok(value) => {
                selector.report(&base, Outcome::Success);
                return Ok(value);
            }
            Err(err) if failover.allows(&err) => {
                warn!(mirror = %base, error = %err, "mirror failed, trying next");
                selector.report(&base, Outcome::Failure);
                last = Some(err);
            }
            Err(err) => {
                debug!(mirror = %base, error = %err, "request failed");
                return Err(err);
            }
        }
    }

    Err(last.unwrap_or(Error::NoEndpoints))
}
