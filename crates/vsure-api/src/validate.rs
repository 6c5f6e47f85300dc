// Response validation and error classification.
//
// The backend signals failure inconsistently across its generations: HTTP
// status, an HTML error page where JSON was expected, or a JSON body that
// carries its own error list. Every response goes through `validate` in a
// fixed order:
//
//   1. HTTP status. Non-200 responses are classified by the HTML page title
//      when there is one, then by status code.
//   2. Body decoding (JSON, HTML-escaped JSON, XML, or text). A body that
//      fails to decode is checked for a known page title before being
//      reported as malformed.
//   3. Application envelope (legacy `{"status": ...}` or GraphQL `errors`).

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::resolve_html5_entity;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{BackendError, Error};
use crate::transport::RawResponse;
use crate::xml;

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?is)<title[^>]*>(?P<title>.*?)</title>").unwrap()
});

static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"&(?:#(?P<dec>[0-9]+)|#[xX](?P<hex>[0-9a-fA-F]+)|(?P<name>[A-Za-z][A-Za-z0-9]*));")
        .unwrap()
});

/// How the body of a successful response is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    /// JSON whose string content arrives HTML-entity encoded.
    EscapedJson,
    /// Generic XML, decoded into attribute bags (see [`xml`]).
    Xml,
    /// Raw text, returned as a JSON string.
    Text,
}

/// Application-level envelope checked after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    None,
    /// Legacy login: `{"status": "ok" | <other>, "message": "..."}`.
    Status,
    /// GraphQL: one object or an array of objects, each with `data` and
    /// optionally a non-empty `errors` array.
    GraphQl,
}

/// Validate one raw response and decode its body.
pub fn validate(
    response: &RawResponse,
    format: BodyFormat,
    envelope: Envelope,
) -> Result<Value, Error> {
    if response.status != StatusCode::OK {
        return Err(classify_failure(response.status, &response.body));
    }

    let body = &response.body;
    // Text bodies always decode, so sniff for error pages up front.
    if format == BodyFormat::Text {
        if let Some(err) = classify_title(body) {
            return Err(err);
        }
    }
    let value = match decode(body, format) {
        Ok(value) => value,
        Err(message) => {
            return Err(classify_title(body).unwrap_or_else(|| Error::MalformedResponse {
                message,
                body: body.clone(),
            }));
        }
    };

    match envelope {
        Envelope::None => Ok(value),
        Envelope::Status => check_status_envelope(value, body),
        Envelope::GraphQl => check_graphql_envelope(value),
    }
}

/// Classify a non-200 response.
///
/// A known page title wins; otherwise 503 means temporarily unavailable and
/// 401 means the session is gone. Anything else is a generic response error.
pub fn classify_failure(status: StatusCode, body: &str) -> Error {
    if let Some(err) = classify_title(body) {
        return err;
    }
    match status {
        StatusCode::SERVICE_UNAVAILABLE => Error::TemporarilyUnavailable,
        StatusCode::UNAUTHORIZED => Error::LoggedOut {
            message: "session rejected (HTTP 401)".into(),
        },
        _ => Error::Response {
            status: status.as_u16(),
            body: body.to_owned(),
        },
    }
}

/// Text between `<title>` and `</title>`, whitespace-normalized.
pub fn extract_title(body: &str) -> Option<String> {
    let raw = TITLE_REGEX.captures(body)?.name("title")?.as_str();
    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

/// Map a known error-page title to its error kind.
fn classify_title(body: &str) -> Option<Error> {
    let title = extract_title(body)?;
    if title.starts_with("My Pages is temporarily unavailable") {
        Some(Error::TemporarilyUnavailable)
    } else if title.starts_with("My Pages - Maintenance") {
        Some(Error::Maintenance)
    } else if title.starts_with("Choose country") || title.starts_with("Log in") {
        Some(Error::LoggedOut {
            message: "Not logged in".into(),
        })
    } else {
        None
    }
}

/// Decode HTML character references (named and numeric). A bare `&` or a
/// reference that does not resolve is left as it is.
pub fn unescape_html(raw: &str) -> Cow<'_, str> {
    ENTITY_REGEX.replace_all(raw, |caps: &regex::Captures<'_>| {
        let resolved = if let Some(dec) = caps.name("dec") {
            dec.as_str().parse().ok().and_then(char::from_u32).map(String::from)
        } else if let Some(hex) = caps.name("hex") {
            u32::from_str_radix(hex.as_str(), 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
        } else {
            caps.name("name")
                .and_then(|name| resolve_html5_entity(name.as_str()))
                .map(str::to_owned)
        };
        resolved.unwrap_or_else(|| caps[0].to_owned())
    })
}

fn decode(body: &str, format: BodyFormat) -> Result<Value, String> {
    match format {
        BodyFormat::Text => Ok(Value::String(body.to_owned())),
        _ if body.trim().is_empty() => Ok(Value::Null),
        BodyFormat::Json => serde_json::from_str(body).map_err(|e| e.to_string()),
        BodyFormat::EscapedJson => {
            serde_json::from_str(&unescape_html(body)).map_err(|e| e.to_string())
        }
        BodyFormat::Xml => xml::deserialize(body),
    }
}

fn check_status_envelope(value: Value, body: &str) -> Result<Value, Error> {
    let Some(status) = value.get("status").and_then(Value::as_str) else {
        return Err(Error::MalformedResponse {
            message: "login response has no status field".into(),
            body: body.to_owned(),
        });
    };
    if status == "ok" {
        return Ok(value);
    }
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| format!("status={status}"), str::to_owned);
    Err(Error::Login { message })
}

fn check_graphql_envelope(value: Value) -> Result<Value, Error> {
    let errors: Vec<BackendError> = match &value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .flat_map(|(index, item)| backend_errors(index, item))
            .collect(),
        item @ Value::Object(_) => backend_errors(0, item),
        _ => Vec::new(),
    };
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(Error::Application { errors })
    }
}

fn backend_errors(index: usize, item: &Value) -> Vec<BackendError> {
    let Some(list) = item.get("errors").and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .map(|err| BackendError {
            index,
            message: err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_owned(),
            code: err
                .pointer("/extensions/code")
                .or_else(|| err.pointer("/data/errorCode"))
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
        .collect()
}
