// Session token and its on-disk cache.
//
// The token is the set of cookies the backend issued. It is rendered into a
// single `Cookie` header on every request and persisted as JSON so that a
// later process can resume without re-sending credentials. The file format
// is private to this crate.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;

/// Cookies issued by the backend for one authenticated session.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    cookies: BTreeMap<String, String>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

// Cookie values are bearer credentials; only names are ever printed.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

impl SessionToken {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// When this token was last written to disk.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    /// Apply one `Set-Cookie` header value. Only the name and value are
    /// kept; an empty value, `Max-Age<=0`, or an `Expires` in the past
    /// removes the cookie.
    pub fn merge_set_cookie(&mut self, header: &str) {
        let cookie = match Cookie::parse(header) {
            Ok(cookie) => cookie,
            Err(e) => {
                debug!(error = %e, "ignoring malformed Set-Cookie header");
                return;
            }
        };
        let name = cookie.name();
        if name.is_empty() {
            return;
        }
        let value = cookie.value_trimmed();
        let expired = cookie.max_age().is_some_and(|age| age.whole_seconds() <= 0)
            || cookie
                .expires_datetime()
                .is_some_and(|at| at.unix_timestamp() <= Utc::now().timestamp());

        if value.is_empty() || expired {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn merge_all<'a>(&mut self, headers: impl IntoIterator<Item = &'a str>) {
        for header in headers {
            self.merge_set_cookie(header);
        }
    }

    /// Render as a `Cookie` request header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Optional file-backed cache for a [`SessionToken`].
///
/// Each operation opens, reads or writes, and closes the file. There is no
/// cross-process locking.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
}

impl TokenStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the cached token. A missing, empty, or unreadable file yields
    /// `None`; a file that does not parse is removed.
    pub fn load(&self) -> Result<Option<SessionToken>, Error> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::TokenStore {
                    path: path.to_owned(),
                    source,
                });
            }
        };

        match serde_json::from_str::<SessionToken>(&raw) {
            Ok(token) if !token.is_empty() => {
                debug!(path = %path.display(), "loaded cached session token");
                Ok(Some(token))
            }
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable token cache");
                self.remove()?;
                Ok(None)
            }
        }
    }

    /// Persist `token`, stamping it with the current time.
    pub fn save(&self, token: &SessionToken) -> Result<(), Error> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let io_err = |source| Error::TokenStore {
            path: path.to_owned(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let stamped = SessionToken {
            cookies: token.cookies.clone(),
            saved_at: Some(Utc::now()),
        };
        let json = serde_json::to_string_pretty(&stamped)
            .map_err(|e| io_err(std::io::Error::other(e)))?;
        std::fs::write(path, json).map_err(io_err)?;
        debug!(path = %path.display(), "persisted session token");
        Ok(())
    }

    /// Delete the cache file. A file that is already gone is not an error.
    pub fn remove(&self) -> Result<(), Error> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed token cache");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::TokenStore {
                path: path.to_owned(),
                source,
            }),
        }
    }
}
