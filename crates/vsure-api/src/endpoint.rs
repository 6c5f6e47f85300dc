// Mirror selection.
//
// The backend is served from a small set of interchangeable base URLs.
// Each logical operation walks them in the current order; the one that
// answers successfully moves to the front and stays there until another
// mirror has to take over. Failures never reorder anything.

use tracing::debug;
use url::Url;

use crate::error::Error;

/// Production mirrors of the current backend generation.
pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "https://m-api01.verisure.com",
    "https://m-api02.verisure.com",
];

/// Outcome of one attempt against one mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Ordered set of equivalent mirrors, owned by one session.
#[derive(Debug, Clone)]
pub struct EndpointSelector {
    endpoints: Vec<Url>,
}

impl EndpointSelector {
    pub fn new(endpoints: Vec<Url>) -> Result<Self, Error> {
        if endpoints.is_empty() {
            return Err(Error::NoEndpoints);
        }
        Ok(Self { endpoints })
    }

    /// Selector over [`DEFAULT_ENDPOINTS`].
    pub fn production() -> Result<Self, Error> {
        let endpoints = DEFAULT_ENDPOINTS
            .iter()
            .map(|raw| Url::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(endpoints)
    }

    /// The mirrors to try for this call, preferred first.
    pub fn pick_sequence(&self) -> Vec<Url> {
        self.endpoints.clone()
    }

    /// The mirror the next call will try first.
    pub fn preferred(&self) -> &Url {
        // Construction rejects empty lists.
        &self.endpoints[0]
    }

    /// Record the outcome of an attempt. A success makes `url` the
    /// preferred mirror; the relative order of the others is kept.
    pub fn report(&mut self, url: &Url, outcome: Outcome) {
        if outcome == Outcome::Failure {
            debug!(%url, "mirror attempt failed; order unchanged");
            return;
        }
        if let Some(idx) = self.endpoints.iter().position(|e| e == url) {
            if idx > 0 {
                debug!(%url, "promoting mirror to preferred");
                self.endpoints[..=idx].rotate_right(1);
            }
        }
    }
}
