//! Async session layer for the Verisure home-security backend.
//!
//! The crate talks to two generations of the backend:
//!
//! - **GraphQL** (current): [`Session`] logs in with HTTP Basic
//!   credentials, fails over between the `m-api` mirrors, and dispatches
//!   batched GraphQL operations described by the [`graphql::catalog`].
//! - **MyPages** (legacy web): [`legacy::MyPagesClient`] logs in with a
//!   form POST and talks HTML-escaped JSON guarded by a CSRF token.
//!
//! Both share the same [`Transport`], [`EndpointSelector`], token type and
//! response classifier, so callers only ever see [`Error`] variants, never
//! raw status codes or HTML error pages.
//!
//! ```no_run
//! # async fn run() -> Result<(), vsure_api::Error> {
//! use secrecy::SecretString;
//! use vsure_api::{Credentials, Session, SessionConfig};
//!
//! let config = SessionConfig {
//!     token_path: Some("/tmp/vsure-session.json".into()),
//!     ..SessionConfig::default()
//! };
//! let creds = Credentials::new("me@example.com", SecretString::from("pw"));
//! let mut session = Session::new(creds, config)?;
//! session.authenticate().await?;
//! let climate = session.query("climate", &[]).await?;
//! println!("{climate:#}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod endpoint;
pub mod error;
mod failover;
pub mod graphql;
pub mod legacy;
pub mod session;
pub mod token;
pub mod transport;
pub mod validate;
pub mod xml;

pub use auth::{AuthState, Credentials, MfaChannel};
pub use endpoint::{DEFAULT_ENDPOINTS, EndpointSelector, Outcome};
pub use error::{BackendError, Error};
pub use graphql::{Operation, OperationDescriptor, OperationKind, SlotType};
pub use session::{Address, Installation, Session, SessionConfig};
pub use token::{SessionToken, TokenStore};
pub use transport::{Body, RawResponse, TlsMode, Transport, TransportConfig, TransportRequest};
pub use validate::{BodyFormat, Envelope};
