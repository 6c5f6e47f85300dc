//! Client for the legacy MyPages web backend.
//!
//! Form-based login, HTML-escaped JSON reads, and CSRF-guarded writes.
//! Shares transport, failover and response classification with
//! [`Session`](crate::Session).

mod auth;
mod client;

pub use client::{MYPAGES_DOMAIN, MyPagesClient};
