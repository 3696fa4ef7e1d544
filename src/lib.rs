//! # edurag (client core)
//!
//! Client-side core of the edurag assessment platform: everything a page needs
//! before it renders, and the realtime hint feed used while a student writes an
//! answer.
//!
//! ## Session
//!
//! A single bearer credential is kept per API origin in a [`CredentialStore`].
//! The [`SessionReader`] decodes its claims on every call (no cache), so a
//! logout or a new login is visible on the very next read. Claims are decoded
//! without verifying the signature: they are a UI hint only, and the API stays
//! the authority for every request.
//!
//! ## Route gating
//!
//! [`RouteGuard`] maps a page requirement to `allow` or `redirect("/login")`.
//! Authenticated API calls need the [`Access`] grant an `allow` decision
//! carries, so a denied session cannot reach the network with a credential.
//!
//! ## Hint streaming
//!
//! [`StreamClient`] wraps two transports (server-sent events and a websocket)
//! behind one connect/send/disconnect contract and delivers an ordered
//! sequence of `hint`/`context` events to a single subscriber.
//!
//! [`CredentialStore`]: session::CredentialStore
//! [`SessionReader`]: session::SessionReader
//! [`RouteGuard`]: session::RouteGuard
//! [`Access`]: session::Access
//! [`StreamClient`]: stream::StreamClient

pub mod api;
pub mod auth;
pub mod cli;
pub mod session;
pub mod stream;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
