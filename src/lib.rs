//! # Handoff (Account Handoff Redirector)
//!
//! `handoff` receives an authenticated session from another application
//! context. The caller opens a URL carrying a short-lived `token` and,
//! optionally, the `package` identifier of the calling client. The token is
//! stored in the local user record, the client package is recorded, and the
//! user is forwarded to passkey management. When anything goes wrong the user
//! lands on the login screen instead; the cause is logged, never shown.
//!
//! ## Capabilities
//!
//! The flow in [`handoff`] does not know where it runs. It is given:
//!
//! - a [`store::KeyValueStore`] standing in for local storage,
//! - a [`handoff::Navigator`] to move the user,
//!
//! and returns a [`client::ClientContext`] that callers thread into every
//! outbound request, so the `X-Client-Package` tag never lives in shared state.
//!
//! ## Surfaces
//!
//! - **HTTP** ([`api`]): `GET /passkeys/setup` runs the flow with the browser
//!   cookie jar as the store and answers with a `303` redirect.
//!   `GET /desktop-redirect` forwards the query to the desktop app.
//! - **CLI** ([`cli`]): `handoff open <URL> --store <PATH>` runs the flow
//!   against a JSON file, for desktop deep-link handlers.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod handoff;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
