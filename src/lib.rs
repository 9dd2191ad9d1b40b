//! # Arthos (Portfolio user API)
//!
//! `arthos` is the account backend for the portfolio client. It registers
//! users, logs them in, and hands the browser a short-lived signed session
//! token through an `HttpOnly` cookie scoped to `/graphql`.
//!
//! ## Sessions
//!
//! Session tokens are self-contained HMAC-SHA256 JWTs binding a user id to a
//! short expiry; nothing is stored server-side. The signing secret is required
//! configuration outside the `development` environment.
//!
//! ## User store
//!
//! Users live in a single Postgres collection (`sql/schema.sql`). The
//! connection is established lazily behind a connect-once gate, so the first
//! request after a database outage re-establishes it.

pub mod arthos;
pub mod cli;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
