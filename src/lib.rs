//! # Passwords (credential verification service)
//!
//! `passwords` stores salted, hashed passwords per login and validates submitted
//! passwords against them. A login may hold several live passwords at once, some
//! of them one-time and all of them time-limited.
//!
//! ## Disablement lifecycle
//!
//! Request handlers never write to the database to disable a password. When a
//! check finds an expired password, or consumes a one-time password, the id is
//! registered with the [`blocker::Blocker`]. A background task (the
//! [`repeater`]) drains those ids on a fixed interval and disables them with a
//! single bulk update.
//!
//! - **Lossy on error:** if the bulk update fails, the drained batch is dropped
//!   and not retried. Expired passwords are re-detected on the next check, a
//!   consumed one-time password is not.
//! - **No final flush:** ids still pending at shutdown are lost.
//!
//! ## Enumeration resistance
//!
//! A wrong password, an expired password and an unknown login all produce the
//! same `403 Forbidden` answer.

pub mod api;
pub mod blocker;
pub mod cli;
pub mod config;
pub mod domain;
pub mod hasher;
pub mod password;
pub mod repeater;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
