//! HTTP handlers.
//!
//! Handlers only translate between HTTP and the [`PasswordService`]; every
//! policy decision lives in the service.
//!
//! [`PasswordService`]: crate::password::PasswordService

pub mod health;
pub mod password;
pub mod passwords;
pub mod root;
