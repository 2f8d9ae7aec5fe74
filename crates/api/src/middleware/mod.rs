//! Request middleware.

pub mod auth;
pub mod cors;
pub mod trace;

pub use auth::{AuthUser, SESSION_COOKIE, extract_token};
