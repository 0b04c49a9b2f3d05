//! HTTP middleware: request ID and admin session authentication.

pub mod auth;
pub mod request_id;
