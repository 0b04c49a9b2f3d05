//! Route handlers for the HTTP API.

pub mod auth;
pub mod form;
pub mod health;
pub mod image_urls;
pub mod resources;
