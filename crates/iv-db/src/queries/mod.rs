//! Database query modules.

pub mod images;
