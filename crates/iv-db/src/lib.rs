//! iv-db: document persistence for Image records.
//!
//! Records are schemaless JSON documents stored in SQLite, with connection
//! pooling, embedded migrations, and query functions that keep the
//! `imageKeys` / `imageUrls` arrays mutated atomically.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
