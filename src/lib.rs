//! imgvault: admin service for image records hosted on Cloudinary.
//!
//! The server lives in the `iv-*` workspace crates; this crate adds the CLI
//! and the gallery widget client, and is exposed as a library for
//! integration testing.

pub mod widget;

use std::path::Path;

use iv_core::config::Config;

/// Load the config file (or defaults) and apply environment overrides.
pub fn load_config(path: Option<&Path>) -> iv_core::Result<Config> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}
