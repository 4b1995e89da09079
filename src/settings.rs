use std::collections::HashMap;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Listener settings. Defaults, then `ARTICLES_*` environment variables;
/// command-line flags are applied on top by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub address: String,
    pub port: u16,
    pub path: String,
    pub attempts: u32,
}

pub fn load() -> Result<Settings> {
    build(None)
}

fn build(env: Option<HashMap<String, String>>) -> Result<Settings> {
    let mut settings: Settings = Config::builder()
        .set_default("address", "localhost")?
        .set_default("port", 5006_i64)?
        .set_default("path", "/")?
        .set_default("attempts", 100_i64)?
        .add_source(Environment::with_prefix("ARTICLES").try_parsing(true).source(env))
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")?;

    if !settings.path.starts_with('/') {
        settings.path.insert(0, '/');
    }
    Ok(settings)
}
