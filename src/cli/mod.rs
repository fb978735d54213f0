//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use std::path::Path;

use anyhow::Result;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Load configuration from `path`, or from the project-local defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Report a command failure on stderr.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) {
    if json_mode {
        let payload = serde_json::json!({
            "error": err.to_string(),
            "chain": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
}
