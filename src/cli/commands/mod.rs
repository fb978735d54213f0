//! CLI command implementations.

pub mod batch;
pub mod classify;
pub mod config;
pub mod repair;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::domain::models::{Config, FixerKind};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::executors::CommandTestExecutor;
use crate::infrastructure::fixers::build_fixer;
use crate::services::RepairOrchestrator;

/// Flags that override the loaded configuration for one run.
#[derive(Args, Debug, Clone, Default)]
pub struct RepairOverrides {
    /// Iteration budget per test file
    #[arg(short = 'n', long)]
    pub max_iterations: Option<u32>,

    /// External fixer: claude-code, anthropic-api or none
    #[arg(long)]
    pub fixer: Option<FixerKind>,
}

impl RepairOverrides {
    /// Apply the overrides to a copy of `config` and re-validate it.
    pub fn apply(&self, config: &Config) -> Result<Config> {
        let mut config = config.clone();
        if let Some(max_iterations) = self.max_iterations {
            config.repair.max_iterations = max_iterations;
        }
        if let Some(kind) = self.fixer {
            config.fixer.kind = kind;
        }
        ConfigLoader::validate(&config).context("Invalid command line override")?;
        Ok(config)
    }
}

/// Wire the configured executor and fixer into an orchestrator.
pub fn build_orchestrator(config: &Config) -> Result<RepairOrchestrator> {
    let executor = Arc::new(CommandTestExecutor::from_config(&config.executor));
    let fixer = build_fixer(&config.fixer)?;
    Ok(RepairOrchestrator::new(executor, fixer, &config.repair))
}

/// Read a text input file, naming it in the error.
pub async fn read_input(path: &Path, what: &str) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {what} {}", path.display()))
}

/// `path` relative to `base` unless already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
