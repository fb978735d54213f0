//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::batch::BatchArgs;
use super::commands::classify::ClassifyArgs;
use super::commands::config::ConfigArgs;
use super::commands::repair::RepairArgs;

#[derive(Parser, Debug)]
#[command(name = "test-healer")]
#[command(about = "Diagnose failing unit tests, fix them and re-verify until they pass", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .test-healer/config.yaml and .test-healer/local.yaml)
    #[arg(short, long, global = true, env = "TEST_HEALER_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Repair a single failing test file
    Repair(RepairArgs),

    /// Repair every test file listed in a YAML manifest
    Batch(BatchArgs),

    /// Classify test runner output without changing anything
    Classify(ClassifyArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}
