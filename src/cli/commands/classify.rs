//! Implementation of the `test-healer classify` command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::io::AsyncReadExt;

use super::read_input;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, FixStrategy, ParsedError};
use crate::services::{ErrorClassifier, FixStrategySelector};

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// File containing test runner output (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyOutput {
    #[serde(flatten)]
    pub error: ParsedError,
    pub strategy: FixStrategy,
    pub signature: String,
}

impl CommandOutput for ClassifyOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Category:    {}", self.error.category),
            format!("Strategy:    {}", self.strategy),
            format!("Error count: {}", self.error.error_count),
        ];
        if let Some(ref location) = self.error.location {
            lines.push(format!("Location:    {}:{}", location.file, location.line));
        }
        lines.push(format!("Message:\n{}", self.error.message));
        lines.join("\n")
    }
}

/// Classify `raw_output` and pick the strategy the repair loop would use.
pub fn classify_output(raw_output: &str, signature_prefix_chars: usize) -> ClassifyOutput {
    let error = ErrorClassifier::new().classify(raw_output);
    let strategy = FixStrategySelector::new().select(&error);
    let signature = error.signature(signature_prefix_chars);
    ClassifyOutput {
        error,
        strategy,
        signature,
    }
}

pub async fn execute(args: ClassifyArgs, config: &Config, json_mode: bool) -> Result<ExitCode> {
    let raw_output = match args.file {
        Some(ref path) => read_input(path, "runner output").await?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read runner output from stdin")?;
            buffer
        }
    };

    output(
        &classify_output(&raw_output, config.repair.signature_prefix_chars),
        json_mode,
    );
    Ok(ExitCode::SUCCESS)
}
