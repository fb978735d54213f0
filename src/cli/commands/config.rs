//! Implementation of the `test-healer config` command.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    #[serde(flatten)]
    pub config: Config,
    /// Whether an API key is available to the Anthropic API fixer
    pub api_key_configured: bool,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        let yaml = serde_yaml::to_string(&self.config).unwrap_or_default();
        format!(
            "{}api key configured: {}",
            yaml, self.api_key_configured
        )
    }
}

pub async fn execute(_args: ConfigArgs, config: &Config, json_mode: bool) -> Result<ExitCode> {
    output(
        &ConfigOutput {
            config: config.clone(),
            api_key_configured: config.fixer.resolved_api_key().is_some(),
        },
        json_mode,
    );
    Ok(ExitCode::SUCCESS)
}
