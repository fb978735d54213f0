//! test-healer CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use test_healer::cli::{commands, handle_error, load_config, Cli, Commands};
use test_healer::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            handle_error(&err, cli.json);
            return ExitCode::from(2);
        }
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => {
            handle_error(&err, cli.json);
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Commands::Repair(args) => commands::repair::execute(args, &config, cli.json).await,
        Commands::Batch(args) => commands::batch::execute(args, &config, cli.json).await,
        Commands::Classify(args) => commands::classify::execute(args, &config, cli.json).await,
        Commands::Config(args) => commands::config::execute(args, &config, cli.json).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            handle_error(&err, cli.json);
            ExitCode::from(2)
        }
    }
}
