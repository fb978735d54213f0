//! Implementation of the `test-healer repair` command.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::sync::mpsc;

use super::{build_orchestrator, read_input, resolve, RepairOverrides};
use crate::cli::output::{output, spawn_progress_printer, CommandOutput, TableFormatter};
use crate::domain::models::{Config, RepairContext, RepairResult};

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Test file to repair, relative to the workspace root
    pub test_file: PathBuf,

    /// Source file under test, relative to the workspace root
    #[arg(short, long)]
    pub source: PathBuf,

    /// Workspace root the test runner executes in
    #[arg(short, long, default_value = ".")]
    pub workspace: PathBuf,

    /// File describing related modules, relative to the workspace root
    #[arg(short, long)]
    pub dependency_context: Option<PathBuf>,

    /// Write the best attempt back to the test file when the repair fails
    #[arg(long)]
    pub keep_best: bool,

    #[command(flatten)]
    pub overrides: RepairOverrides,
}

#[derive(Debug, Serialize)]
pub struct RepairOutput {
    #[serde(flatten)]
    pub result: RepairResult,
    /// The best attempt was written back to the test file.
    pub kept_best: bool,
    #[serde(skip)]
    signature_prefix_chars: usize,
}

impl CommandOutput for RepairOutput {
    fn to_human(&self) -> String {
        let result = &self.result;
        let mut lines = vec![format!(
            "{}: {} after {} attempt(s)",
            result.test_file.display(),
            result.outcome,
            result.attempts
        )];

        if let Some(signature) = result.final_signature(self.signature_prefix_chars) {
            lines.push(format!("Final error: {signature}"));
        }
        if let Some(location) = result.final_error.as_ref().and_then(|e| e.location.as_ref()) {
            lines.push(format!("  at {}:{}", location.file, location.line));
        }
        if !result.history.is_empty() {
            lines.push(TableFormatter::new().format_history(&result.history));
        }
        if self.kept_best {
            lines.push("Best attempt written back to the test file.".to_string());
        }
        lines.join("\n")
    }
}

pub async fn execute(args: RepairArgs, config: &Config, json_mode: bool) -> Result<ExitCode> {
    let config = args.overrides.apply(config)?;

    let source_path = resolve(&args.workspace, &args.source);
    let source_code = read_input(&source_path, "source file").await?;

    let mut context = RepairContext::new(
        source_code,
        args.source.display().to_string(),
        args.test_file.clone(),
        args.workspace.clone(),
    )
    .with_max_iterations(config.repair.max_iterations);
    if let Some(ref path) = args.dependency_context {
        context = context.with_dependency_context(
            read_input(&resolve(&args.workspace, path), "dependency context").await?,
        );
    }

    let mut orchestrator = build_orchestrator(&config)?;
    let printer = if json_mode {
        None
    } else {
        let (tx, rx) = mpsc::unbounded_channel();
        orchestrator = orchestrator.with_events(tx);
        Some(spawn_progress_printer(rx))
    };

    let result = orchestrator
        .repair(&context)
        .await
        .context("Repair session failed")?;

    // Closing the channel lets the printer drain and exit.
    drop(orchestrator);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let kept_best = !result.passed && args.keep_best;
    if kept_best {
        let test_path = context.resolved_test_path();
        tokio::fs::write(&test_path, &result.best_test_code)
            .await
            .with_context(|| format!("Failed to write best attempt to {}", test_path.display()))?;
    }

    let passed = result.passed;
    output(
        &RepairOutput {
            result,
            kept_best,
            signature_prefix_chars: config.repair.signature_prefix_chars,
        },
        json_mode,
    );

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
