//! Implementation of the `test-healer batch` command.
//!
//! Reads a YAML manifest of test files and repairs them concurrently:
//!
//! ```yaml
//! workspace: .            # optional, defaults to the manifest's directory
//! entries:
//!   - test_file: src/__tests__/sum.test.ts
//!     source_file: src/sum.ts
//!     dependency_context: docs/sum-deps.md   # optional
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use super::{build_orchestrator, read_input, resolve, RepairOverrides};
use crate::cli::output::table::BatchRow;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, RepairContext};
use crate::services::{BatchRepairService, BatchSummary};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// YAML manifest listing the test files to repair
    pub manifest: PathBuf,

    /// Maximum number of files repaired at the same time
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    #[command(flatten)]
    pub overrides: RepairOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BatchManifest {
    /// Workspace root, relative to the manifest's directory
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    /// Relative to the workspace root
    pub test_file: PathBuf,
    /// Relative to the workspace root
    pub source_file: PathBuf,
    /// Relative to the workspace root
    #[serde(default)]
    pub dependency_context: Option<PathBuf>,
}

impl BatchManifest {
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid batch manifest")
    }

    /// Workspace root for a manifest stored at `manifest_path`.
    pub fn workspace_root(&self, manifest_path: &Path) -> PathBuf {
        let manifest_dir = manifest_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        match self.workspace {
            Some(ref workspace) => resolve(manifest_dir, workspace),
            None => manifest_dir.to_path_buf(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub summary: BatchSummary,
    pub files: Vec<BatchRow>,
}

impl CommandOutput for BatchOutput {
    fn to_human(&self) -> String {
        let summary = &self.summary;
        let mut lines = vec![TableFormatter::new().format_batch(&self.files)];
        lines.push(format!(
            "{} file(s): {} passed, {} stuck, {} unfixable, {} no progress, {} exhausted, {} errored",
            summary.total,
            summary.passed,
            summary.stuck,
            summary.unfixable,
            summary.no_progress,
            summary.exhausted,
            summary.errored
        ));
        lines.join("\n")
    }
}

async fn build_contexts(
    manifest: &BatchManifest,
    workspace: &Path,
    max_iterations: u32,
) -> Result<Vec<RepairContext>> {
    let mut contexts = Vec::with_capacity(manifest.entries.len());
    for entry in &manifest.entries {
        let source_code = read_input(&resolve(workspace, &entry.source_file), "source file").await?;
        let mut context = RepairContext::new(
            source_code,
            entry.source_file.display().to_string(),
            entry.test_file.clone(),
            workspace,
        )
        .with_max_iterations(max_iterations);
        if let Some(ref path) = entry.dependency_context {
            context = context.with_dependency_context(
                read_input(&resolve(workspace, path), "dependency context").await?,
            );
        }
        contexts.push(context);
    }
    Ok(contexts)
}

pub async fn execute(args: BatchArgs, config: &Config, json_mode: bool) -> Result<ExitCode> {
    let mut config = args.overrides.apply(config)?;
    if let Some(max_concurrent) = args.max_concurrent {
        config.repair.max_concurrent_files = max_concurrent;
    }

    let manifest = BatchManifest::parse(&read_input(&args.manifest, "batch manifest").await?)?;
    let workspace = manifest.workspace_root(&args.manifest);
    let contexts = build_contexts(&manifest, &workspace, config.repair.max_iterations).await?;

    let service = BatchRepairService::new(
        build_orchestrator(&config)?,
        config.repair.max_concurrent_files,
    );
    let results = service
        .repair_all(contexts)
        .await
        .context("Batch repair failed")?;

    let summary = BatchSummary::from_results(&results);
    let files = manifest
        .entries
        .iter()
        .zip(&results)
        .map(|(entry, result)| match result {
            Ok(result) => BatchRow {
                test_file: entry.test_file.display().to_string(),
                outcome: Some(result.outcome),
                attempts: result.attempts,
                detail: result
                    .final_signature(config.repair.signature_prefix_chars)
                    .unwrap_or_default(),
            },
            Err(err) => BatchRow {
                test_file: entry.test_file.display().to_string(),
                outcome: None,
                attempts: 0,
                detail: err.to_string(),
            },
        })
        .collect();

    let all_passed = summary.failed() == 0;
    output(&BatchOutput { summary, files }, json_mode);

    Ok(if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
