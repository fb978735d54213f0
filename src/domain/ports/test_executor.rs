//! Test executor port - runs a single test file.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Normalized result of one test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunOutcome {
    pub success: bool,
    /// Combined runner output (stdout followed by stderr).
    pub output: String,
}

impl TestRunOutcome {
    pub fn passed(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Trait for running a test file inside a workspace.
///
/// Implementations never fail: spawn errors, timeouts and crashes of the
/// runner itself are reported as `success = false` with diagnostic text in
/// `output`, so the repair loop classifies them like any other failure.
#[async_trait]
pub trait TestExecutor: Send + Sync {
    async fn run(&self, test_file: &Path, workspace_root: &Path) -> TestRunOutcome;
}
