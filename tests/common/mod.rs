//! Common test utilities for integration tests
//!
//! Provides scripted port implementations and workspace fixtures shared
//! across the repair integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use test_healer::{ExternalFixer, FixRequest, FixerError, RepairContext, TestExecutor, TestRunOutcome};

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A workspace holding one test file.
pub struct Workspace {
    pub dir: TempDir,
    pub test_file: PathBuf,
}

impl Workspace {
    pub fn with_test(content: &str) -> Self {
        let dir = temp_dir();
        let test_file = PathBuf::from("sum.test.ts");
        std::fs::write(dir.path().join(&test_file), content).expect("write test file");
        Self { dir, test_file }
    }

    pub fn context(&self, max_iterations: u32) -> RepairContext {
        RepairContext::new(
            "export const sum = (a: number, b: number) => a + b;",
            "src/sum.ts",
            self.test_file.clone(),
            self.dir.path(),
        )
        .with_max_iterations(max_iterations)
    }

    pub fn read_test(&self) -> String {
        std::fs::read_to_string(self.dir.path().join(&self.test_file)).expect("read test file")
    }
}

/// Jest-style assertion failure with a distinct message per `expected`.
pub fn assertion_failure(expected: u32, failed: u32) -> TestRunOutcome {
    TestRunOutcome::failed(format!(
        "FAIL src/sum.test.ts\n  ● sum › adds\n\n    expect(received).toBe(expected)\n\n    Expected: {expected}\n    Received: 0\n\n      at Object.<anonymous> (src/sum.test.ts:4:23)\n\nTests:       {failed} failed, 5 total"
    ))
}

/// Replays canned outcomes in order and records the file content each run saw.
pub struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<TestRunOutcome>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(outcomes: Vec<TestRunOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Content of the test file at each run, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn runs(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl TestExecutor for ScriptedExecutor {
    async fn run(&self, test_file: &Path, _workspace_root: &Path) -> TestRunOutcome {
        let content = tokio::fs::read_to_string(test_file).await.unwrap_or_default();
        self.seen.lock().unwrap().push(content);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| TestRunOutcome::failed("executor script exhausted"))
    }
}

/// Returns canned proposals in order; `None` entries and an empty script fail.
pub struct ScriptedFixer {
    proposals: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<FixRequest>>,
}

impl ScriptedFixer {
    pub fn new(proposals: Vec<Option<&str>>) -> Arc<Self> {
        Arc::new(Self {
            proposals: Mutex::new(
                proposals
                    .into_iter()
                    .map(|p| p.map(|code| format!("Here you go:\n```typescript\n{code}\n```\n")))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<FixRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalFixer for ScriptedFixer {
    fn fixer_id(&self) -> &str {
        "scripted"
    }

    async fn propose_fix(&self, request: &FixRequest) -> Result<String, FixerError> {
        self.requests.lock().unwrap().push(request.clone());
        self.proposals
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .ok_or_else(|| FixerError::Unavailable("script exhausted".to_string()))
    }
}
