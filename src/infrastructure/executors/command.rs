//! Test executor that shells out to the project's test runner.
//!
//! Runs `<program> <args...> <test_file>` inside the workspace root and
//! reports the combined output. Spawn failures and timeouts are reported as
//! failed runs so the repair loop classifies them like any other failure.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::models::ExecutorConfig;
use crate::domain::ports::{TestExecutor, TestRunOutcome};

// ---------------------------------------------------------------------------
// CommandTestExecutor
// ---------------------------------------------------------------------------

/// Runs a single test file with a configurable command.
#[derive(Debug, Clone)]
pub struct CommandTestExecutor {
    /// The program to execute (e.g. `"npx"`).
    program: String,
    /// Arguments placed before the test file path.
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTestExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Runs a test file with `npx jest`.
    pub fn jest() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }

    fn combine(stdout: &[u8], stderr: &[u8]) -> String {
        let stdout = String::from_utf8_lossy(stdout);
        let stderr = String::from_utf8_lossy(stderr);
        match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (true, _) => stderr.into_owned(),
            (false, true) => stdout.into_owned(),
        }
    }
}

#[async_trait]
impl TestExecutor for CommandTestExecutor {
    async fn run(&self, test_file: &Path, workspace_root: &Path) -> TestRunOutcome {
        tracing::debug!(
            program = %self.program,
            test_file = %test_file.display(),
            "Running test file"
        );

        // The runner executes inside the workspace, so hand it a path relative to it.
        let runner_path = test_file.strip_prefix(workspace_root).unwrap_or(test_file);
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(runner_path)
            .current_dir(workspace_root)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(program = %self.program, error = %e, "Failed to spawn test command");
                return TestRunOutcome::failed(format!(
                    "Failed to spawn test command '{}': {e}",
                    self.program
                ));
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    test_file = %test_file.display(),
                    "Test run timed out"
                );
                return TestRunOutcome::failed(format!(
                    "Test run timed out after {}s",
                    self.timeout.as_secs_f64()
                ));
            }
        };

        let combined = Self::combine(&output.stdout, &output.stderr);
        let success = output.status.success();
        tracing::debug!(success, exit_code = ?output.status.code(), "Test run complete");

        if success {
            TestRunOutcome::passed(combined)
        } else {
            TestRunOutcome::failed(combined)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, timeout: Duration) -> CommandTestExecutor {
        // `$0` receives the test file path appended after the script.
        CommandTestExecutor::new("sh", vec!["-c".into(), script.into()], timeout)
    }

    #[tokio::test]
    async fn passing_run_reports_stdout() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.test.js"), "content").unwrap();

        let outcome = sh("echo PASS $0; cat $0", Duration::from_secs(5))
            .run(Path::new("a.test.js"), dir.path())
            .await;

        assert!(outcome.success);
        assert!(outcome.output.contains("PASS a.test.js"));
        assert!(outcome.output.contains("content"));
    }

    #[tokio::test]
    async fn path_inside_workspace_is_passed_relative() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/a.test.js"), "nested").unwrap();

        let outcome = sh("echo $0; cat $0", Duration::from_secs(5))
            .run(&dir.path().join("src/a.test.js"), dir.path())
            .await;

        assert!(outcome.success);
        assert!(outcome.output.starts_with("src/a.test.js"));
        assert!(outcome.output.contains("nested"));
    }

    #[tokio::test]
    async fn failing_run_combines_streams() {
        let dir = TempDir::new().unwrap();
        let outcome = sh("echo out; echo 'Tests: 2 failed' >&2; exit 1", Duration::from_secs(5))
            .run(Path::new("a.test.js"), dir.path())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.output, "out\n\nTests: 2 failed\n");
    }

    #[tokio::test]
    async fn missing_program_is_a_failed_run() {
        let dir = TempDir::new().unwrap();
        let executor = CommandTestExecutor::new(
            "definitely-not-a-test-runner",
            vec![],
            Duration::from_secs(5),
        );

        let outcome = executor.run(Path::new("a.test.js"), dir.path()).await;

        assert!(!outcome.success);
        assert!(outcome.output.starts_with("Failed to spawn test command"));
    }

    #[tokio::test]
    async fn timeout_is_a_failed_run() {
        let dir = TempDir::new().unwrap();
        let outcome = sh("sleep 5", Duration::from_millis(100))
            .run(Path::new("a.test.js"), dir.path())
            .await;

        assert!(!outcome.success);
        assert!(outcome.output.starts_with("Test run timed out"));
    }

    #[test]
    fn default_is_jest() {
        let executor = CommandTestExecutor::jest();
        assert_eq!(executor.program, "npx");
        assert_eq!(executor.args[0], "jest");
        assert_eq!(executor.timeout, Duration::from_secs(120));
    }
}
