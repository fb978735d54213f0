//! Claude Code fixer
//!
//! Shells out to the Claude Code CLI in print mode, sending the fix prompt on
//! stdin and returning stdout. Requires the `claude` CLI to be installed and
//! authenticated; no API key is handled here.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::prompt::build_fix_prompt;
use crate::domain::models::FixerConfig;
use crate::domain::ports::{ExternalFixer, FixRequest, FixerError};

/// Configuration for the Claude Code fixer
#[derive(Debug, Clone)]
pub struct ClaudeCodeConfig {
    /// Path to claude CLI executable (defaults to "claude" in PATH)
    pub claude_path: String,

    /// Arguments passed before the prompt is written to stdin
    pub args: Vec<String>,

    /// Working directory for claude execution (defaults to current dir)
    pub working_dir: Option<PathBuf>,

    /// Time allowed for one proposal
    pub timeout: Duration,
}

impl Default for ClaudeCodeConfig {
    fn default() -> Self {
        Self {
            claude_path: "claude".to_string(),
            args: vec!["-p".to_string()],
            working_dir: None,
            timeout: Duration::from_secs(300),
        }
    }
}

impl From<&FixerConfig> for ClaudeCodeConfig {
    fn from(config: &FixerConfig) -> Self {
        Self {
            claude_path: config.claude_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            ..Self::default()
        }
    }
}

/// Fixer backed by the Claude Code CLI.
pub struct ClaudeCodeFixer {
    config: ClaudeCodeConfig,
}

impl ClaudeCodeFixer {
    pub fn new(config: ClaudeCodeConfig) -> Self {
        Self { config }
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.config.claude_path);
        if let Some(ref wd) = self.config.working_dir {
            cmd.current_dir(wd);
        }
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ExternalFixer for ClaudeCodeFixer {
    fn fixer_id(&self) -> &str {
        "claude-code"
    }

    async fn propose_fix(&self, request: &FixRequest) -> Result<String, FixerError> {
        let mut child = self.build_command().spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                FixerError::Unavailable(format!(
                    "Claude CLI not found at: {}. Please install Claude Code CLI.",
                    self.config.claude_path
                ))
            } else {
                FixerError::ExecutionFailed(format!("Failed to spawn claude CLI: {e}"))
            }
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| FixerError::ExecutionFailed("Failed to get stdin handle".to_string()))?;

        let prompt = build_fix_prompt(request);
        tracing::debug!(
            attempt = request.attempt_number,
            prompt_chars = prompt.len(),
            "Sending fix prompt to claude CLI"
        );
        stdin
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| FixerError::ExecutionFailed(format!("Failed to write prompt: {e}")))?;
        // Close stdin to signal end of input
        drop(stdin);

        // On timeout the child future is dropped, which kills the process.
        let output = timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| FixerError::Timeout(self.config.timeout.as_secs()))?
            .map_err(|e| FixerError::ExecutionFailed(format!("Failed to wait for process: {e}")))?;

        if !output.status.success() {
            return Err(FixerError::ExecutionFailed(format!(
                "Claude CLI exited with code {:?}. Stderr: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
