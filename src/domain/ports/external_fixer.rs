//! External fixer port - an opaque collaborator that proposes a corrected test file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything the external fixer is told about a failing test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixRequest {
    /// Content of the source file under test
    pub source_code: String,
    /// Identifying name of the source under test
    pub file_name: String,
    /// Current content of the failing test file
    pub current_test_code: String,
    /// Bounded prefix of the runner output
    pub error_context: String,
    /// One-based attempt number within the session
    pub attempt_number: u32,
    /// Free-form description of related files
    pub dependency_context: Option<String>,
}

/// Error types for external fixer operations
#[derive(Debug, thiserror::Error)]
pub enum FixerError {
    #[error("External fixer not configured: {0}")]
    NotConfigured(String),

    #[error("External fixer unavailable: {0}")]
    Unavailable(String),

    #[error("External fixer timed out after {0}s")]
    Timeout(u64),

    #[error("External fixer failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid response from external fixer: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("External fixer returned an empty proposal")]
    EmptyProposal,
}

/// Port trait for external fixer implementations
///
/// Returns the raw response text; code extraction happens in
/// [`ExternalFixerClient`](crate::services::ExternalFixerClient).
///
/// # Implementations
///
/// - **ClaudeCodeFixer**: shells out to the Claude Code CLI
/// - **AnthropicApiFixer**: calls the Anthropic Messages API
/// - **NullFixer**: always reports `NotConfigured`
#[async_trait]
pub trait ExternalFixer: Send + Sync {
    /// Short identifier used in logs, e.g. `"claude-code"`.
    fn fixer_id(&self) -> &str;

    async fn propose_fix(&self, request: &FixRequest) -> Result<String, FixerError>;
}

