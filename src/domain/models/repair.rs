//! Repair session data model.
//!
//! A session starts from a caller-owned [`RepairContext`], derives a
//! [`ParsedError`] and at most one [`RepairAttempt`] per iteration, and folds
//! everything into a single [`RepairResult`] when it reaches a terminal
//! [`RepairOutcome`].

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Default iteration budget for a session.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Quoted specifier following the keyword of an unresolved-module message.
static MODULE_SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:module|resolve|import)\s+['"`]([^'"`\n]+)['"`]"#)
        .unwrap_or_else(|e| panic!("invalid module specifier pattern: {e}"))
});

/// Return the longest prefix of `text` holding at most `max_chars` characters.
///
/// Always cuts on a char boundary.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Diagnostic category of a failing test run.
///
/// Declaration order is the classifier's match priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Unresolved module reference.
    ImportError,
    /// Mock factory or mock function invocation failure.
    MockError,
    /// Type mismatch, including syntax errors caused by stray type annotations.
    TypeError,
    /// Expectation mismatch.
    AssertionError,
    /// Generic parse failure.
    SyntaxError,
    /// Uncaught reference or range error.
    RuntimeError,
    /// Nothing matched.
    Unknown,
}

impl ErrorCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ImportError => "IMPORT_ERROR",
            Self::MockError => "MOCK_ERROR",
            Self::TypeError => "TYPE_ERROR",
            Self::AssertionError => "ASSERTION_ERROR",
            Self::SyntaxError => "SYNTAX_ERROR",
            Self::RuntimeError => "RUNTIME_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ParsedError
// ---------------------------------------------------------------------------

/// Source position extracted from the first stack frame of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub file: String,
    pub line: u32,
}

/// Structured description of one failing run's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedError {
    pub category: ErrorCategory,
    /// Most specific matched text, or a bounded prefix of the raw output.
    pub message: String,
    pub location: Option<ErrorLocation>,
    /// Failing count read from a summary line; at least 1, and an approximation.
    pub error_count: u32,
    /// Full, untruncated runner output.
    #[serde(skip_serializing, default)]
    pub raw_output: String,
}

impl ParsedError {
    /// Stagnation signature: the category followed by the first
    /// `prefix_chars` characters of the message.
    pub fn signature(&self, prefix_chars: usize) -> String {
        format!(
            "{}:{}",
            self.category,
            char_prefix(&self.message, prefix_chars)
        )
    }

    /// The module specifier named by an import error, e.g. `./missing` for
    /// `Cannot find module './missing' from 'a.test.ts'`.
    pub fn module_specifier(&self) -> Option<&str> {
        if self.category != ErrorCategory::ImportError {
            return None;
        }
        MODULE_SPECIFIER
            .captures(&self.message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

// ---------------------------------------------------------------------------
// FixStrategy
// ---------------------------------------------------------------------------

/// Remediation chosen for a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStrategy {
    QuickFix,
    ExternalFix,
    Unfixable,
}

impl fmt::Display for FixStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::QuickFix => "quick_fix",
            Self::ExternalFix => "external_fix",
            Self::Unfixable => "unfixable",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// RepairAttempt
// ---------------------------------------------------------------------------

/// Audit record of one loop iteration that applied a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairAttempt {
    /// Zero-based iteration index.
    pub iteration: u32,
    pub category: ErrorCategory,
    /// Strategy the selector chose.
    pub selected_strategy: FixStrategy,
    /// Strategy that actually produced the change. Differs from
    /// `selected_strategy` when a quick fix fell back to the external fixer.
    pub strategy: FixStrategy,
    /// Error count from the diagnostic run.
    pub errors_before: u32,
    /// Error count from the verification run; 0 when it passed.
    pub errors_after: u32,
    /// Absolute difference in character length between old and new code.
    pub diff_size: usize,
    pub change_applied: bool,
    /// The verification run regressed and the file was restored to the best attempt.
    pub reverted: bool,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RepairContext
// ---------------------------------------------------------------------------

/// Fixed inputs for one repair session. Owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairContext {
    /// Content of the source file under test. Never mutated.
    pub source_code: String,
    /// Identifying name of the source under test, usually its file name.
    pub source_name: String,
    pub test_file_path: PathBuf,
    pub workspace_root: PathBuf,
    /// Free-form description of related files.
    pub dependency_context: Option<String>,
    pub max_iterations: u32,
}

impl RepairContext {
    pub fn new(
        source_code: impl Into<String>,
        source_name: impl Into<String>,
        test_file_path: impl Into<PathBuf>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            source_name: source_name.into(),
            test_file_path: test_file_path.into(),
            workspace_root: workspace_root.into(),
            dependency_context: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_dependency_context(mut self, context: impl Into<String>) -> Self {
        self.dependency_context = Some(context.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Test file path, joined onto the workspace root when relative.
    pub fn resolved_test_path(&self) -> PathBuf {
        if self.test_file_path.is_absolute() {
            self.test_file_path.clone()
        } else {
            self.workspace_root.join(&self.test_file_path)
        }
    }

    /// Reject contexts a session cannot run with.
    pub fn validate(&self) -> DomainResult<()> {
        if self.max_iterations == 0 {
            return Err(DomainError::InvalidContext(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if self.source_name.trim().is_empty() {
            return Err(DomainError::InvalidContext(
                "source_name cannot be empty".to_string(),
            ));
        }
        if self.test_file_path.as_os_str().is_empty() {
            return Err(DomainError::InvalidContext(
                "test_file_path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RepairOutcome / RepairResult
// ---------------------------------------------------------------------------

/// Terminal state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairOutcome {
    /// The test passed, either on a diagnostic or a verification run.
    Passed,
    /// Two consecutive diagnostic runs produced the same signature.
    Stuck,
    /// The selector declared the failure unfixable.
    Unfixable,
    /// The chosen fix produced no textual change.
    NoProgress,
    /// The iteration budget ran out.
    Exhausted,
}

impl RepairOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for RepairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Stuck => "stuck",
            Self::Unfixable => "unfixable",
            Self::NoProgress => "no_progress",
            Self::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// Final, immutable outcome of a repair session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairResult {
    pub session_id: Uuid,
    pub test_file: PathBuf,
    pub passed: bool,
    pub outcome: RepairOutcome,
    /// Number of attempts consumed, equal to `history.len()`.
    pub attempts: u32,
    /// Error from the last attempted iteration; `None` when passed.
    pub final_error: Option<ParsedError>,
    pub history: Vec<RepairAttempt>,
    /// Test content with the lowest error count seen during the session.
    pub best_test_code: String,
}

impl RepairResult {
    /// Signature of the final error, if any.
    pub fn final_signature(&self, prefix_chars: usize) -> Option<String> {
        self.final_error
            .as_ref()
            .map(|error| error.signature(prefix_chars))
    }
}
