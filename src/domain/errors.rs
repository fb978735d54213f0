//! Domain errors for the test repair loop.
//!
//! Failures of the test being repaired are data (see
//! [`ParsedError`](crate::domain::models::ParsedError)) and never show up
//! here. These variants cover faults that stop a session from running at all.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-level errors that can occur while setting up or running a repair session.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Test file I/O failed for {}: {message}", path.display())]
    TestFileIo { path: PathBuf, message: String },

    #[error("Test file appears more than once in the batch: {}", .0.display())]
    DuplicateTestFile(PathBuf),

    #[error("Invalid repair context: {0}")]
    InvalidContext(String),
}

impl DomainError {
    /// Wrap an I/O error raised while touching the test file at `path`.
    pub fn test_file_io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::TestFileIo {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
