//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces that infrastructure adapters implement:
//! - TestExecutor: runs one test file and reports pass/fail with output
//! - ExternalFixer: proposes a full replacement for a failing test file

pub mod external_fixer;
pub mod test_executor;

pub use external_fixer::{ExternalFixer, FixRequest, FixerError};
pub use test_executor::{TestExecutor, TestRunOutcome};
