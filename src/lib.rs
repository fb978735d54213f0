//! test-healer - repair loop for failing unit tests
//!
//! Given a test file that currently fails, test-healer runs it, classifies
//! the failure, applies a deterministic quick fix or asks an external fixer
//! for a replacement, re-runs the test and repeats until the test passes, is
//! judged unfixable, stops making progress, or runs out of iterations.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and the executor/fixer ports
//! - **Service Layer** (`services`): Classification, strategy selection, quick
//!   fixes and the repair control loop
//! - **Infrastructure Layer** (`infrastructure`): Test runner process, LLM
//!   fixers, configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use test_healer::{RepairConfig, RepairContext, RepairOrchestrator};
//! use test_healer::infrastructure::executors::CommandTestExecutor;
//! use test_healer::infrastructure::fixers::NullFixer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = RepairOrchestrator::new(
//!         Arc::new(CommandTestExecutor::jest()),
//!         Arc::new(NullFixer::new()),
//!         &RepairConfig::default(),
//!     );
//!     let context = RepairContext::new(source, "src/sum.ts", "src/sum.test.ts", ".");
//!     let result = orchestrator.repair(&context).await?;
//!     println!("{}", result.outcome);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, ErrorCategory, FixStrategy, ParsedError, RepairAttempt, RepairConfig, RepairContext,
    RepairEvent, RepairOutcome, RepairResult,
};
pub use domain::ports::{ExternalFixer, FixRequest, FixerError, TestExecutor, TestRunOutcome};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    BatchRepairService, BatchSummary, ErrorClassifier, ExternalFixerClient, FixStrategySelector,
    QuickFixEngine, RepairOrchestrator,
};
