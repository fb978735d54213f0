//! Domain models for repair sessions and configuration.

pub mod config;
pub mod events;
pub mod repair;

pub use config::{Config, ExecutorConfig, FixerConfig, FixerKind, LoggingConfig, RepairConfig};
pub use events::RepairEvent;
pub use repair::{
    char_prefix, ErrorCategory, ErrorLocation, FixStrategy, ParsedError, RepairAttempt,
    RepairContext, RepairOutcome, RepairResult, DEFAULT_MAX_ITERATIONS,
};
