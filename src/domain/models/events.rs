//! Progress events emitted by a repair session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repair::{ErrorCategory, FixStrategy, RepairOutcome};

/// Events emitted while a repair session runs.
///
/// Sent over an optional channel injected into the orchestrator; a closed or
/// absent channel never affects the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RepairEvent {
    SessionStarted {
        session_id: Uuid,
        test_file: PathBuf,
        max_iterations: u32,
    },
    IterationStarted {
        session_id: Uuid,
        iteration: u32,
    },
    Classified {
        session_id: Uuid,
        iteration: u32,
        category: ErrorCategory,
        error_count: u32,
    },
    StrategySelected {
        session_id: Uuid,
        iteration: u32,
        strategy: FixStrategy,
    },
    FixApplied {
        session_id: Uuid,
        iteration: u32,
        strategy: FixStrategy,
        diff_size: usize,
    },
    Verified {
        session_id: Uuid,
        iteration: u32,
        passed: bool,
        error_count: u32,
    },
    Reverted {
        session_id: Uuid,
        iteration: u32,
        errors_before: u32,
        errors_after: u32,
    },
    Finished {
        session_id: Uuid,
        outcome: RepairOutcome,
        attempts: u32,
    },
}

impl RepairEvent {
    pub const fn session_id(&self) -> Uuid {
        match self {
            Self::SessionStarted { session_id, .. }
            | Self::IterationStarted { session_id, .. }
            | Self::Classified { session_id, .. }
            | Self::StrategySelected { session_id, .. }
            | Self::FixApplied { session_id, .. }
            | Self::Verified { session_id, .. }
            | Self::Reverted { session_id, .. }
            | Self::Finished { session_id, .. } => *session_id,
        }
    }
}
