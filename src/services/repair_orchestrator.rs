//! The repair control loop.
//!
//! One session drives a single test file through
//! run → classify → select → fix → verify → record, until the test passes or
//! one of the terminal conditions in [`RepairOutcome`] is reached. Iterations
//! are strictly sequential and the test file on disk is owned by the session
//! for its whole duration.
//!
//! The session keeps the lowest-error-count content it has seen as the best
//! attempt. A fix whose verification run reports more failures than the
//! diagnostic run before it is reverted to that best attempt.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    FixStrategy, ParsedError, RepairAttempt, RepairConfig, RepairContext, RepairEvent,
    RepairOutcome, RepairResult,
};
use crate::domain::ports::{ExternalFixer, TestExecutor};
use crate::services::error_classifier::ErrorClassifier;
use crate::services::external_fixer_client::ExternalFixerClient;
use crate::services::fix_strategy::FixStrategySelector;
use crate::services::quick_fix::QuickFixEngine;

/// Lowest-error-count content observed so far.
#[derive(Debug)]
struct BestAttempt {
    /// `None` until the first failing run is observed.
    error_count: Option<u32>,
    code: String,
}

impl BestAttempt {
    fn new(initial_code: String) -> Self {
        Self {
            error_count: None,
            code: initial_code,
        }
    }

    /// Record `code` as the best attempt if `error_count` is strictly lower
    /// than anything seen before.
    fn observe(&mut self, error_count: u32, code: &str) -> bool {
        if self.error_count.is_some_and(|best| error_count >= best) {
            return false;
        }
        self.error_count = Some(error_count);
        self.code = code.to_string();
        true
    }
}

/// A change proposed for the current iteration.
struct Proposal {
    strategy: FixStrategy,
    code: String,
}

/// Drives repair sessions for individual test files.
///
/// Holds no per-session state, so one orchestrator can run sessions for
/// different files concurrently.
#[derive(Clone)]
pub struct RepairOrchestrator {
    executor: Arc<dyn TestExecutor>,
    fixer: ExternalFixerClient,
    classifier: ErrorClassifier,
    selector: FixStrategySelector,
    quick_fix: QuickFixEngine,
    signature_prefix_chars: usize,
    events: Option<mpsc::UnboundedSender<RepairEvent>>,
}

impl RepairOrchestrator {
    pub fn new(
        executor: Arc<dyn TestExecutor>,
        fixer: Arc<dyn ExternalFixer>,
        config: &RepairConfig,
    ) -> Self {
        Self {
            executor,
            fixer: ExternalFixerClient::new(fixer, config.error_context_chars),
            classifier: ErrorClassifier::new(),
            selector: FixStrategySelector::new(),
            quick_fix: QuickFixEngine::new(),
            signature_prefix_chars: config.signature_prefix_chars,
            events: None,
        }
    }

    /// Send progress events to `tx` in addition to the tracing output.
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<RepairEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn fixer_id(&self) -> &str {
        self.fixer.fixer_id()
    }

    /// Run one repair session to completion.
    ///
    /// Every terminal state, including the unsuccessful ones, is returned as
    /// an `Ok` [`RepairResult`]. An `Err` means the session could not run:
    /// the context was invalid or the test file could not be read or written.
    pub async fn repair(&self, context: &RepairContext) -> DomainResult<RepairResult> {
        context.validate()?;
        self.run_session(context, Uuid::new_v4()).await
    }

    #[instrument(
        name = "repair_session",
        skip(self, context, session_id),
        fields(%session_id, test_file = %context.test_file_path.display())
    )]
    async fn run_session(
        &self,
        context: &RepairContext,
        session_id: Uuid,
    ) -> DomainResult<RepairResult> {
        let test_path = context.resolved_test_path();
        info!(
            max_iterations = context.max_iterations,
            fixer = self.fixer_id(),
            "Starting repair session"
        );
        self.emit(RepairEvent::SessionStarted {
            session_id,
            test_file: context.test_file_path.clone(),
            max_iterations: context.max_iterations,
        });

        let mut best = BestAttempt::new(read_test_file(&test_path).await?);
        let mut history: Vec<RepairAttempt> = Vec::new();
        let mut previous_signature: Option<String> = None;
        let mut last_error: Option<ParsedError> = None;

        for iteration in 0..context.max_iterations {
            self.emit(RepairEvent::IterationStarted {
                session_id,
                iteration,
            });

            // Diagnostic run.
            let current = read_test_file(&test_path).await?;
            let diagnostic = self
                .executor
                .run(&test_path, &context.workspace_root)
                .await;
            if diagnostic.success {
                info!(iteration, "Test passes on diagnostic run");
                return Ok(self.finish(
                    session_id,
                    context,
                    RepairOutcome::Passed,
                    None,
                    history,
                    current,
                ));
            }

            let error = self.classifier.classify(&diagnostic.output);
            debug!(
                iteration,
                category = %error.category,
                error_count = error.error_count,
                "Classified diagnostic failure"
            );
            self.emit(RepairEvent::Classified {
                session_id,
                iteration,
                category: error.category,
                error_count: error.error_count,
            });
            best.observe(error.error_count, &current);

            let signature = error.signature(self.signature_prefix_chars);
            if previous_signature.as_deref() == Some(signature.as_str()) {
                warn!(iteration, %signature, "Same failure as previous iteration");
                return Ok(self.finish(
                    session_id,
                    context,
                    RepairOutcome::Stuck,
                    Some(error),
                    history,
                    best.code,
                ));
            }
            previous_signature = Some(signature);

            let selected = self.selector.select(&error);
            self.emit(RepairEvent::StrategySelected {
                session_id,
                iteration,
                strategy: selected,
            });
            if selected == FixStrategy::Unfixable {
                warn!(iteration, error_message = %error.message, "Failure cannot be fixed by editing the test");
                return Ok(self.finish(
                    session_id,
                    context,
                    RepairOutcome::Unfixable,
                    Some(error),
                    history,
                    best.code,
                ));
            }

            let Some(proposal) = self
                .propose(context, selected, &current, &error, iteration)
                .await
            else {
                warn!(iteration, strategy = %selected, "No fix produced a change");
                return Ok(self.finish(
                    session_id,
                    context,
                    RepairOutcome::NoProgress,
                    Some(error),
                    history,
                    best.code,
                ));
            };

            let diff_size = current
                .chars()
                .count()
                .abs_diff(proposal.code.chars().count());
            write_test_file(&test_path, &proposal.code).await?;
            info!(iteration, strategy = %proposal.strategy, diff_size, "Applied fix");
            self.emit(RepairEvent::FixApplied {
                session_id,
                iteration,
                strategy: proposal.strategy,
                diff_size,
            });

            // Verification run.
            let verification = self
                .executor
                .run(&test_path, &context.workspace_root)
                .await;
            let attempt = |errors_after: u32, reverted: bool| RepairAttempt {
                iteration,
                category: error.category,
                selected_strategy: selected,
                strategy: proposal.strategy,
                errors_before: error.error_count,
                errors_after,
                diff_size,
                change_applied: true,
                reverted,
                recorded_at: Utc::now(),
            };

            if verification.success {
                self.emit(RepairEvent::Verified {
                    session_id,
                    iteration,
                    passed: true,
                    error_count: 0,
                });
                history.push(attempt(0, false));
                info!(iteration, "Test passes after fix");
                return Ok(self.finish(
                    session_id,
                    context,
                    RepairOutcome::Passed,
                    None,
                    history,
                    proposal.code,
                ));
            }

            let after = self.classifier.classify(&verification.output);
            self.emit(RepairEvent::Verified {
                session_id,
                iteration,
                passed: false,
                error_count: after.error_count,
            });

            let regressed = after.error_count > error.error_count;
            if regressed {
                warn!(
                    iteration,
                    errors_before = error.error_count,
                    errors_after = after.error_count,
                    "Fix made things worse, restoring best attempt"
                );
                write_test_file(&test_path, &best.code).await?;
                self.emit(RepairEvent::Reverted {
                    session_id,
                    iteration,
                    errors_before: error.error_count,
                    errors_after: after.error_count,
                });
            } else {
                best.observe(after.error_count, &proposal.code);
            }

            history.push(attempt(after.error_count, regressed));
            last_error = Some(after);
        }

        info!("Iteration budget exhausted");
        Ok(self.finish(
            session_id,
            context,
            RepairOutcome::Exhausted,
            last_error,
            history,
            best.code,
        ))
    }

    /// Produce replacement code for `error`.
    ///
    /// A selected quick fix that does not apply falls back to the external
    /// fixer in the same iteration. Returns `None` when nothing changes the
    /// code.
    async fn propose(
        &self,
        context: &RepairContext,
        selected: FixStrategy,
        current: &str,
        error: &ParsedError,
        iteration: u32,
    ) -> Option<Proposal> {
        if selected == FixStrategy::QuickFix {
            if let Some(code) = self.quick_fix.apply(current, error) {
                return Some(Proposal {
                    strategy: FixStrategy::QuickFix,
                    code,
                });
            }
            debug!(iteration, "Quick fix did not apply, asking external fixer");
        }

        self.fixer
            .fix(context, current, &error.raw_output, iteration + 1)
            .await
            .filter(|code| code != current)
            .map(|code| Proposal {
                strategy: FixStrategy::ExternalFix,
                code,
            })
    }

    fn finish(
        &self,
        session_id: Uuid,
        context: &RepairContext,
        outcome: RepairOutcome,
        final_error: Option<ParsedError>,
        history: Vec<RepairAttempt>,
        best_test_code: String,
    ) -> RepairResult {
        let attempts = u32::try_from(history.len()).unwrap_or(u32::MAX);
        info!(%outcome, attempts, "Repair session finished");
        self.emit(RepairEvent::Finished {
            session_id,
            outcome,
            attempts,
        });

        RepairResult {
            session_id,
            test_file: context.test_file_path.clone(),
            passed: outcome.is_success(),
            outcome,
            attempts,
            final_error,
            history,
            best_test_code,
        }
    }

    fn emit(&self, event: RepairEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

async fn read_test_file(path: &Path) -> DomainResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DomainError::test_file_io(PathBuf::from(path), &e))
}

async fn write_test_file(path: &Path, code: &str) -> DomainResult<()> {
    tokio::fs::write(path, code)
        .await
        .map_err(|e| DomainError::test_file_io(PathBuf::from(path), &e))
}
