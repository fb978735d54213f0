//! Concurrent repair of many test files.
//!
//! Each file gets its own sequential session; different files run side by
//! side up to a configured limit. A batch naming the same test file twice is
//! rejected before anything runs, since two sessions would both write to it.

use std::collections::HashSet;
use std::path::PathBuf;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{RepairContext, RepairOutcome, RepairResult};
use crate::services::repair_orchestrator::RepairOrchestrator;

/// Outcome counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub stuck: usize,
    pub unfixable: usize,
    pub no_progress: usize,
    pub exhausted: usize,
    /// Sessions that could not run at all.
    pub errored: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[DomainResult<RepairResult>]) -> Self {
        results.iter().fold(
            Self {
                total: results.len(),
                ..Self::default()
            },
            |mut summary, result| {
                match result.as_ref().map(|r| r.outcome) {
                    Ok(RepairOutcome::Passed) => summary.passed += 1,
                    Ok(RepairOutcome::Stuck) => summary.stuck += 1,
                    Ok(RepairOutcome::Unfixable) => summary.unfixable += 1,
                    Ok(RepairOutcome::NoProgress) => summary.no_progress += 1,
                    Ok(RepairOutcome::Exhausted) => summary.exhausted += 1,
                    Err(_) => summary.errored += 1,
                }
                summary
            },
        )
    }

    pub const fn failed(&self) -> usize {
        self.total - self.passed
    }
}

/// Runs one [`RepairOrchestrator`] session per file with bounded concurrency.
#[derive(Clone)]
pub struct BatchRepairService {
    orchestrator: RepairOrchestrator,
    max_concurrent_files: usize,
}

impl BatchRepairService {
    pub fn new(orchestrator: RepairOrchestrator, max_concurrent_files: usize) -> Self {
        Self {
            orchestrator,
            max_concurrent_files: max_concurrent_files.max(1),
        }
    }

    /// Repair every context, returning one result per context in input order.
    ///
    /// Fails up front with [`DomainError::DuplicateTestFile`] when two
    /// contexts resolve to the same test file.
    pub async fn repair_all(
        &self,
        contexts: Vec<RepairContext>,
    ) -> DomainResult<Vec<DomainResult<RepairResult>>> {
        ensure_distinct_test_files(&contexts)?;
        info!(
            files = contexts.len(),
            max_concurrent = self.max_concurrent_files,
            "Starting batch repair"
        );

        let mut indexed: Vec<(usize, DomainResult<RepairResult>)> = stream::iter(
            contexts.into_iter().enumerate(),
        )
        .map(|(index, context)| {
            let orchestrator = self.orchestrator.clone();
            async move {
                let result = orchestrator.repair(&context).await;
                if let Err(err) = &result {
                    warn!(test_file = %context.test_file_path.display(), error = %err, "Repair session failed to run");
                }
                (index, result)
            }
        })
        .buffer_unordered(self.max_concurrent_files)
        .collect()
        .await;

        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<_> = indexed.into_iter().map(|(_, result)| result).collect();

        let summary = BatchSummary::from_results(&results);
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed(),
            "Batch repair finished"
        );
        Ok(results)
    }
}

fn ensure_distinct_test_files(contexts: &[RepairContext]) -> DomainResult<()> {
    let mut seen: HashSet<PathBuf> = HashSet::with_capacity(contexts.len());
    for context in contexts {
        let path = context.resolved_test_path();
        if !seen.insert(path.clone()) {
            return Err(DomainError::DuplicateTestFile(path));
        }
    }
    Ok(())
}
