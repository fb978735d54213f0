//! End-to-end repair sessions driven through the public API with scripted
//! test runs and fixer proposals.

mod common;

use std::sync::Arc;

use common::{assertion_failure, ScriptedExecutor, ScriptedFixer, Workspace};
use test_healer::{
    BatchRepairService, BatchSummary, ErrorCategory, FixStrategy, RepairConfig, RepairEvent,
    RepairOrchestrator, RepairOutcome, TestRunOutcome,
};
use tokio::sync::mpsc;

fn orchestrator(executor: Arc<ScriptedExecutor>, fixer: Arc<ScriptedFixer>) -> RepairOrchestrator {
    RepairOrchestrator::new(executor, fixer, &RepairConfig::default())
}

fn drain(rx: &mut mpsc::UnboundedReceiver<RepairEvent>) -> Vec<RepairEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn relative_import_is_deepened_and_passes() {
    common::setup_test_logging();
    let ws = Workspace::with_test("import { sum } from './sum';\n\ntest('adds', () => {});\n");
    let executor = ScriptedExecutor::new(vec![
        TestRunOutcome::failed(
            "FAIL src/__tests__/sum.test.ts\n  ● Test suite failed to run\n\n    Cannot find module './sum' from 'src/__tests__/sum.test.ts'\n",
        ),
        TestRunOutcome::passed("PASS src/__tests__/sum.test.ts"),
    ]);
    let fixer = ScriptedFixer::new(vec![]);

    let result = orchestrator(executor.clone(), fixer.clone())
        .repair(&ws.context(5))
        .await
        .unwrap();

    assert!(result.passed);
    assert_eq!(result.outcome, RepairOutcome::Passed);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.history[0].category, ErrorCategory::ImportError);
    assert_eq!(result.history[0].strategy, FixStrategy::QuickFix);
    assert!(ws.read_test().starts_with("import { sum } from '../sum';"));
    assert!(fixer.requests().is_empty());
}

#[tokio::test]
async fn missing_package_is_unfixable_at_first_iteration() {
    let original = "import leftPad from 'left-pad';\n";
    let ws = Workspace::with_test(original);
    let executor = ScriptedExecutor::new(vec![TestRunOutcome::failed(
        "Cannot find module 'left-pad' from 'sum.test.ts'",
    )]);
    let fixer = ScriptedFixer::new(vec![Some("never used")]);

    let result = orchestrator(executor.clone(), fixer.clone())
        .repair(&ws.context(5))
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.outcome, RepairOutcome::Unfixable);
    assert!(result.history.is_empty());
    assert_eq!(
        result.final_error.map(|e| e.category),
        Some(ErrorCategory::ImportError)
    );
    assert_eq!(executor.runs(), 1);
    assert!(fixer.requests().is_empty());
    assert_eq!(ws.read_test(), original);
}

#[tokio::test]
async fn stray_factory_annotations_are_stripped() {
    let original = "jest.mock('./x', () => ({ fn: (a: string, b: number) => {} }))";
    let ws = Workspace::with_test(original);
    let executor = ScriptedExecutor::new(vec![
        TestRunOutcome::failed("SyntaxError: sum.test.js: Unexpected token (1:34)"),
        TestRunOutcome::passed("PASS"),
    ]);

    let result = orchestrator(executor.clone(), ScriptedFixer::new(vec![]))
        .repair(&ws.context(5))
        .await
        .unwrap();

    let fixed = "jest.mock('./x', () => ({ fn: (a, b) => {} }))";
    assert!(result.passed);
    assert_eq!(result.attempts, 1);
    assert_eq!(ws.read_test(), fixed);
    assert_eq!(executor.seen(), vec![original.to_string(), fixed.to_string()]);
}

#[tokio::test]
async fn identical_signatures_stop_the_loop() {
    let ws = Workspace::with_test("expect(sum(1, 1)).toBe(3);");
    let executor = ScriptedExecutor::new(vec![
        assertion_failure(3, 1),
        assertion_failure(3, 1),
        assertion_failure(3, 1),
    ]);
    let fixer = ScriptedFixer::new(vec![Some("expect(sum(1, 2)).toBe(3);")]);

    let result = orchestrator(executor.clone(), fixer.clone())
        .repair(&ws.context(5))
        .await
        .unwrap();

    assert_eq!(result.outcome, RepairOutcome::Stuck);
    assert_eq!(result.history.len(), 1);
    assert_eq!(result.attempts, 1);
    assert_eq!(executor.runs(), 3);
    assert_eq!(fixer.requests().len(), 1);
}

#[tokio::test]
async fn regression_is_reverted_before_next_iteration() {
    let original = "expect(sum(1, 1)).toBe(3);";
    let ws = Workspace::with_test(original);
    let executor = ScriptedExecutor::new(vec![
        assertion_failure(3, 1),
        assertion_failure(4, 3),
        assertion_failure(5, 1),
        TestRunOutcome::passed("PASS"),
    ]);
    let fixer = ScriptedFixer::new(vec![
        Some("expect(sum(1, 1)).toBe(4);"),
        Some("expect(sum(1, 1)).toBe(2);"),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let result = orchestrator(executor.clone(), fixer)
        .with_events(tx)
        .repair(&ws.context(5))
        .await
        .unwrap();

    assert!(result.passed);
    assert_eq!(result.history.len(), 2);
    assert!(result.history[0].reverted);
    assert_eq!(result.history[0].errors_before, 1);
    assert_eq!(result.history[0].errors_after, 3);
    assert!(!result.history[1].reverted);

    // The diagnostic run of the second iteration saw the restored content.
    assert_eq!(executor.seen()[2], original);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        RepairEvent::Reverted {
            iteration: 0,
            errors_before: 1,
            errors_after: 3,
            ..
        }
    )));
    assert!(matches!(
        events.last(),
        Some(RepairEvent::Finished {
            outcome: RepairOutcome::Passed,
            attempts: 2,
            ..
        })
    ));
    assert!(events
        .iter()
        .all(|e| e.session_id() == result.session_id));
}

#[tokio::test]
async fn fixer_receives_context_for_each_attempt() {
    let ws = Workspace::with_test("expect(sum(1, 1)).toBe(3);");
    let executor = ScriptedExecutor::new(vec![
        assertion_failure(3, 2),
        assertion_failure(4, 1),
        assertion_failure(5, 1),
        TestRunOutcome::passed("PASS"),
    ]);
    let fixer = ScriptedFixer::new(vec![
        Some("expect(sum(1, 1)).toBe(4);"),
        Some("expect(sum(1, 1)).toBe(2);"),
    ]);
    let context = ws
        .context(5)
        .with_dependency_context("src/math.ts exports add()");

    let result = orchestrator(executor, fixer.clone())
        .repair(&context)
        .await
        .unwrap();

    assert!(result.passed);
    let requests = fixer.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].attempt_number, 1);
    assert_eq!(requests[1].attempt_number, 2);
    assert_eq!(requests[0].file_name, "src/sum.ts");
    assert_eq!(requests[1].current_test_code, "expect(sum(1, 1)).toBe(4);");
    assert_eq!(
        requests[0].dependency_context.as_deref(),
        Some("src/math.ts exports add()")
    );
    assert!(requests[0].error_context.contains("Expected: 3"));
}

#[tokio::test]
async fn exhausted_session_reports_best_attempt() {
    let ws = Workspace::with_test("v1");
    let executor = ScriptedExecutor::new(vec![
        assertion_failure(1, 4),
        assertion_failure(2, 2),
        assertion_failure(3, 2),
        assertion_failure(4, 2),
    ]);
    let fixer = ScriptedFixer::new(vec![Some("v2"), Some("v3")]);

    let result = orchestrator(executor.clone(), fixer)
        .repair(&ws.context(2))
        .await
        .unwrap();

    assert_eq!(result.outcome, RepairOutcome::Exhausted);
    assert!(!result.passed);
    assert_eq!(result.attempts, 2);
    assert_eq!(result.best_test_code, "v2");
    assert!(result.final_error.is_some());
    assert_eq!(executor.runs(), 4);
}

#[tokio::test]
async fn batch_repairs_files_independently() {
    let first = Workspace::with_test("import x from 'lodash';");
    let second = Workspace::with_test("import y from 'lodash';");

    // Both sessions share one script; each consumes a single diagnostic run.
    let executor = ScriptedExecutor::new(vec![
        TestRunOutcome::failed("Cannot find module 'lodash'"),
        TestRunOutcome::failed("Cannot find module 'lodash'"),
    ]);
    let service = BatchRepairService::new(
        orchestrator(executor.clone(), ScriptedFixer::new(vec![])),
        1,
    );

    let results = service
        .repair_all(vec![first.context(3), second.context(3)])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .all(|r| matches!(r, Ok(result) if result.outcome == RepairOutcome::Unfixable)));
    let summary = BatchSummary::from_results(&results);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.unfixable, 2);
    assert_eq!(summary.failed(), 2);
    assert_eq!(executor.runs(), 2);
}
