//! Live progress lines for repair sessions.

use console::style;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::RepairEvent;

/// Render one event as a progress line, or `None` for events not shown.
pub fn format_event(event: &RepairEvent) -> Option<String> {
    let line = match event {
        RepairEvent::SessionStarted {
            test_file,
            max_iterations,
            ..
        } => format!(
            "{} {} (up to {max_iterations} iterations)",
            style("repairing").cyan().bold(),
            test_file.display()
        ),
        RepairEvent::Classified {
            iteration,
            category,
            error_count,
            ..
        } => format!(
            "  [{}] {} {category} ({error_count} failing)",
            iteration + 1,
            style("failed").red()
        ),
        RepairEvent::FixApplied {
            iteration,
            strategy,
            diff_size,
            ..
        } => format!(
            "  [{}] applied {strategy} (diff {diff_size} chars)",
            iteration + 1
        ),
        RepairEvent::Verified {
            iteration,
            passed: true,
            ..
        } => format!("  [{}] {}", iteration + 1, style("verified").green()),
        RepairEvent::Reverted {
            iteration,
            errors_before,
            errors_after,
            ..
        } => format!(
            "  [{}] {} {errors_before} -> {errors_after} failing, restored best attempt",
            iteration + 1,
            style("regressed").yellow()
        ),
        RepairEvent::Finished {
            outcome, attempts, ..
        } => format!("{} {outcome} after {attempts} attempt(s)", style("done").bold()),
        RepairEvent::IterationStarted { .. }
        | RepairEvent::StrategySelected { .. }
        | RepairEvent::Verified { .. } => return None,
    };
    Some(line)
}

/// Print events to stderr until the sending side is dropped.
pub fn spawn_progress_printer(mut rx: mpsc::UnboundedReceiver<RepairEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(line) = format_event(&event) {
                eprintln!("{line}");
            }
        }
    })
}
