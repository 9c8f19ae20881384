//! Progress events and terminal rendering for backup and restore runs.
//!
//! Orchestrators emit [`BackupStep`]/[`RestoreStep`] events synchronously
//! before and after each component. [`ProgressReporter`] renders them with
//! indicatif; any other `FnMut` callback works as well.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rego_core::{ComponentKind, ComponentResult, RestoreResult};

/// Whether a step is about to run or has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Started,
    Finished,
}

/// Progress notification from the backup orchestrator
#[derive(Debug)]
pub struct BackupStep<'a> {
    pub phase: StepPhase,
    pub kind: &'a ComponentKind,
    pub name: &'a str,
    /// 1-based index of this step
    pub current: usize,
    pub total: usize,
    /// Results gathered so far, including this step once finished
    pub results: &'a [ComponentResult],
}

/// Progress notification from the restore orchestrator
#[derive(Debug)]
pub struct RestoreStep<'a> {
    pub phase: StepPhase,
    pub kind: &'a ComponentKind,
    pub name: &'a str,
    pub current: usize,
    pub total: usize,
    pub results: &'a [RestoreResult],
}

/// Renders orchestrator steps as a single progress bar
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Creates a reporter for `total` component steps.
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Reporter that draws nothing, for quiet runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn on_backup(&self, step: &BackupStep<'_>) {
        match step.phase {
            StepPhase::Started => self.bar.set_message(format!("Capturing {}...", step.name)),
            StepPhase::Finished => {
                if let Some(result) = step.results.last() {
                    let line = if result.succeeded {
                        format!("  ✓ {} ({} items)", step.name, result.item_count)
                    } else {
                        format!(
                            "  ✗ {}: {}",
                            step.name,
                            result.error_message.as_deref().unwrap_or("failed")
                        )
                    };
                    self.bar.println(line);
                }
                self.bar.inc(1);
            }
        }
    }

    pub fn on_restore(&self, step: &RestoreStep<'_>) {
        match step.phase {
            StepPhase::Started => self.bar.set_message(format!("Restoring {}...", step.name)),
            StepPhase::Finished => {
                if let Some(result) = step.results.last() {
                    let mark = if result.succeeded { "✓" } else { "✗" };
                    self.bar.println(format!(
                        "  {} {} ({}/{} applied, {} already present)",
                        mark,
                        step.name,
                        result.items_succeeded,
                        result.items_total,
                        result.items_skipped
                    ));
                }
                self.bar.inc(1);
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner for archive packing and unpacking.
pub(crate) fn archive_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
