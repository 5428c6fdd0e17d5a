//! Progress reporting for recipe execution.
//!
//! The installer reports through the [`Printer`] trait and never decides
//! anything based on it: calls are synchronous, fire-and-forget, and the
//! engine behaves identically whatever implementation is plugged in.
//! [`ConsolePrinter`] is the production implementation.

use crate::recipe::{Stage, UnitMetadata};
use owo_colors::OwoColorize;
use std::sync::Mutex;

/// Kind of operation currently reported on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Operation {
    #[default]
    Install,
    Rollback,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Install => "installation",
            Operation::Rollback => "rollback",
        }
    }
}

/// Output-side contract the installer reports through.
///
/// Stage and step indices are 0-based positions within the current traversal
/// order; during rollback they count along the reverse walk.
pub trait Printer: Send + Sync {
    /// Set the operation kind and total stage count for the coming run.
    fn set_context(&self, operation: Operation, stages: usize);
    /// Announce the recipe about to be processed.
    fn recipe(&self, metadata: &UnitMetadata);
    /// Announce a stage at the given traversal position.
    fn stage(&self, index: usize, stage: &Stage);
    /// Announce a step at the given traversal position within its stage.
    fn step(&self, index: usize, total: usize, metadata: &UnitMetadata);
    /// Echo the literal command line about to run.
    fn command(&self, line: &str);
    /// Stream one line of subprocess stdout.
    fn output(&self, line: &str);
    /// Stream one line of subprocess stderr.
    fn error(&self, line: &str);
}

#[derive(Default)]
struct Context {
    operation: Operation,
    stages: usize,
    indentation: String,
}

/// Colored console renderer for recipe progress.
pub struct ConsolePrinter {
    ctx: Mutex<Context>,
}

impl ConsolePrinter {
    pub fn new() -> Self {
        Self {
            ctx: Mutex::new(Context::default()),
        }
    }

    /// Print the final outcome banner.
    pub fn result(&self, error: Option<&dyn std::fmt::Display>) {
        match error {
            None => {
                let operation = self.lock().operation;
                println!(
                    "\n{}",
                    format!("The {} finished successfully.", operation.as_str())
                        .green()
                        .bold()
                );
            }
            Some(err) => {
                eprintln!(
                    "\n{} {}",
                    "Error:".red().bold(),
                    format!("{err}").red()
                );
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Context> {
        self.ctx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn description_and_url(metadata: &UnitMetadata, indentation: &str) {
        if !metadata.description.is_empty() {
            println!("{}{}", indentation, metadata.description);
        }

        if !metadata.url.is_empty() {
            println!("{}{}", indentation, metadata.url.underline());
        }
    }
}

impl Default for ConsolePrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Indentation that lines nested output up under a `[n/total] ` stage counter.
fn stage_indentation(stages: usize) -> String {
    let digits = stages.max(1).to_string().len();
    " ".repeat(digits * 2 + 4)
}

impl Printer for ConsolePrinter {
    fn set_context(&self, operation: Operation, stages: usize) {
        let mut ctx = self.lock();
        ctx.operation = operation;
        ctx.stages = stages;
        ctx.indentation = stage_indentation(stages);
    }

    fn recipe(&self, metadata: &UnitMetadata) {
        let operation = self.lock().operation;

        println!("Starting {}...\n", operation.as_str());
        println!("{}", metadata.name.blue().bold());
        Self::description_and_url(metadata, "");
    }

    fn stage(&self, index: usize, stage: &Stage) {
        let ctx = self.lock();

        println!(
            "\n{} {}",
            format!("[{}/{}]", index + 1, ctx.stages).blue().bold(),
            stage.metadata.name.blue().bold()
        );
        Self::description_and_url(&stage.metadata, &ctx.indentation);
    }

    fn step(&self, index: usize, total: usize, metadata: &UnitMetadata) {
        let ctx = self.lock();

        println!();

        // A single-step stage reads better without a counter.
        let counter = if total > 1 {
            format!("[{}/{}] ", index + 1, total)
        } else {
            String::new()
        };

        if !metadata.name.is_empty() {
            println!(
                "{}{}",
                ctx.indentation,
                format!("{}{}", counter, metadata.name).cyan().bold()
            );
        }

        Self::description_and_url(metadata, &ctx.indentation);
    }

    fn command(&self, line: &str) {
        let ctx = self.lock();
        println!(
            "{}{} {}",
            ctx.indentation,
            "Command:".dimmed().bold(),
            line.dimmed()
        );
    }

    fn output(&self, line: &str) {
        let ctx = self.lock();
        println!("{}{}", ctx.indentation, line.dimmed());
    }

    fn error(&self, line: &str) {
        let ctx = self.lock();
        eprintln!("{}{}", ctx.indentation, line.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_tracks_stage_counter_width() {
        // "[1/9] " is six characters wide.
        assert_eq!(stage_indentation(9).len(), 6);
        // "[01/24] " style counters take eight.
        assert_eq!(stage_indentation(24).len(), 8);
        assert_eq!(stage_indentation(100).len(), 10);
    }

    #[test]
    fn indentation_handles_zero_stages() {
        assert_eq!(stage_indentation(0).len(), 6);
    }

    #[test]
    fn operation_names() {
        assert_eq!(Operation::Install.as_str(), "installation");
        assert_eq!(Operation::Rollback.as_str(), "rollback");
    }
}
