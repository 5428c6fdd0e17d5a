//! Recipe execution engine.
//!
//! [`Installer`] walks a validated recipe's stage/step tree: forward for
//! installation, reverse for rollback. Installation stops at the first
//! failing step because later steps typically build on earlier ones.
//! Rollback is best-effort cleanup: every step is always attempted and
//! failures are aggregated after the full reverse sweep.

use crate::printer::{Operation, Printer};
use crate::recipe::{Recipe, ValidationError};
use crate::shell::{ExecError, PrintFn, Shell, SystemShell};
use std::sync::Arc;
use thiserror::Error;

/// Terminal failure of one install or rollback run.
#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("invalid recipe: {0}")]
    Validation(#[from] ValidationError),

    #[error("while executing step '{step}' of stage '{stage}': {source}")]
    StepFailed {
        stage: String,
        step: String,
        #[source]
        source: ExecError,
    },

    #[error("error(s) occurred during rollback:\n{}", failures.join(",\n"))]
    RollbackIncomplete { failures: Vec<String> },
}

/// Executes recipes against the local machine.
pub struct Installer {
    recipe: Recipe,
    shell: Box<dyn Shell>,
    printer: Arc<dyn Printer>,
}

impl Installer {
    /// Validate the recipe and build an installer wired to the given printer.
    ///
    /// The recipe is rejected here if it is incompatible with the current
    /// platform or structurally incomplete; no command ever runs for an
    /// invalid recipe.
    pub fn new(recipe: Recipe, printer: Arc<dyn Printer>) -> Result<Self, InstallerError> {
        recipe.validate()?;

        let shell = Box::new(SystemShell::new(
            print_fn(&printer, |p, line| p.command(line)),
            print_fn(&printer, |p, line| p.output(line)),
            print_fn(&printer, |p, line| p.error(line)),
        ));

        Ok(Self {
            recipe,
            shell,
            printer,
        })
    }

    /// Replace the shell backend. Intended for tests.
    pub fn set_shell(&mut self, shell: Box<dyn Shell>) {
        self.shell = shell;
    }

    /// Install the recipe by executing all steps of all stages in order.
    ///
    /// The first failing step aborts the run; no later step is attempted.
    pub fn install(&self) -> Result<(), InstallerError> {
        let stages = &self.recipe.stages;

        self.printer.set_context(Operation::Install, stages.len());
        self.printer.recipe(&self.recipe.metadata);

        for (stage_index, stage) in stages.iter().enumerate() {
            self.printer.stage(stage_index, stage);

            let steps_len = stage.steps.len();
            for (step_index, step) in stage.steps.iter().enumerate() {
                self.printer.step(step_index, steps_len, &step.metadata);

                self.shell
                    .exec(&step.execute, true)
                    .map_err(|source| InstallerError::StepFailed {
                        stage: stage.metadata.name.clone(),
                        step: step.metadata.name.clone(),
                        source,
                    })?;
            }
        }

        Ok(())
    }

    /// Revert the recipe by executing all rollback steps in reverse order.
    ///
    /// The last authored step is the first one rolled back. A failing step
    /// never stops the sweep; after visiting everything, any recorded
    /// failures are returned as one aggregate error. Progress indices
    /// reported to the printer count along the reverse traversal.
    pub fn rollback(&self) -> Result<(), InstallerError> {
        let stages = &self.recipe.stages;

        self.printer.set_context(Operation::Rollback, stages.len());
        self.printer.recipe(&self.recipe.metadata);

        let mut failures: Vec<String> = Vec::new();

        for (stage_index, stage) in stages.iter().rev().enumerate() {
            self.printer.stage(stage_index, stage);

            let steps_len = stage.steps.len();
            for (step_index, step) in stage.steps.iter().rev().enumerate() {
                self.printer.step(step_index, steps_len, &step.metadata);

                if let Err(err) = self.shell.exec(&step.rollback, false) {
                    failures.push(format!(
                        "step '{}' of stage '{}': {}",
                        step.metadata.name, stage.metadata.name, err
                    ));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(InstallerError::RollbackIncomplete { failures })
        }
    }
}

fn print_fn(
    printer: &Arc<dyn Printer>,
    forward: impl Fn(&dyn Printer, &str) + Send + Sync + 'static,
) -> PrintFn {
    let printer = Arc::clone(printer);
    Arc::new(move |line: &str| forward(printer.as_ref(), line))
}
