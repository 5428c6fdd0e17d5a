//! Recipe-driven installer for terminal presets.
//!
//! A recipe is a YAML or JSON document describing stages of shell steps that
//! install a piece of terminal tooling, plus the commands that undo them.
//! The crate validates recipes, executes them forward (install) or in
//! reverse (rollback), and streams every line of subprocess output through a
//! pluggable printer as it is produced.
//!
//! # Example recipe
//!
//! ```yaml
//! os: linux
//! metadata:
//!   name: Fish shell
//!   description: Install fish with a sane prompt
//! stages:
//!   - metadata:
//!       name: Shell
//!     steps:
//!       - metadata:
//!           name: Install fish
//!         execute:
//!           run:
//!             - apt-get install -y fish
//!           root: true
//!         rollback:
//!           run:
//!             - apt-get remove -y fish
//!           root: true
//! ```
//!
//! # Execution semantics
//!
//! Installation walks stages and steps in authoring order and stops at the
//! first failing step. Rollback walks everything in reverse, never stops
//! early, and aggregates whatever failed along the way.

pub mod installer;
pub mod metadata;
pub mod printer;
pub mod recipe;
pub mod shell;

pub use installer::{Installer, InstallerError};
pub use printer::{ConsolePrinter, Operation, Printer};
pub use recipe::{LoadError, Recipe, Stage, Step, UnitMetadata, ValidationError};
pub use shell::{Command, ExecError, Shell, SystemShell};
