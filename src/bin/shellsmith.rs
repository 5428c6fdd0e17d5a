//! shellsmith CLI - install and roll back terminal preset recipes.
//!
//! Usage:
//!   shellsmith install <name>            Install a recipe from the official repository
//!   shellsmith install -f recipe.yaml    Install a recipe from a local file
//!   shellsmith install -u <url>          Install a recipe from a URL
//!   shellsmith rollback <name>           Roll back a previously installed recipe

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use shellsmith::{recipe, ConsolePrinter, Installer, Printer, Recipe};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = shellsmith::metadata::APP_NAME)]
#[command(about = "Cross-platform installer for terminal presets")]
#[command(
    long_about = "Shellsmith is a cross-platform installer for terminal presets.\n\
                  Install a shell packed with useful plugins and a sleek prompt\n\
                  from one of the official recipes, or bring your own."
)]
#[command(version)]
#[command(after_help = shellsmith::metadata::APP_URL)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a recipe
    Install {
        #[command(flatten)]
        source: RecipeSource,
    },

    /// Roll back a previously installed recipe
    Rollback {
        #[command(flatten)]
        source: RecipeSource,
    },
}

/// Where to load the recipe from; exactly one source must be given.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct RecipeSource {
    /// Recipe name from the official repository
    recipe: Option<String>,

    /// Recipe URL
    #[arg(short, long)]
    url: Option<String>,

    /// Recipe file path
    #[arg(short, long)]
    filepath: Option<PathBuf>,
}

impl RecipeSource {
    fn load(&self) -> Result<Recipe> {
        let recipe = if let Some(name) = &self.recipe {
            recipe::from_repository(name)?
        } else if let Some(url) = &self.url {
            recipe::from_url(url)?
        } else if let Some(path) = &self.filepath {
            recipe::from_path(path)?
        } else {
            // clap's group(required) rules this out.
            anyhow::bail!("a recipe name, --url or --filepath is required");
        };

        Ok(recipe)
    }
}

fn run(command: &Commands, printer: Arc<dyn Printer>) -> Result<()> {
    match command {
        Commands::Install { source } => {
            let installer = Installer::new(source.load()?, printer)?;
            installer.install()?;
        }
        Commands::Rollback { source } => {
            let installer = Installer::new(source.load()?, printer)?;
            installer.rollback()?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let printer = Arc::new(ConsolePrinter::new());

    // An operation failure must surface as a non-zero exit code, not just
    // as printed text.
    match run(&cli.command, Arc::clone(&printer) as Arc<dyn Printer>) {
        Ok(()) => {
            printer.result(None);
            ExitCode::SUCCESS
        }
        Err(err) => {
            printer.result(Some(&err as &dyn std::fmt::Display));
            ExitCode::FAILURE
        }
    }
}
