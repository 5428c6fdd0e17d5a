//! Recipe data model, validation and acquisition.
//!
//! A recipe describes an ordered list of stages, each holding ordered steps.
//! Every step carries a forward (`execute`) and a reverse (`rollback`) shell
//! command batch. Recipes are plain data: they are deserialized from YAML or
//! JSON, validated once, then handed read-only to the [`Installer`].
//!
//! [`Installer`]: crate::installer::Installer

use crate::metadata;
use crate::shell::Command;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// OS value that matches any operating system.
pub const ANY_OS: &str = "any";

/// Descriptive metadata attached to a recipe, stage or step.
///
/// Purely informational; every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
}

/// Top-level description of an installable (and rollback-able) feature set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    pub os: String,
    pub metadata: UnitMetadata,
    pub stages: Vec<Stage>,
}

/// A named, ordered group of steps within a recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    pub metadata: UnitMetadata,
    pub steps: Vec<Step>,
}

/// A single unit of work with a forward and a reverse command batch.
///
/// `rollback` may be left empty, which makes rolling the step back a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    pub metadata: UnitMetadata,
    pub execute: Command,
    pub rollback: Command,
}

/// Structural or platform-compatibility problem that makes a recipe unrunnable.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid operating system: recipe requires {required}, actual {actual}")]
    OsMismatch { required: String, actual: String },

    #[error("no stages defined in recipe")]
    NoStages,

    #[error("while validating stage {position} ({name}): no steps defined")]
    EmptyStage { position: usize, name: String },

    #[error(
        "while validating stage {stage_position} ({stage_name}): \
         no commands defined in step {step_position} ({step_name})"
    )]
    EmptyStep {
        stage_position: usize,
        stage_name: String,
        step_position: usize,
        step_name: String,
    },
}

impl Recipe {
    /// Check platform compatibility and structural invariants.
    ///
    /// Checks run in order and stop at the first failure. Positions in error
    /// messages are 1-based. Validation has no side effects and is idempotent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_os()?;
        self.validate_stages()
    }

    fn validate_os(&self) -> Result<(), ValidationError> {
        let actual = std::env::consts::OS;
        if self.os != actual && self.os != ANY_OS {
            return Err(ValidationError::OsMismatch {
                required: self.os.clone(),
                actual: actual.to_owned(),
            });
        }

        Ok(())
    }

    fn validate_stages(&self) -> Result<(), ValidationError> {
        if self.stages.is_empty() {
            return Err(ValidationError::NoStages);
        }

        for (stage_no, stage) in self.stages.iter().enumerate() {
            if stage.steps.is_empty() {
                return Err(ValidationError::EmptyStage {
                    position: stage_no + 1,
                    name: stage.metadata.name.clone(),
                });
            }

            for (step_no, step) in stage.steps.iter().enumerate() {
                if step.execute.run.is_empty() {
                    return Err(ValidationError::EmptyStep {
                        stage_position: stage_no + 1,
                        stage_name: stage.metadata.name.clone(),
                        step_position: step_no + 1,
                        step_name: step.metadata.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Failure to acquire or deserialize a recipe.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid file extension `{extension}` for `{path}`: expected yaml, yml or json")]
    Extension { path: String, extension: String },

    #[error("while reading recipe from `{origin}`: {source}")]
    Read {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("while parsing recipe from `{origin}`: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("incorrect recipe URL `{url}`")]
    NotAUrl { url: String },

    #[error("while requesting recipe from `{url}`: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("invalid status code {status} while downloading recipe from `{url}`")]
    Status { url: String, status: u16 },

    #[error("empty body while downloading recipe from `{url}`")]
    EmptyBody { url: String },

    #[error(
        "cannot find recipe `{name}` in the official repository; \
         see {list_url} for the list of available recipes"
    )]
    NotInRepository { name: String, list_url: String },
}

/// Load a recipe from a local YAML or JSON file.
pub fn from_path(path: impl AsRef<Path>) -> Result<Recipe, LoadError> {
    let path = path.as_ref();
    validate_extension(path)?;

    let origin = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        origin: origin.clone(),
        source,
    })?;

    parse(&contents, &origin)
}

/// Download a recipe from an HTTP(S) URL.
pub fn from_url(url: &str) -> Result<Recipe, LoadError> {
    if !is_url(url) {
        return Err(LoadError::NotAUrl {
            url: url.to_owned(),
        });
    }

    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => {
            return Err(LoadError::Status {
                url: url.to_owned(),
                status,
            });
        }
        Err(err) => {
            return Err(LoadError::Request {
                url: url.to_owned(),
                source: Box::new(err),
            });
        }
    };

    let body = response.into_string().map_err(|source| LoadError::Read {
        origin: url.to_owned(),
        source,
    })?;

    if body.is_empty() {
        return Err(LoadError::EmptyBody {
            url: url.to_owned(),
        });
    }

    parse(&body, url)
}

/// Download a recipe by name from the official recipes repository.
///
/// The recipe file for the current operating system is looked up under
/// `<repository>/<name>/<os>.yaml`.
pub fn from_repository(name: &str) -> Result<Recipe, LoadError> {
    let repository = &metadata::REPOSITORY;
    let url = repository.recipe_url(name, std::env::consts::OS);

    match from_url(&url) {
        Err(LoadError::Status { status: 404, .. }) => Err(LoadError::NotInRepository {
            name: name.to_owned(),
            list_url: repository.list_url(),
        }),
        other => other,
    }
}

/// Check whether the given string looks like a supported URL.
pub fn is_url(path: &str) -> bool {
    ["http://", "https://", "ftp://"]
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

fn validate_extension(path: &Path) -> Result<(), LoadError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if extension != "yaml" && extension != "yml" && extension != "json" {
        return Err(LoadError::Extension {
            path: path.display().to_string(),
            extension,
        });
    }

    Ok(())
}

fn parse(contents: &str, origin: &str) -> Result<Recipe, LoadError> {
    // Recipes may be authored in JSON as well as YAML.
    if let Ok(recipe) = serde_json::from_str::<Recipe>(contents) {
        return Ok(recipe);
    }

    serde_yaml::from_str(contents).map_err(|source| LoadError::Parse {
        origin: origin.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_recipe(os: &str) -> Recipe {
        Recipe {
            os: os.to_owned(),
            metadata: UnitMetadata {
                name: "Recipe".to_owned(),
                ..Default::default()
            },
            stages: vec![Stage {
                metadata: UnitMetadata {
                    name: "Stage 1".to_owned(),
                    ..Default::default()
                },
                steps: vec![Step {
                    metadata: UnitMetadata {
                        name: "Step 1".to_owned(),
                        ..Default::default()
                    },
                    execute: Command {
                        run: vec!["echo 'install'".to_owned()],
                        ..Default::default()
                    },
                    rollback: Command::default(),
                }],
            }],
        }
    }

    #[test]
    fn validate_accepts_current_os() {
        let recipe = fix_recipe(std::env::consts::OS);
        assert!(recipe.validate().is_ok());
    }

    #[test]
    fn validate_accepts_any_os() {
        let recipe = fix_recipe(ANY_OS);
        assert!(recipe.validate().is_ok());
    }

    #[test]
    fn validate_rejects_foreign_os() {
        let recipe = fix_recipe("amigaos");
        let err = recipe.validate().expect_err("expected OS mismatch");
        assert!(err.to_string().contains("amigaos"));
        assert!(err.to_string().contains(std::env::consts::OS));
    }

    #[test]
    fn validate_rejects_empty_stage_list() {
        let mut recipe = fix_recipe(ANY_OS);
        recipe.stages.clear();

        let err = recipe.validate().expect_err("expected stage error");
        assert!(err.to_string().contains("stages"));
    }

    #[test]
    fn validate_rejects_stage_without_steps() {
        let mut recipe = fix_recipe(ANY_OS);
        recipe.stages[0].steps.clear();

        let err = recipe.validate().expect_err("expected step error");
        assert!(err.to_string().contains("steps"));
        assert!(err.to_string().contains("stage 1 (Stage 1)"));
    }

    #[test]
    fn validate_rejects_step_without_commands() {
        let mut recipe = fix_recipe(ANY_OS);
        recipe.stages[0].steps[0].execute.run.clear();

        let err = recipe.validate().expect_err("expected command error");
        assert!(err.to_string().contains("commands"));
        assert!(err.to_string().contains("step 1 (Step 1)"));
    }

    #[test]
    fn validate_is_idempotent() {
        let recipe = fix_recipe("amigaos");

        let first = recipe.validate().expect_err("expected OS mismatch");
        let second = recipe.validate().expect_err("expected OS mismatch");

        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn is_url_recognizes_supported_schemes() {
        assert!(is_url("http://example.com/recipe.yaml"));
        assert!(is_url("https://example.com/recipe.yaml"));
        assert!(is_url("ftp://example.com/recipe.yaml"));
        assert!(!is_url("./recipe.yaml"));
        assert!(!is_url("/home/user/recipe.yaml"));
        assert!(!is_url("file:///recipe.yaml"));
    }

    #[test]
    fn parse_reads_yaml() {
        let yaml = r#"
os: any
metadata:
  name: Test recipe
stages:
  - metadata:
      name: First
    steps:
      - metadata:
          name: Say hello
        execute:
          run:
            - echo 'hello'
"#;

        let recipe = parse(yaml, "inline").expect("yaml should parse");
        assert_eq!(recipe.os, "any");
        assert_eq!(recipe.metadata.name, "Test recipe");
        assert_eq!(recipe.stages.len(), 1);
        assert_eq!(recipe.stages[0].steps[0].execute.run[0], "echo 'hello'");
    }

    #[test]
    fn parse_reads_json() {
        let json = r#"{
  "os": "any",
  "metadata": { "name": "Test recipe" },
  "stages": [
    {
      "metadata": { "name": "First" },
      "steps": [
        {
          "metadata": { "name": "Say hello" },
          "execute": { "run": ["echo 'hello'"] }
        }
      ]
    }
  ]
}"#;

        let recipe = parse(json, "inline").expect("json should parse");
        assert_eq!(recipe.stages[0].metadata.name, "First");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("{ not a recipe [", "inline").is_err());
    }

    #[test]
    fn from_path_rejects_unknown_extension() {
        let err = from_path("recipe.txt").expect_err("expected extension error");
        assert!(err.to_string().contains("txt"));
    }

    #[test]
    fn rollback_defaults_to_empty_command() {
        let yaml = r#"
os: any
stages:
  - steps:
      - execute:
          run:
            - echo 'hello'
"#;

        let recipe = parse(yaml, "inline").expect("yaml should parse");
        assert!(recipe.stages[0].steps[0].rollback.run.is_empty());
    }
}
