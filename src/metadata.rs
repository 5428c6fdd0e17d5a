//! Application metadata and official recipe repository coordinates.

/// Application name used in user-facing output.
pub const APP_NAME: &str = "shellsmith";

/// Homepage of the application.
pub const APP_URL: &str = "https://github.com/shellsmith/shellsmith";

/// Coordinates of a GitHub repository holding recipes.
pub struct RepositoryDetails {
    pub owner: &'static str,
    pub name: &'static str,
    pub branch: &'static str,
    pub recipe_directory: &'static str,
}

impl RepositoryDetails {
    /// Raw-content URL of the recipe file for the given name and OS.
    pub fn recipe_url(&self, recipe_name: &str, os: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}/{}/{}/{}.yaml",
            self.owner, self.name, self.branch, self.recipe_directory, recipe_name, os
        )
    }

    /// Browsable URL of the recipe directory.
    pub fn list_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/tree/{}/{}",
            self.owner, self.name, self.branch, self.recipe_directory
        )
    }
}

/// The official recipes repository.
pub const REPOSITORY: RepositoryDetails = RepositoryDetails {
    owner: "shellsmith",
    name: "shellsmith",
    branch: "main",
    recipe_directory: "recipes",
};
