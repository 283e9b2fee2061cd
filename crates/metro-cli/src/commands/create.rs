//! `metro create` command - Start a repository in a directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use metro_core::{CheckpointEngine, Config, LineName, Settings, WipSuffix};
use metro_git::Repository;

use crate::output;

/// Message of the first checkpoint.
const INITIAL_MESSAGE: &str = "Create repository";

/// Run the create command.
pub fn run(directory: Option<PathBuf>, line: &str) -> Result<()> {
    let line = LineName::for_user(line, &WipSuffix::default())?;
    let directory = directory.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&directory)
        .with_context(|| format!("Cannot create {}", directory.display()))?;

    if directory.join(".git").exists() {
        bail!("{} is already a repository", directory.display());
    }

    let repo = Repository::init(&directory, &line)?;
    let config = Config::default();
    config.save(Config::path_in(repo.git_dir()))?;
    let settings = Settings::resolve(&config, repo.workdir())?;

    let commit = CheckpointEngine::new(&repo, &settings).initial(INITIAL_MESSAGE)?;
    let root = repo.workdir().unwrap_or(directory.as_path()).display().to_string();

    output::success(&format!("Created repository in {root} on line '{line}'"));
    output::detail(&format!(
        "  {} {INITIAL_MESSAGE}",
        output::short_id(&commit.to_string())
    ));
    Ok(())
}
