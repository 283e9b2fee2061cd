use anyhow::{Context, Result};
use metro_core::{Config, Settings};
use metro_git::Repository;

/// An opened repository with its resolved settings.
pub struct Workspace {
    pub repo: Repository,
    pub settings: Settings,
}

/// Helper to open the repository and its configuration.
pub fn open_workspace() -> Result<Workspace> {
    let repo = Repository::open_current().context("Not inside a metro repository")?;
    let config = Config::load(Config::path_in(repo.git_dir()))?;

    let repo = match config.user.identity() {
        Some((name, email)) => repo.with_identity(name, email),
        None => repo,
    };
    let settings = Settings::resolve(&config, repo.workdir())?;
    tracing::debug!(git_dir = %repo.git_dir().display(), "opened workspace");

    Ok(Workspace { repo, settings })
}
