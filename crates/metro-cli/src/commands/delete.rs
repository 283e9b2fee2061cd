//! `metro delete` command - Remove checkpoints or lines.

use anyhow::Result;
use metro_core::{CheckpointEngine, LineManager};

use super::utils::open_workspace;
use crate::output;

/// Run `metro delete commit`.
pub fn run_commits(count: usize) -> Result<()> {
    let ws = open_workspace()?;
    let head = CheckpointEngine::new(&ws.repo, &ws.settings).delete_commits(count)?;

    let noun = if count == 1 { "checkpoint" } else { "checkpoints" };
    output::success(&format!(
        "Deleted {count} {noun}, line now at {}",
        output::short_id(&head.to_string())
    ));
    output::info("Their changes are still in the working tree");
    Ok(())
}

/// Run `metro delete line`.
pub fn run_line(name: &str) -> Result<()> {
    let ws = open_workspace()?;
    let outcome = LineManager::new(&ws.repo, &ws.settings).delete(name)?;

    output::success(&format!("Deleted line '{}'", outcome.name));
    if outcome.removed_wip {
        output::warn("Discarded changes that were parked on it");
    }
    Ok(())
}
