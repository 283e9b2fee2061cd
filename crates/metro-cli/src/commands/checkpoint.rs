//! `metro checkpoint` command - Commit all changes on the current line.

use anyhow::Result;
use metro_core::CheckpointEngine;

use super::utils::open_workspace;
use crate::output;

/// Run the checkpoint command.
pub fn run(message: &str) -> Result<()> {
    let ws = open_workspace()?;
    let oid = CheckpointEngine::new(&ws.repo, &ws.settings).checkpoint(message)?;

    output::success(&format!(
        "Checkpoint {} {}",
        output::short_id(&oid.to_string()),
        first_line(message)
    ));
    Ok(())
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or_default().trim()
}
