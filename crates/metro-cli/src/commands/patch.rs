//! `metro patch` command - Fold current changes into the last checkpoint.

use anyhow::Result;
use metro_core::CheckpointEngine;

use super::utils::open_workspace;
use crate::output;

/// Run the patch command.
pub fn run(message: Option<&str>) -> Result<()> {
    let ws = open_workspace()?;
    let oid = CheckpointEngine::new(&ws.repo, &ws.settings).patch(message)?;

    output::success(&format!(
        "Patched last checkpoint, now {}",
        output::short_id(&oid.to_string())
    ));
    Ok(())
}
