//! `metro resolve` command - Finish an absorb.

use anyhow::Result;
use metro_core::MergeWorkflow;

use super::utils::open_workspace;
use crate::output;

/// Run the resolve command.
pub fn run() -> Result<()> {
    let ws = open_workspace()?;
    let commit = MergeWorkflow::new(&ws.repo, &ws.settings).resolve()?;

    output::success(&format!(
        "Resolved absorb as {}",
        output::short_id(&commit.to_string())
    ));
    Ok(())
}
