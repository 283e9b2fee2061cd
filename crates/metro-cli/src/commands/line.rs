//! `metro line` command - Create a new line.

use anyhow::Result;
use metro_core::LineManager;

use super::utils::open_workspace;
use crate::output;

/// Run the line command.
pub fn run(name: &str) -> Result<()> {
    let ws = open_workspace()?;
    let line = LineManager::new(&ws.repo, &ws.settings).create(name)?;

    output::success(&format!(
        "Created line '{}' at {}",
        line.name,
        output::short_id(&line.head.to_string())
    ));
    output::info(&format!("Run `metro switch {}` to work on it", line.name));
    Ok(())
}
