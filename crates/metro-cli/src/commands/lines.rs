//! `metro lines` command - List lines.

use anyhow::Result;
use metro_core::LineManager;

use super::utils::open_workspace;
use crate::output;

/// Run the lines command.
pub fn run() -> Result<()> {
    let ws = open_workspace()?;
    let lines = LineManager::new(&ws.repo, &ws.settings).list()?;

    for line in &lines {
        let mut row = format!(
            "{}  {}",
            output::line_name(&line.name, line.is_current),
            output::short_id(&line.head)
        );
        if line.has_wip {
            row.push(' ');
            row.push_str(&output::wip_tag());
        }
        output::essential(&row);
    }
    Ok(())
}
