//! `metro switch` command - Change the current line.

use anyhow::Result;
use metro_core::{LineManager, WipKind};

use super::utils::open_workspace;
use crate::output;

/// Run the switch command.
pub fn run(name: &str) -> Result<()> {
    let ws = open_workspace()?;
    let outcome = LineManager::new(&ws.repo, &ws.settings).switch(name)?;

    if outcome.was_current() {
        output::info(&format!("Already on '{name}'"));
        return Ok(());
    }

    match outcome.saved {
        Some(WipKind::Work) => output::info(&format!("Parked changes on '{}'", outcome.from)),
        Some(WipKind::Merge) => output::info(&format!(
            "Parked unfinished absorb on '{}'",
            outcome.from
        )),
        None => {}
    }
    output::success(&format!("Switched to '{}'", outcome.to));
    match outcome.restored {
        Some(WipKind::Work) => output::info("Restored parked changes"),
        Some(WipKind::Merge) => {
            output::warn("Restored unfinished absorb - fix conflicts, then `metro resolve`");
        }
        None => {}
    }
    Ok(())
}
