//! `metro status` command - Show the current line and pending work.

use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use metro_core::RepoStatus;

use super::utils::open_workspace;
use crate::output;

/// Run the status command.
pub fn run(json: bool) -> Result<()> {
    let ws = open_workspace()?;
    let status = RepoStatus::collect(&ws.repo, &ws.settings)?;

    if json {
        output::essential(&serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    output::essential(&format!("On line {}", status.line.cyan().bold()));
    output::detail(&format!(
        "  {} {} ({})",
        output::short_id(&status.head).dimmed(),
        status.summary,
        status
            .committed_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    ));

    if let Some(merge) = &status.merge {
        output::hr();
        output::warn(&format!(
            "Absorb in progress: {}",
            merge.message.lines().next().unwrap_or_default()
        ));
        if merge.conflicts.is_empty() {
            output::info("No conflicts left - run `metro resolve`");
        } else {
            for path in &merge.conflicts {
                output::detail(&format!("  {} {path}", "conflict:".red()));
            }
        }
    }

    output::hr();
    if status.changes.is_empty() {
        output::detail("No uncommitted changes");
    } else {
        for path in &status.changes {
            output::detail(&format!("  {} {path}", "changed:".yellow()));
        }
    }

    let parked: Vec<_> = status.lines.iter().filter(|l| l.has_wip).collect();
    if !parked.is_empty() {
        output::hr();
        for line in parked {
            output::detail(&format!("  {} {}", line.name, output::wip_tag()));
        }
    }
    Ok(())
}
